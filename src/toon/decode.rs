//! Toon text → JSON value.

use serde_json::{Map, Number, Value};

use super::{DELIMITER, INDENT, MAX_DEPTH, ToonError, syntax};

/// Parse Toon text. Blank input decodes to an empty object.
pub fn decode(input: &str) -> Result<Value, ToonError> {
    let lines = scan(input)?;
    let Some(first) = lines.first().copied() else {
        return Ok(Value::Object(Map::new()));
    };

    let mut parser = Parser { lines, pos: 0 };
    let value = parser.root(first)?;
    if let Some(line) = parser.peek() {
        return Err(syntax(line.number, "unexpected content after document"));
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    depth: usize,
    text: &'a str,
    number: usize,
}

/// `[N]` or `[N]{f1,f2}` after a key.
#[derive(Debug)]
struct Header {
    len: usize,
    fields: Option<Vec<String>>,
}

/// A `key: rest` or `key[N]...: rest` line split into parts.
#[derive(Debug)]
struct KeyLine<'a> {
    key: String,
    header: Option<Header>,
    rest: &'a str,
}

fn scan(input: &str) -> Result<Vec<Line<'_>>, ToonError> {
    let mut lines = Vec::new();
    for (idx, raw) in input.lines().enumerate() {
        let number = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let text = raw.trim_start_matches(' ');
        if text.starts_with('\t') {
            return Err(syntax(number, "tabs are not allowed in indentation"));
        }
        let spaces = raw.len() - text.len();
        if spaces % INDENT != 0 {
            return Err(syntax(
                number,
                format!("indentation of {spaces} spaces is not a multiple of {INDENT}"),
            ));
        }
        let depth = spaces / INDENT;
        // Parser recursion follows indentation, so this bounds the stack.
        if depth > MAX_DEPTH {
            return Err(syntax(number, format!("nesting too deep (limit {MAX_DEPTH})")));
        }
        lines.push(Line { depth, text: text.trim_end(), number });
    }
    Ok(lines)
}

struct Parser<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    fn root(&mut self, first: Line<'a>) -> Result<Value, ToonError> {
        if first.depth != 0 {
            return Err(syntax(first.number, "unexpected indentation"));
        }
        if first.text.starts_with('[') {
            self.pos += 1;
            let (header, rest) = parse_header(first.text, first.number)?;
            return self.array_body(header, rest, 1, first.number);
        }
        if self.lines.len() == 1 && split_key(first.text, first.number)?.is_none() {
            self.pos += 1;
            return parse_primitive(first.text, first.number);
        }
        let mut map = Map::new();
        self.fields_into(0, &mut map)?;
        Ok(Value::Object(map))
    }

    /// Consume every `key: ...` line at exactly `depth`.
    fn fields_into(&mut self, depth: usize, map: &mut Map<String, Value>) -> Result<(), ToonError> {
        while let Some(line) = self.peek() {
            if line.depth < depth {
                break;
            }
            if line.depth > depth {
                return Err(syntax(line.number, "unexpected indentation"));
            }
            self.pos += 1;
            let key_line = split_key(line.text, line.number)?
                .ok_or_else(|| syntax(line.number, "expected 'key: value'"))?;
            let key = key_line.key.clone();
            let value = self.field_value(key_line, depth + 1, line.number)?;
            map.insert(key, value);
        }
        Ok(())
    }

    fn field_value(&mut self, key_line: KeyLine<'a>, child_depth: usize, number: usize) -> Result<Value, ToonError> {
        match key_line.header {
            Some(header) => self.array_body(header, key_line.rest, child_depth, number),
            None if key_line.rest.is_empty() => {
                let mut map = Map::new();
                self.fields_into(child_depth, &mut map)?;
                Ok(Value::Object(map))
            }
            None => parse_primitive(key_line.rest, number),
        }
    }

    fn array_body(&mut self, header: Header, rest: &str, child_depth: usize, number: usize) -> Result<Value, ToonError> {
        if !rest.is_empty() {
            if header.fields.is_some() {
                return Err(syntax(number, "tabular header cannot carry inline values"));
            }
            let values = split_delimited(rest)
                .into_iter()
                .map(|token| parse_primitive(token, number))
                .collect::<Result<Vec<_>, _>>()?;
            check_len(number, header.len, values.len())?;
            return Ok(Value::Array(values));
        }

        let mut items = Vec::new();
        match header.fields {
            Some(fields) => {
                while let Some(line) = self.peek().filter(|l| l.depth == child_depth) {
                    self.pos += 1;
                    let cells = split_delimited(line.text);
                    if cells.len() != fields.len() {
                        return Err(syntax(
                            line.number,
                            format!("row has {} values, header declares {} fields", cells.len(), fields.len()),
                        ));
                    }
                    let mut row = Map::new();
                    for (field, cell) in fields.iter().zip(cells) {
                        row.insert(field.clone(), parse_primitive(cell, line.number)?);
                    }
                    items.push(Value::Object(row));
                }
            }
            None => {
                while let Some(line) = self
                    .peek()
                    .filter(|l| l.depth == child_depth && l.text.starts_with('-'))
                {
                    self.pos += 1;
                    items.push(self.list_item(line)?);
                }
            }
        }
        check_len(number, header.len, items.len())?;
        Ok(Value::Array(items))
    }

    fn list_item(&mut self, line: Line<'a>) -> Result<Value, ToonError> {
        if line.text == "-" {
            return Ok(Value::Object(Map::new()));
        }
        let body = line
            .text
            .strip_prefix("- ")
            .ok_or_else(|| syntax(line.number, "list items must start with '- '"))?;

        if body.starts_with('[') {
            let (header, rest) = parse_header(body, line.number)?;
            return self.array_body(header, rest, line.depth + 1, line.number);
        }

        match split_key(body, line.number)? {
            Some(key_line) => {
                let mut map = Map::new();
                let key = key_line.key.clone();
                let value = self.field_value(key_line, line.depth + 2, line.number)?;
                map.insert(key, value);
                self.fields_into(line.depth + 1, &mut map)?;
                Ok(Value::Object(map))
            }
            None => parse_primitive(body, line.number),
        }
    }
}

fn check_len(line: usize, expected: usize, found: usize) -> Result<(), ToonError> {
    if expected == found {
        Ok(())
    } else {
        Err(ToonError::LengthMismatch { line, expected, found })
    }
}

/// Split `key: rest` / `key[N]{..}: rest`. `None` when the text is a plain
/// value rather than a keyed entry.
fn split_key(text: &str, number: usize) -> Result<Option<KeyLine<'_>>, ToonError> {
    let (key, after, quoted) = if text.starts_with('"') {
        let (key, consumed) = parse_quoted(text, number)?;
        (key, &text[consumed..], true)
    } else {
        match text.find([':', '[']) {
            Some(0) => return Err(syntax(number, "missing key")),
            Some(i) => (text[..i].to_string(), &text[i..], false),
            None => return Ok(None),
        }
    };

    if let Some(rest) = after.strip_prefix(':') {
        return Ok(Some(KeyLine { key, header: None, rest: rest.trim_start() }));
    }
    if after.starts_with('[') {
        let (header, rest) = parse_header(after, number)?;
        return Ok(Some(KeyLine { key, header: Some(header), rest }));
    }
    if quoted && after.trim().is_empty() {
        return Ok(None);
    }
    Err(syntax(number, "expected ':' after key"))
}

/// Parse a header starting at `[`. Returns it with the text after the colon.
fn parse_header(text: &str, number: usize) -> Result<(Header, &str), ToonError> {
    let close = text
        .find(']')
        .ok_or_else(|| syntax(number, "unterminated array length"))?;
    let len = text[1..close]
        .trim()
        .parse::<usize>()
        .map_err(|_| syntax(number, format!("invalid array length '{}'", &text[1..close])))?;

    let mut after = &text[close + 1..];
    let fields = if after.starts_with('{') {
        let end = find_unquoted(after, '}')
            .ok_or_else(|| syntax(number, "unterminated field list"))?;
        let names = split_delimited(&after[1..end])
            .into_iter()
            .map(|name| {
                if name.starts_with('"') {
                    parse_quoted(name, number).map(|(s, _)| s)
                } else if name.is_empty() {
                    Err(syntax(number, "empty field name"))
                } else {
                    Ok(name.to_string())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        after = &after[end + 1..];
        Some(names)
    } else {
        None
    };

    let rest = after
        .strip_prefix(':')
        .ok_or_else(|| syntax(number, "expected ':' after array header"))?;
    Ok((Header { len, fields }, rest.trim_start()))
}

fn find_unquoted(text: &str, target: char) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_quotes {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quotes = false;
            }
        } else if c == '"' {
            in_quotes = true;
        } else if c == target {
            return Some(i);
        }
    }
    None
}

/// Split on the delimiter outside quotes. Tokens are trimmed.
fn split_delimited(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some(i) = find_unquoted(rest, DELIMITER) {
        tokens.push(rest[..i].trim());
        rest = &rest[i + DELIMITER.len_utf8()..];
    }
    tokens.push(rest.trim());
    tokens
}

fn parse_primitive(token: &str, number: usize) -> Result<Value, ToonError> {
    let token = token.trim();
    if token.starts_with('"') {
        let (s, consumed) = parse_quoted(token, number)?;
        if consumed != token.len() {
            return Err(syntax(number, "unexpected characters after closing quote"));
        }
        return Ok(Value::String(s));
    }
    match token {
        "null" => return Ok(Value::Null),
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if is_number_literal(token) {
        if let Some(n) = parse_number(token) {
            return Ok(Value::Number(n));
        }
    }
    Ok(Value::String(token.to_string()))
}

/// Parse a quoted string at the start of `text`; returns the unescaped
/// string and the number of bytes consumed, closing quote included.
fn parse_quoted(text: &str, number: usize) -> Result<(String, usize), ToonError> {
    let mut out = String::new();
    let mut chars = text.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((out, i + 1)),
            '\\' => match chars.next() {
                Some((_, 'n')) => out.push('\n'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, 't')) => out.push('\t'),
                Some((_, '"')) => out.push('"'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, 'u')) => {
                    let hex: String = chars.by_ref().take(4).map(|(_, c)| c).collect();
                    let ch = u32::from_str_radix(&hex, 16)
                        .ok()
                        .filter(|_| hex.len() == 4)
                        .and_then(char::from_u32)
                        .ok_or_else(|| syntax(number, format!("invalid unicode escape '\\u{hex}'")))?;
                    out.push(ch);
                }
                Some((_, other)) => {
                    return Err(syntax(number, format!("invalid escape '\\{other}'")));
                }
                None => break,
            },
            c => out.push(c),
        }
    }
    Err(syntax(number, "unterminated string"))
}

/// JSON number grammar; rejects leading zeros such as `007`.
fn is_number_literal(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    if b.first() == Some(&b'-') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let int_len = i - int_start;
    if int_len == 0 || (int_len > 1 && b[int_start] == b'0') {
        return false;
    }
    if i < b.len() && b[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return false;
        }
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        i += 1;
        if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == b.len()
}

fn parse_number(s: &str) -> Option<Number> {
    if !s.contains(['.', 'e', 'E']) {
        if let Ok(n) = s.parse::<i64>() {
            return Some(Number::from(n));
        }
        if let Ok(n) = s.parse::<u64>() {
            return Some(Number::from(n));
        }
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_object() {
        let v = decode("id: 1\nname: Ada Lovelace\nactive: true\nnote: null").unwrap();
        assert_eq!(v, json!({ "id": 1, "name": "Ada Lovelace", "active": true, "note": null }));
    }

    #[test]
    fn nested_objects() {
        let v = decode("user:\n  id: 7\n  prefs:\n    theme: dark\nok: true").unwrap();
        assert_eq!(v, json!({ "user": { "id": 7, "prefs": { "theme": "dark" } }, "ok": true }));
    }

    #[test]
    fn inline_and_tabular_arrays() {
        let v = decode("tags[2]: math,\"a,b\"\nrows[2]{id,score}:\n  a,1.5\n  b,-2").unwrap();
        assert_eq!(
            v,
            json!({
                "tags": ["math", "a,b"],
                "rows": [{ "id": "a", "score": 1.5 }, { "id": "b", "score": -2 }],
            })
        );
    }

    #[test]
    fn list_items() {
        let text = "items[4]:\n  - 1\n  - a: 1\n    b[2]: 1,2\n  - [2]: 3,4\n  -";
        let v = decode(text).unwrap();
        assert_eq!(v, json!({ "items": [1, { "a": 1, "b": [1, 2] }, [3, 4], {}] }));
    }

    #[test]
    fn list_item_nested_first_field() {
        let v = decode("xs[1]:\n  - a:\n      b: 1\n    c: 2").unwrap();
        assert_eq!(v, json!({ "xs": [{ "a": { "b": 1 }, "c": 2 }] }));
    }

    #[test]
    fn root_forms() {
        assert_eq!(decode("").unwrap(), json!({}));
        assert_eq!(decode("\n  \n").unwrap(), json!({}));
        assert_eq!(decode("hello world").unwrap(), json!("hello world"));
        assert_eq!(decode("\"a: b\"").unwrap(), json!("a: b"));
        assert_eq!(decode("[3]: 1,2,3").unwrap(), json!([1, 2, 3]));
        assert_eq!(decode("[0]:").unwrap(), json!([]));
    }

    #[test]
    fn quoted_values_keep_their_type() {
        let v = decode("a: \"42\"\nb: \"true\"\nc: \"\"\nd: 007\n\"my key\": \"x\\ny\"").unwrap();
        assert_eq!(v, json!({ "a": "42", "b": "true", "c": "", "d": "007", "my key": "x\ny" }));
    }

    #[test]
    fn unicode_escape() {
        assert_eq!(decode("a: \"\\u0007\"").unwrap(), json!({ "a": "\u{7}" }));
        assert!(decode("a: \"\\u00\"").is_err());
    }

    #[test]
    fn length_mismatch_is_reported() {
        let err = decode("tags[3]: a,b").unwrap_err();
        assert_eq!(err, ToonError::LengthMismatch { line: 1, expected: 3, found: 2 });

        let err = decode("rows[2]{a}:\n  1").unwrap_err();
        assert!(matches!(err, ToonError::LengthMismatch { expected: 2, found: 1, .. }));
    }

    #[test]
    fn row_width_mismatch() {
        let err = decode("rows[1]{a,b}:\n  1").unwrap_err();
        assert!(matches!(err, ToonError::Syntax { line: 2, .. }));
    }

    #[test]
    fn odd_indentation_rejected() {
        let err = decode("a:\n   b: 1").unwrap_err();
        assert!(matches!(err, ToonError::Syntax { line: 2, .. }));
    }

    #[test]
    fn unexpected_indentation_rejected() {
        assert!(decode("a: 1\n  b: 2").is_err());
    }

    #[test]
    fn unterminated_string_rejected() {
        assert!(decode("a: \"open").is_err());
        assert!(decode("a[2]: \"x,y").is_err());
    }

    #[test]
    fn missing_colon_rejected() {
        assert!(decode("a: 1\nb").is_err());
    }

    #[test]
    fn nesting_limit() {
        let nested = |levels: usize| {
            (0..levels)
                .map(|i| format!("{}a:", "  ".repeat(i)))
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert!(decode(&nested(MAX_DEPTH + 1)).is_ok());

        let err = decode(&nested(MAX_DEPTH + 2)).unwrap_err();
        assert!(
            matches!(&err, ToonError::Syntax { line, message } if *line == MAX_DEPTH + 2 && message.contains("nesting too deep")),
            "got {err:?}"
        );
    }

    #[test]
    fn very_deep_input_fails_on_a_small_stack() {
        let text = (0..5000)
            .map(|i| format!("{}a:", "  ".repeat(i)))
            .collect::<Vec<_>>()
            .join("\n");
        let result = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || decode(&text))
            .unwrap()
            .join()
            .unwrap();
        assert!(matches!(result, Err(ToonError::Syntax { .. })));
    }

    #[test]
    fn number_grammar() {
        assert!(is_number_literal("0"));
        assert!(is_number_literal("-12.5e+3"));
        assert!(!is_number_literal("01"));
        assert!(!is_number_literal("1."));
        assert!(!is_number_literal("inf"));
        assert!(!is_number_literal("-"));
    }
}
