//! JSON value → Toon text.

use serde_json::{Map, Value};

use super::{DELIMITER, INDENT};

/// Render `value` as Toon. An empty root object renders as the empty string.
pub fn encode(value: &Value) -> String {
    let mut enc = Encoder::default();
    match value {
        Value::Object(map) => enc.object(0, map),
        Value::Array(items) => enc.array(0, String::new(), items, 1),
        other => enc.line(0, &encode_primitive(other)),
    }
    enc.lines.join("\n")
}

#[derive(Default)]
struct Encoder {
    lines: Vec<String>,
}

impl Encoder {
    fn line(&mut self, depth: usize, text: &str) {
        let mut out = " ".repeat(depth * INDENT);
        out.push_str(text);
        self.lines.push(out);
    }

    fn object(&mut self, depth: usize, map: &Map<String, Value>) {
        for (key, value) in map {
            self.field(depth, "", key, value, depth + 1);
        }
    }

    /// Emit one `key: ...` entry. `lead` prefixes the line (list dashes);
    /// nested content is written at `child_depth`.
    fn field(&mut self, depth: usize, lead: &str, key: &str, value: &Value, child_depth: usize) {
        let key = encode_key(key);
        match value {
            Value::Object(map) => {
                self.line(depth, &format!("{lead}{key}:"));
                self.object(child_depth, map);
            }
            Value::Array(items) => self.array(depth, format!("{lead}{key}"), items, child_depth),
            other => self.line(depth, &format!("{lead}{key}: {}", encode_primitive(other))),
        }
    }

    fn array(&mut self, depth: usize, head: String, items: &[Value], child_depth: usize) {
        let n = items.len();

        if items.iter().all(is_primitive) {
            if n == 0 {
                self.line(depth, &format!("{head}[0]:"));
            } else {
                self.line(depth, &format!("{head}[{n}]: {}", join_primitives(items.iter())));
            }
            return;
        }

        if let Some(fields) = tabular_fields(items) {
            let header = fields
                .iter()
                .map(|f| encode_key(f))
                .collect::<Vec<_>>()
                .join(&DELIMITER.to_string());
            self.line(depth, &format!("{head}[{n}]{{{header}}}:"));
            for item in items {
                if let Value::Object(map) = item {
                    let row = join_primitives(fields.iter().filter_map(|f| map.get(f.as_str())));
                    self.line(child_depth, &row);
                }
            }
            return;
        }

        self.line(depth, &format!("{head}[{n}]:"));
        for item in items {
            self.list_item(child_depth, item);
        }
    }

    fn list_item(&mut self, depth: usize, item: &Value) {
        match item {
            Value::Array(inner) => self.array(depth, "- ".to_string(), inner, depth + 1),
            Value::Object(map) => {
                let mut fields = map.iter();
                match fields.next() {
                    None => self.line(depth, "-"),
                    Some((key, value)) => {
                        // First field rides on the dash line; its children sit
                        // below the sibling fields.
                        self.field(depth, "- ", key, value, depth + 2);
                        for (key, value) in fields {
                            self.field(depth + 1, "", key, value, depth + 2);
                        }
                    }
                }
            }
            other => self.line(depth, &format!("- {}", encode_primitive(other))),
        }
    }
}

fn is_primitive(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Field list when every item is an object with the same keys and only
/// primitive values.
fn tabular_fields(items: &[Value]) -> Option<Vec<String>> {
    let first = items.first()?.as_object()?;
    if first.is_empty() {
        return None;
    }
    let fields: Vec<String> = first.keys().cloned().collect();
    let uniform = items.iter().all(|item| {
        item.as_object().is_some_and(|map| {
            map.len() == fields.len()
                && fields.iter().all(|f| map.get(f).is_some_and(is_primitive))
        })
    });
    uniform.then_some(fields)
}

fn join_primitives<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values
        .map(encode_primitive)
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}

pub(super) fn encode_primitive(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => encode_string(s),
        // Callers only pass primitives; fall back to compact JSON.
        other => other.to_string(),
    }
}

fn encode_string(s: &str) -> String {
    if needs_quotes(s) { quote(s) } else { s.to_string() }
}

fn needs_quotes(s: &str) -> bool {
    s.is_empty()
        || s.trim() != s
        || matches!(s, "true" | "false" | "null")
        || s.starts_with('-')
        || s.parse::<f64>().is_ok()
        || (s.len() > 1 && s.starts_with('0') && s.bytes().all(|b| b.is_ascii_digit()))
        || s.chars().any(|c| {
            c == DELIMITER
                || matches!(c, ':' | '"' | '\\' | '[' | ']' | '{' | '}')
                || c.is_control()
        })
}

fn encode_key(key: &str) -> String {
    if is_bare_key(key) { key.to_string() } else { quote(key) }
}

fn is_bare_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_object() {
        let v = json!({ "id": 1, "name": "Ada", "active": true, "note": null });
        assert_eq!(encode(&v), "active: true\nid: 1\nname: Ada\nnote: null");
    }

    #[test]
    fn nested_object_indents_two_spaces() {
        let v = json!({ "user": { "id": 7, "prefs": { "theme": "dark" } } });
        assert_eq!(encode(&v), "user:\n  id: 7\n  prefs:\n    theme: dark");
    }

    #[test]
    fn primitive_array_is_inline() {
        let v = json!({ "tags": ["math", "exam", 3] });
        assert_eq!(encode(&v), "tags[3]: math,exam,3");
    }

    #[test]
    fn empty_collections() {
        assert_eq!(encode(&json!({ "tags": [], "meta": {} })), "meta:\ntags[0]:");
        assert_eq!(encode(&json!({})), "");
        assert_eq!(encode(&json!([])), "[0]:");
    }

    #[test]
    fn uniform_objects_become_a_table() {
        let v = json!({ "tasks": [
            { "id": "t1", "done": false },
            { "id": "t2", "done": true },
        ]});
        assert_eq!(encode(&v), "tasks[2]{done,id}:\n  false,t1\n  true,t2");
    }

    #[test]
    fn mixed_array_uses_list_items() {
        let v = json!({ "items": [1, { "a": 1, "b": [1, 2] }, [3, 4]] });
        assert_eq!(
            encode(&v),
            "items[3]:\n  - 1\n  - a: 1\n    b[2]: 1,2\n  - [2]: 3,4"
        );
    }

    #[test]
    fn list_item_with_nested_first_field() {
        let v = json!({ "xs": [{ "a": { "b": 1 }, "c": 2 }, { "z": [] }] });
        assert_eq!(encode(&v), "xs[2]:\n  - a:\n      b: 1\n    c: 2\n  - z[0]:");
    }

    #[test]
    fn root_primitives_and_arrays() {
        assert_eq!(encode(&json!("hello")), "hello");
        assert_eq!(encode(&json!(42)), "42");
        assert_eq!(encode(&json!([1, 2])), "[2]: 1,2");
    }

    #[test]
    fn ambiguous_strings_are_quoted() {
        let v = json!(["", " pad", "true", "null", "42", "1e5", "-x", "a,b", "k: v", "007", "x\ny"]);
        assert_eq!(
            encode(&v),
            r#"[11]: ""," pad","true","null","42","1e5","-x","a,b","k: v","007","x\ny""#
        );
    }

    #[test]
    fn odd_keys_are_quoted() {
        let v = json!({ "my key": 1, "a.b": 2, "9lives": 3 });
        assert_eq!(encode(&v), "\"9lives\": 3\na.b: 2\n\"my key\": 1");
    }

    #[test]
    fn plain_words_with_spaces_stay_bare() {
        assert_eq!(encode(&json!({ "title": "Complete calculus assignment" })), "title: Complete calculus assignment");
    }
}
