//! Indent-aware string builder for workflow YAML generation.
//!
//! Lock files use 2-space indentation throughout.

use serde_json::Value;

/// Indent-aware string builder that produces formatted workflow YAML.
pub struct YamlWriter {
    buf: String,
    indent_level: usize,
    /// True if the current line has not yet been written to.
    at_line_start: bool,
}

impl YamlWriter {
    pub fn new() -> Self {
        Self {
            buf: String::with_capacity(4096),
            indent_level: 0,
            at_line_start: true,
        }
    }

    /// Write a complete line (appends newline).
    pub fn line(&mut self, text: &str) {
        self.write_indent();
        self.buf.push_str(text);
        self.buf.push('\n');
        self.at_line_start = true;
    }

    /// Write an empty line.
    pub fn blank(&mut self) {
        self.buf.push('\n');
        self.at_line_start = true;
    }

    /// Increase indent by one level.
    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    /// Decrease indent by one level.
    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    /// Write `key:` and increase indent for its children.
    pub fn mapping(&mut self, key: &str) {
        self.line(&format!("{}:", key));
        self.indent();
    }

    /// Close a `mapping` or `literal` block.
    pub fn end(&mut self) {
        self.dedent();
    }

    /// Write a `key: value` line.
    pub fn entry(&mut self, key: &str, value: &str) {
        self.line(&format!("{}: {}", key, value));
    }

    /// Write a `- text` sequence item.
    pub fn item(&mut self, text: &str) {
        self.line(&format!("- {}", text));
    }

    /// Write `key: |` and increase indent; following `line` calls form the
    /// literal block body.
    pub fn literal(&mut self, key: &str) {
        self.line(&format!("{}: |", key));
        self.indent();
    }

    /// Splice a pre-rendered block at the current indent, preserving the
    /// block's own relative indentation.
    pub fn raw_block(&mut self, block: &str) {
        for line in block.lines() {
            if line.is_empty() {
                self.blank();
            } else {
                self.line(line);
            }
        }
    }

    /// Consume the writer and return the generated string.
    pub fn finish(self) -> String {
        self.buf
    }

    fn write_indent(&mut self) {
        if self.at_line_start && self.indent_level > 0 {
            for _ in 0..self.indent_level {
                self.buf.push_str("  ");
            }
        }
        self.at_line_start = false;
    }
}

impl Default for YamlWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Double-quote a scalar for YAML, escaping the characters that need it.
pub fn yaml_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a pass-through JSON value under `key` in block style. Strings are
/// always quoted; key order is the author's (`serde_json` preserves it).
pub fn emit_value(w: &mut YamlWriter, key: &str, value: &Value) {
    match value {
        Value::Null => w.entry(key, "null"),
        Value::Bool(b) => w.entry(key, &b.to_string()),
        Value::Number(n) => w.entry(key, &n.to_string()),
        Value::String(s) => w.entry(key, &yaml_quote(s)),
        Value::Array(items) => {
            if items.is_empty() {
                w.entry(key, "[]");
                return;
            }
            w.mapping(key);
            for item in items {
                emit_item(w, item);
            }
            w.end();
        }
        Value::Object(map) => {
            if map.is_empty() {
                w.entry(key, "{}");
                return;
            }
            w.mapping(key);
            for (k, v) in map {
                emit_value(w, k, v);
            }
            w.end();
        }
    }
}

fn emit_item(w: &mut YamlWriter, value: &Value) {
    match value {
        Value::Null => w.item("null"),
        Value::Bool(b) => w.item(&b.to_string()),
        Value::Number(n) => w.item(&n.to_string()),
        Value::String(s) => w.item(&yaml_quote(s)),
        // JSON flow style is valid YAML; covers the rare nested sequence.
        Value::Array(_) => w.item(&serde_json::to_string(value).unwrap_or_default()),
        Value::Object(map) => {
            if map.is_empty() {
                w.item("{}");
                return;
            }
            let mut entries = map.iter();
            if let Some((first_key, first_value)) = entries.next() {
                match scalar_text(first_value) {
                    Some(text) => w.item(&format!("{}: {}", first_key, text)),
                    None => {
                        w.item(&format!("{}:", first_key));
                        w.indent();
                        w.indent();
                        emit_children(w, first_value);
                        w.dedent();
                        w.dedent();
                    }
                }
            }
            w.indent();
            for (k, v) in entries {
                emit_value(w, k, v);
            }
            w.dedent();
        }
    }
}

fn emit_children(w: &mut YamlWriter, value: &Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                emit_item(w, item);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                emit_value(w, k, v);
            }
        }
        _ => {
            if let Some(text) = scalar_text(value) {
                w.line(&text);
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(yaml_quote(s)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn basic_line() {
        let mut w = YamlWriter::new();
        w.line("name: \"Demo\"");
        assert_eq!(w.finish(), "name: \"Demo\"\n");
    }

    #[test]
    fn mapping_indents_children() {
        let mut w = YamlWriter::new();
        w.mapping("permissions");
        w.entry("contents", "read");
        w.end();
        assert_eq!(w.finish(), "permissions:\n  contents: read\n");
    }

    #[test]
    fn sequence_items() {
        let mut w = YamlWriter::new();
        w.mapping("needs");
        w.item("agent");
        w.end();
        assert_eq!(w.finish(), "needs:\n  - agent\n");
    }

    #[test]
    fn literal_block() {
        let mut w = YamlWriter::new();
        w.literal("run");
        w.line("echo one");
        w.line("echo two");
        w.end();
        assert_eq!(w.finish(), "run: |\n  echo one\n  echo two\n");
    }

    #[test]
    fn raw_block_preserves_relative_indent() {
        let mut w = YamlWriter::new();
        w.mapping("steps");
        w.raw_block("- name: Hello\n  run: echo hi");
        w.end();
        assert_eq!(w.finish(), "steps:\n  - name: Hello\n    run: echo hi\n");
    }

    #[test]
    fn dedent_saturates_at_zero() {
        let mut w = YamlWriter::new();
        w.dedent();
        w.line("x: 1");
        assert_eq!(w.finish(), "x: 1\n");
    }

    #[test]
    fn quote_escapes() {
        assert_eq!(yaml_quote("plain"), "\"plain\"");
        assert_eq!(yaml_quote("a \"b\""), "\"a \\\"b\\\"\"");
        assert_eq!(yaml_quote("line\nbreak"), "\"line\\nbreak\"");
    }

    #[test]
    fn emit_value_scalars_and_maps() {
        let mut w = YamlWriter::new();
        emit_value(
            &mut w,
            "on",
            &json!({ "workflow_dispatch": null, "push": { "branches": ["main"] } }),
        );
        assert_eq!(
            w.finish(),
            "on:\n  workflow_dispatch: null\n  push:\n    branches:\n      - \"main\"\n"
        );
    }

    #[test]
    fn emit_value_sequence_of_maps() {
        let mut w = YamlWriter::new();
        emit_value(&mut w, "schedule", &json!([{ "cron": "0 9 * * 1" }]));
        assert_eq!(w.finish(), "schedule:\n  - cron: \"0 9 * * 1\"\n");
    }

    #[test]
    fn emit_value_empty_collections() {
        let mut w = YamlWriter::new();
        emit_value(&mut w, "permissions", &json!({}));
        emit_value(&mut w, "labels", &json!([]));
        assert_eq!(w.finish(), "permissions: {}\nlabels: []\n");
    }

    #[test]
    fn emit_item_object_with_trailing_keys() {
        let mut w = YamlWriter::new();
        emit_value(
            &mut w,
            "schedule",
            &json!([{ "cron": "0 9 * * 1", "timezone": "UTC" }]),
        );
        assert_eq!(
            w.finish(),
            "schedule:\n  - cron: \"0 9 * * 1\"\n    timezone: \"UTC\"\n"
        );
    }
}
