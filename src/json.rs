//! Growable JSON string builder, ported from the original `json_builder.c`:
//! every algorithm in `algorithms/` composes its result this way rather than
//! building a `serde_json::Value` tree and serializing it, to avoid an
//! intermediate allocation per nested node/edge projection.

pub struct JsonBuilder {
    buf: String,
    /// Per-nesting-level item counts, so `add_item` knows whether to emit a
    /// leading comma. Mirrors the original's single `item_count`, widened to
    /// a stack so nested arrays/objects don't clobber each other's counts.
    item_counts: Vec<usize>,
}

impl JsonBuilder {
    pub fn new() -> Self {
        JsonBuilder::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        JsonBuilder { buf: String::with_capacity(capacity.max(64)), item_counts: Vec::new() }
    }

    pub fn start_array(&mut self) -> &mut Self {
        self.buf.push('[');
        self.item_counts.push(0);
        self
    }

    pub fn end_array(&mut self) -> &mut Self {
        self.buf.push(']');
        self.item_counts.pop();
        self
    }

    pub fn start_object(&mut self) -> &mut Self {
        self.buf.push('{');
        self.item_counts.push(0);
        self
    }

    pub fn end_object(&mut self) -> &mut Self {
        self.buf.push('}');
        self.item_counts.pop();
        self
    }

    /// Raw append, no comma bookkeeping. Used for fragments assembled by the
    /// caller (e.g. a whole nested object already closed).
    pub fn append(&mut self, s: &str) -> &mut Self {
        self.buf.push_str(s);
        self
    }

    /// Append `item`, preceding it with a comma if this isn't the first item
    /// at the current nesting level.
    pub fn add_item(&mut self, item: &str) -> &mut Self {
        if let Some(count) = self.item_counts.last_mut() {
            if *count > 0 {
                self.buf.push(',');
            }
            *count += 1;
        }
        self.buf.push_str(item);
        self
    }

    pub fn add_key_value_raw(&mut self, key: &str, raw_value: &str) -> &mut Self {
        let entry = format!("{}:{}", json_string(key), raw_value);
        self.add_item(&entry)
    }

    pub fn add_key_string(&mut self, key: &str, value: &str) -> &mut Self {
        self.add_key_value_raw(key, &json_string(value))
    }

    pub fn add_key_number(&mut self, key: &str, value: f64) -> &mut Self {
        self.add_key_value_raw(key, &json_number(value))
    }

    pub fn add_key_int(&mut self, key: &str, value: i64) -> &mut Self {
        self.add_key_value_raw(key, &value.to_string())
    }

    pub fn add_key_bool(&mut self, key: &str, value: bool) -> &mut Self {
        self.add_key_value_raw(key, if value { "true" } else { "false" })
    }

    /// Transfers ownership of the built text and resets the builder, mirroring
    /// `jbuf_take`.
    pub fn take(&mut self) -> String {
        self.item_counts.clear();
        std::mem::take(&mut self.buf)
    }
}

impl Default for JsonBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape a Rust string as a JSON string literal, quotes included.
pub fn json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// NaN/Infinity are not valid JSON; fall back to `null` like most JSON
/// encoders do when handed a non-finite float.
pub fn json_number(v: f64) -> String {
    if v.is_finite() {
        if v == v.trunc() && v.abs() < 1e15 {
            format!("{:.1}", v)
        } else {
            format!("{}", v)
        }
    } else {
        "null".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_array_of_objects() {
        let mut jb = JsonBuilder::new();
        jb.start_array();
        for (name, score) in [("a", 1.0), ("b", 2.5)] {
            let mut obj = JsonBuilder::new();
            obj.start_object();
            obj.add_key_string("name", name);
            obj.add_key_number("score", score);
            obj.end_object();
            jb.add_item(&obj.take());
        }
        jb.end_array();
        assert_eq!(jb.take(), r#"[{"name":"a","score":1.0},{"name":"b","score":2.5}]"#);
    }

    #[test]
    fn escapes_control_characters() {
        assert_eq!(json_string("a\"b\\c\n"), r#""a\"b\\c\n""#);
    }

    #[test]
    fn empty_array_round_trips() {
        let mut jb = JsonBuilder::new();
        jb.start_array().end_array();
        assert_eq!(jb.take(), "[]");
    }
}
