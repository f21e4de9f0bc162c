use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Key of the synthetic field holding the spot's crawl-relative path.
pub const URL_FIELD: &str = "url";

/// Stored when a label has no value element after it.
pub const MISSING_VALUE: &str = "None";

/// Label/value pairs scraped from one spot page, in first-insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpotRecord {
    fields: Vec<(String, String)>,
}

impl SpotRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            fields: vec![(URL_FIELD.to_string(), path.into())],
        }
    }

    /// Insert or overwrite a field. An overwritten key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn url(&self) -> Option<&str> {
        self.get(URL_FIELD)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// One JSON object per line.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Renders the record as a single-line dict literal: `{'url': 'a/b', 'Break Type': 'Reef'}`.
impl fmt::Display for SpotRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, (key, value)) in self.fields.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", quote_literal(key), quote_literal(value))?;
        }
        f.write_str("}")
    }
}

impl Serialize for SpotRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Quote a string literal. Single quotes unless the text holds a single quote and no
/// double quote.
fn quote_literal(text: &str) -> String {
    let quote = if text.contains('\'') && !text.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if !is_printable(c) => out.push_str(&escape_code_point(c)),
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Control, format, separator and private-use characters are escaped; the ASCII space is not.
fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    !matches!(
        c as u32,
        0x00AD
            | 0x0600..=0x0605
            | 0x061C
            | 0x06DD
            | 0x070F
            | 0x08E2
            | 0x180E
            | 0x200B..=0x200F
            | 0x202A..=0x202E
            | 0x2060..=0x2064
            | 0x2066..=0x206F
            | 0xE000..=0xF8FF
            | 0xFEFF
            | 0xFFF9..=0xFFFB
            | 0x110BD
            | 0x110CD
            | 0x1D173..=0x1D17A
            | 0xE0001
            | 0xE0020..=0xE007F
            | 0xF0000..=0x10FFFF
    )
}

fn escape_code_point(c: char) -> String {
    let code = c as u32;
    if code < 0x100 {
        format!("\\x{:02x}", code)
    } else if code < 0x10000 {
        format!("\\u{:04x}", code)
    } else {
        format!("\\U{:08x}", code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_field_first() {
        let mut record = SpotRecord::new("Asia/Indonesia/Bali/leftpoint");
        record.insert("Break Type", "Reef");

        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["url", "Break Type"]);
        assert_eq!(record.url(), Some("Asia/Indonesia/Bali/leftpoint"));
    }

    #[test]
    fn test_last_write_wins_keeps_position() {
        let mut record = SpotRecord::new("x");
        record.insert("Wave quality", "Regional");
        record.insert("Bottom", "Sand");
        record.insert("Wave quality", "World class");

        assert_eq!(record.get("Wave quality"), Some("World class"));
        assert_eq!(record.len(), 3);
        let keys: Vec<&str> = record.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["url", "Wave quality", "Bottom"]);
    }

    #[test]
    fn test_display_literal() {
        let mut record = SpotRecord::new("Asia/Indonesia/Bali/leftpoint");
        record.insert("Break Type", "Reef");
        record.insert("Wave Direction", MISSING_VALUE);

        assert_eq!(
            record.to_string(),
            "{'url': 'Asia/Indonesia/Bali/leftpoint', 'Break Type': 'Reef', 'Wave Direction': 'None'}"
        );
    }

    #[test]
    fn test_display_quoting() {
        let mut record = SpotRecord::new("Europe/France/Hossegor");
        record.insert("Name", "La Gravière d'Hossegor");
        record.insert("Notes", "Both ' and \" here");
        record.insert("Path", "C:\\surf\tspot");

        assert_eq!(
            record.to_string(),
            "{'url': 'Europe/France/Hossegor', 'Name': \"La Gravière d'Hossegor\", \
             'Notes': 'Both \\' and \" here', 'Path': 'C:\\\\surf\\tspot'}"
        );
    }

    #[test]
    fn test_display_escapes_non_printable() {
        let mut record = SpotRecord::new("Asia/Japan/Chiba/ichinomiya");
        record.insert("Name", "Point\u{a0}break");
        record.insert("Access", "bell\u{7}\u{85}\u{200b}zone");
        record.insert("Tag", "\u{f0000}");
        record.insert("Town", "Ichinomiya 一宮");

        assert_eq!(
            record.to_string(),
            "{'url': 'Asia/Japan/Chiba/ichinomiya', 'Name': 'Point\\xa0break', \
             'Access': 'bell\\x07\\x85\\u200bzone', 'Tag': '\\U000f0000', \
             'Town': 'Ichinomiya 一宮'}"
        );
    }

    #[test]
    fn test_json_line_preserves_order() {
        let mut record = SpotRecord::new("a/b");
        record.insert("Zeta", "1");
        record.insert("Alpha", "2");

        assert_eq!(
            record.to_json_line().unwrap(),
            r#"{"url":"a/b","Zeta":"1","Alpha":"2"}"#
        );
    }
}
