//! Struct tag table.
//!
//! A Go struct tag such as `` `json:"book_id,omitempty" xml:"id"` `` is parsed
//! once, when the declaration is lowered, into an ordered key/value table.
//! Lookup follows `reflect.StructTag.Get`: the first matching key wins and
//! parsing stops at the first malformed pair.

/// Parsed struct tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructTag {
    pairs: Vec<(String, String)>,
}

impl StructTag {
    /// Parse the tag text with its surrounding backquotes or double quotes
    /// already removed.
    pub fn parse(raw: &str) -> Self {
        let mut pairs = Vec::new();
        let mut rest = raw;

        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }

            let bytes = rest.as_bytes();
            let key_len = bytes
                .iter()
                .take_while(|&&b| b > b' ' && b != b':' && b != b'"' && b != 0x7f)
                .count();
            if key_len == 0
                || key_len + 1 >= bytes.len()
                || bytes[key_len] != b':'
                || bytes[key_len + 1] != b'"'
            {
                break;
            }
            let key = &rest[..key_len];
            rest = &rest[key_len + 1..];

            let Some((value, consumed)) = unquote_prefix(rest) else {
                break;
            };
            pairs.push((key.to_string(), value));
            rest = &rest[consumed..];
        }

        Self { pairs }
    }

    /// Value of the first pair named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Serialized name from an encoding tag: the part before the first
    /// comma. `"-"` and a missing key both yield an empty string.
    pub fn key_name(&self, key: &str) -> String {
        match self.get(key) {
            None | Some("-") => String::new(),
            Some(value) => value.split(',').next().unwrap_or_default().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Decode a complete double-quoted string
pub(crate) fn unquote(text: &str) -> Option<String> {
    let (value, consumed) = unquote_prefix(text)?;
    (consumed == text.len()).then_some(value)
}

/// Decode a leading double-quoted string. Returns the value and the number
/// of bytes consumed including both quotes.
fn unquote_prefix(input: &str) -> Option<(String, usize)> {
    let mut chars = input.char_indices();
    if chars.next()?.1 != '"' {
        return None;
    }

    let mut value = String::new();
    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Some((value, idx + 1)),
            '\\' => {
                let (_, escaped) = chars.next()?;
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
            }
            other => value.push(other),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiple_pairs() {
        let tag = StructTag::parse(r#"json:"book_id,omitempty" xml:"id""#);
        assert_eq!(tag.get("json"), Some("book_id,omitempty"));
        assert_eq!(tag.get("xml"), Some("id"));
        assert_eq!(tag.get("yaml"), None);
    }

    #[test]
    fn test_key_name_strips_options() {
        let tag = StructTag::parse(r#"json:"tag,omitempty""#);
        assert_eq!(tag.key_name("json"), "tag");
    }

    #[test]
    fn test_key_name_dash_and_missing_are_empty() {
        let tag = StructTag::parse(r#"json:"-""#);
        assert_eq!(tag.key_name("json"), "");
        assert_eq!(tag.key_name("thrift"), "");
    }

    #[test]
    fn test_first_occurrence_wins() {
        let tag = StructTag::parse(r#"json:"a" json:"b""#);
        assert_eq!(tag.get("json"), Some("a"));
    }

    #[test]
    fn test_malformed_pair_stops_parsing() {
        let tag = StructTag::parse(r#"json:"a" broken xml:"b""#);
        assert_eq!(tag.get("json"), Some("a"));
        assert_eq!(tag.get("xml"), None);
    }

    #[test]
    fn test_escaped_quote_in_value() {
        let tag = StructTag::parse(r#"doc:"say \"hi\"" json:"x""#);
        assert_eq!(tag.get("doc"), Some(r#"say "hi""#));
        assert_eq!(tag.get("json"), Some("x"));
    }

    #[test]
    fn test_unterminated_value_is_dropped() {
        let tag = StructTag::parse(r#"json:"abc"#);
        assert!(tag.is_empty());
    }
}
