//! @ai:module:intent Parse, merge and format Go struct tag annotations
//! @ai:module:layer domain
//! @ai:module:public_api Annotation, Entry, override_tag
//! @ai:module:stateless true

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Separator between the primary value and its modifiers inside one quoted value.
const VALUE_SEPARATOR: char = ',';

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"([A-Za-z0-9_]+):"([^"]+)""#).expect("Invalid regex"))
}

/// @ai:intent One `key:"primary,modifier..."` item of a struct tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub values: Vec<String>,
}

impl Entry {
    /// @ai:intent Build an entry from a key and its raw quoted content
    /// @ai:example ("json", "name,omitempty") -> Entry { key: json, values: [name, omitempty] }
    pub fn new(key: impl Into<String>, raw_value: &str) -> Self {
        Self {
            key: key.into(),
            values: raw_value.split(VALUE_SEPARATOR).map(str::to_string).collect(),
        }
    }

    /// @ai:intent The first sub-value, which consumers treat as the name
    pub fn primary(&self) -> &str {
        self.values.first().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = VALUE_SEPARATOR.to_string();
        write!(f, "{}:\"{}\"", self.key, self.values.join(&sep))
    }
}

/// @ai:intent Ordered, unique-keyed set of tag entries
/// @ai:invariant no two entries share a key; order is order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    entries: Vec<Entry>,
}

impl Annotation {
    /// @ai:intent Split raw tag content into entries, dropping anything malformed
    /// @ai:pre raw has no surrounding delimiters
    /// @ai:example ("json:\"id\" db:\"user_id\"") -> [json, db]
    /// @ai:example ("not a tag") -> []
    /// @ai:effects pure
    pub fn parse(raw: &str) -> Self {
        let mut annotation = Self::default();
        for captures in tag_pattern().captures_iter(raw) {
            annotation.set(Entry::new(&captures[1], &captures[2]));
        }
        annotation
    }

    /// @ai:intent Insert an entry, replacing an existing key in place or appending
    /// @ai:post position of an existing key is unchanged
    pub fn set(&mut self, entry: Entry) {
        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(existing) => existing.values = entry.values,
            None => self.entries.push(entry),
        }
    }

    /// @ai:intent Merge directive fragments over this annotation, rightmost wins per key
    /// @ai:post every key of every fragment is present; keys stay unique
    /// @ai:effects pure
    pub fn overridden<S: AsRef<str>>(mut self, fragments: &[S]) -> Self {
        for fragment in fragments {
            for entry in Self::parse(fragment.as_ref()).entries {
                self.set(entry);
            }
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// @ai:intent Serialize entries space-separated, without delimiters
    /// @ai:effects pure
    pub fn format(&self) -> String {
        self.entries
            .iter()
            .map(Entry::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// @ai:intent Apply fragments to undelimited tag content and return the new content
/// @ai:example ("a:\"1\"", []) -> "a:\"1\""
/// @ai:effects pure
pub fn override_tag<S: AsRef<str>>(current: &str, fragments: &[S]) -> String {
    if fragments.is_empty() {
        return current.to_string();
    }
    Annotation::parse(current).overridden(fragments).format()
}
