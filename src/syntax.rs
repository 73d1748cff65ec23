//! @ai:module:intent Minimal syntax tree for Go struct declarations and their tags
//! @ai:module:layer domain
//! @ai:module:public_api SourceFile, StructType, Field, Comment, TagLit
//! @ai:module:stateless true

use std::ops::Range;

/// @ai:intent A comment attached to a field, as written in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Full text including the `//` or `/* */` delimiters.
    pub text: String,
    pub span: Range<usize>,
    pub line: usize,
    /// Bytes to delete to remove the comment cleanly: the whole line when the
    /// comment stands alone, otherwise the comment plus the blanks before it.
    pub erase: Range<usize>,
}

/// @ai:intent A struct tag literal with its exact byte span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagLit {
    /// Literal text including delimiters.
    pub value: String,
    pub span: Range<usize>,
}

impl TagLit {
    /// @ai:intent Strip delimiters, unquoting interpreted string tags
    /// @ai:example ("`json:\"a\"`") -> "json:\"a\""
    /// @ai:example ("\"json:\\\"a\\\"\"") -> "json:\"a\""
    /// @ai:effects pure
    pub fn content(&self) -> String {
        let value = self.value.as_str();
        if value.len() < 2 {
            return String::new();
        }
        let inner = &value[1..value.len() - 1];
        if value.starts_with('"') {
            unescape(inner)
        } else {
            inner.to_string()
        }
    }

    /// @ai:intent Wrap undelimited tag content as a Go string literal
    /// @ai:pre raw backtick form unless the content itself holds a backtick
    /// @ai:example ("a:\"1\"") -> "`a:\"1\"`"
    /// @ai:example ("a:\"x`y\"") -> "\"a:\\\"x`y\\\"\""
    pub fn wrap(content: &str) -> String {
        if content.contains('`') {
            quote(content)
        } else {
            format!("`{}`", content)
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Decode the escapes of a Go interpreted string body.
fn unescape(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' || i + 1 >= bytes.len() {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let escape = bytes[i + 1];
        i += 2;
        let simple = match escape {
            b'a' => Some(0x07),
            b'b' => Some(0x08),
            b'f' => Some(0x0c),
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            b'v' => Some(0x0b),
            b'\\' | b'\'' | b'"' => Some(escape),
            _ => None,
        };
        if let Some(b) = simple {
            out.push(b);
            continue;
        }
        let decoded = match escape {
            b'x' => hex_value(bytes, i, 2).map(|v| (vec![v as u8], 2)),
            b'0'..=b'7' => octal_value(bytes, i - 1).map(|v| (vec![v], 2)),
            b'u' => hex_value(bytes, i, 4).and_then(|v| utf8_bytes(v).map(|b| (b, 4))),
            b'U' => hex_value(bytes, i, 8).and_then(|v| utf8_bytes(v).map(|b| (b, 8))),
            _ => None,
        };
        match decoded {
            Some((decoded, consumed)) => {
                out.extend_from_slice(&decoded);
                i += consumed;
            }
            None => out.extend_from_slice(&[b'\\', escape]),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(bytes: &[u8], at: usize, digits: usize) -> Option<u32> {
    let digits = bytes.get(at..at + digits)?;
    if !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    u32::from_str_radix(std::str::from_utf8(digits).ok()?, 16).ok()
}

fn octal_value(bytes: &[u8], at: usize) -> Option<u8> {
    let digits = bytes.get(at..at + 3)?;
    if !digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
        return None;
    }
    u8::from_str_radix(std::str::from_utf8(digits).ok()?, 8).ok()
}

fn utf8_bytes(code: u32) -> Option<Vec<u8>> {
    char::from_u32(code).map(|c| c.to_string().into_bytes())
}

/// @ai:intent One field declaration inside a struct type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Declared names; empty for an embedded field.
    pub names: Vec<String>,
    pub tag: Option<TagLit>,
    pub doc: Vec<Comment>,
    pub trailing: Vec<Comment>,
    /// Struct types appearing inside this field's type, in source order.
    pub nested: Vec<StructType>,
    pub line: usize,
    pub span: Range<usize>,
}

impl Field {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }

    /// @ai:intent Doc comments followed by trailing comments, in source order
    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.doc.iter().chain(self.trailing.iter())
    }

    pub fn display_name(&self) -> String {
        self.names.join(", ")
    }
}

/// @ai:intent A `struct { ... }` type with its fields in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    /// Declared type name for `type Name struct`, if any.
    pub name: Option<String>,
    pub line: usize,
    pub fields: Vec<Field>,
}

/// @ai:intent Every struct type of one Go file, outermost first in source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFile {
    pub package: String,
    pub structs: Vec<StructType>,
}
