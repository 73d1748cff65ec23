//! @ai:module:intent Extract tag fragments from directive comments on a field
//! @ai:module:layer domain
//! @ai:module:public_api directive_fragment, scan_directives, Directive
//! @ai:module:stateless true

use crate::syntax::Comment;
use regex::Regex;
use std::sync::OnceLock;

fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^//.*?@(?i:gotags?|inject_tags?):[\t\n\f\r ]*(.*)$").expect("Invalid regex")
    })
}

/// @ai:intent A directive comment together with the fragment it supplies
#[derive(Debug, Clone, Copy)]
pub struct Directive<'a> {
    pub comment: &'a Comment,
    pub fragment: &'a str,
}

/// @ai:intent Capture the fragment of a single `//` directive comment
/// @ai:example ("// @gotags: json:\"id\"") -> Some("json:\"id\"")
/// @ai:example ("/* @gotags: json:\"id\" */") -> None
/// @ai:effects pure
pub fn directive_fragment(text: &str) -> Option<&str> {
    directive_pattern()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// @ai:intent Collect directives from comments in the order given
/// @ai:pre comments are doc comments followed by trailing comments
/// @ai:post empty when the field is not a candidate
/// @ai:effects pure
pub fn scan_directives<'a, I>(comments: I) -> Vec<Directive<'a>>
where
    I: IntoIterator<Item = &'a Comment>,
{
    comments
        .into_iter()
        .filter_map(|comment| {
            directive_fragment(&comment.text).map(|fragment| Directive { comment, fragment })
        })
        .collect()
}
