//! @ai:module:intent Walk struct fields and compute tag rewrites from directive comments
//! @ai:module:layer application
//! @ai:module:public_api annotate, Injection
//! @ai:module:depends_on annotation, directive, syntax, patcher, config, report
//! @ai:module:stateless true

use crate::annotation::override_tag;
use crate::config::InjectOptions;
use crate::directive::scan_directives;
use crate::parser::ParsedSource;
use crate::patcher::PatchRegion;
use crate::report::FieldChange;
use crate::syntax::{Field, StructType, TagLit};
use std::ops::Range;

/// @ai:intent Everything one traversal decided to change, in ascending source order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Injection {
    pub regions: Vec<PatchRegion>,
    pub changes: Vec<FieldChange>,
    pub directives_removed: usize,
}

/// @ai:intent Rewrite tags of every qualifying field and record patch regions
/// @ai:pre parsed.file was parsed from parsed.content
/// @ai:post regions are ascending and disjoint; tag values in the tree hold the new literals
/// @ai:effects pure
pub fn annotate(parsed: &mut ParsedSource, options: &InjectOptions) -> Injection {
    let mut walker = Walker {
        src: &parsed.content,
        options,
        out: Injection::default(),
    };
    for decl in &mut parsed.file.structs {
        walker.visit_struct(decl);
    }
    walker.out
}

struct Walker<'a> {
    src: &'a [u8],
    options: &'a InjectOptions,
    out: Injection,
}

/// Directive data copied out of the field so the field can be mutated.
struct Found {
    fragment: String,
    erase: Range<usize>,
}

impl Walker<'_> {
    fn visit_struct(&mut self, decl: &mut StructType) {
        let struct_name = decl.name.clone();
        for field in &mut decl.fields {
            self.visit_field(struct_name.as_deref(), field);
        }
    }

    fn visit_field(&mut self, struct_name: Option<&str>, field: &mut Field) {
        let found = self.directives(field);
        let (before, after): (Vec<_>, Vec<_>) = found
            .iter()
            .partition(|d| d.erase.end <= field.span.start);

        // doc comments, then nested types, then the tag, then trailing comments
        self.erase(&before);
        for nested in &mut field.nested {
            self.visit_struct(nested);
        }

        if found.is_empty() {
            return;
        }
        let Some(tag) = field.tag.as_mut() else {
            return;
        };

        let fragments: Vec<&str> = found.iter().map(|d| d.fragment.as_str()).collect();
        let new_value = TagLit::wrap(&override_tag(&tag.content(), &fragments));

        if new_value != tag.value {
            tracing::debug!(
                "field {} at line {}: {} -> {}",
                field.names.join(", "),
                field.line,
                tag.value,
                new_value
            );
            self.out.regions.push(PatchRegion::new(
                tag.span.start,
                tag.span.end,
                &self.src[tag.span.clone()],
                new_value.clone(),
            ));
            self.out.changes.push(FieldChange {
                struct_name: struct_name.map(str::to_string),
                field: field.names.join(", "),
                line: field.line,
                old_tag: std::mem::replace(&mut tag.value, new_value.clone()),
                new_tag: new_value,
            });
        }

        self.erase(&after);
    }

    /// Directives of a field that qualifies for rewriting; empty otherwise.
    fn directives(&self, field: &Field) -> Vec<Found> {
        if field.is_embedded() {
            return Vec::new();
        }
        if self.options.skips(&field.names) {
            tracing::debug!("skipping excluded field {}", field.display_name());
            return Vec::new();
        }

        let found: Vec<Found> = scan_directives(field.comments())
            .into_iter()
            .map(|d| Found {
                fragment: d.fragment.to_string(),
                erase: d.comment.erase.clone(),
            })
            .collect();

        if !found.is_empty() && field.tag.is_none() {
            tracing::debug!(
                "field {} at line {} has inject directives but no tag",
                field.display_name(),
                field.line
            );
            return Vec::new();
        }
        found
    }

    fn erase(&mut self, found: &[&Found]) {
        if !self.options.strip_directives {
            return;
        }
        for d in found {
            self.out.regions.push(PatchRegion::new(
                d.erase.start,
                d.erase.end,
                &self.src[d.erase.clone()],
                "",
            ));
            self.out.directives_removed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InjectConfig;
    use crate::parser::parse_source;
    use crate::patcher::patch_source;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn parsed(src: &str) -> ParsedSource {
        ParsedSource {
            path: PathBuf::from("test.go"),
            content: src.as_bytes().to_vec(),
            file: parse_source(src.as_bytes()).unwrap(),
        }
    }

    fn rewrite(src: &str, options: &InjectOptions) -> (String, Injection) {
        let mut parsed = parsed(src);
        let injection = annotate(&mut parsed, options);
        let patched = patch_source(src.as_bytes(), &injection.regions);
        (String::from_utf8(patched).unwrap(), injection)
    }

    const USER: &str = r#"package pb

type User struct {
	// @gotags: valid:"required"
	Email string `protobuf:"bytes,1,opt,name=email,proto3" json:"email,omitempty"`
	Id    int64  `json:"id"` // @inject_tag: json:"user_id" db:"id"
	Name  string `json:"name"`
}
"#;

    #[test]
    fn test_rewrites_doc_and_trailing_directives() {
        let (out, injection) = rewrite(USER, &InjectOptions::default());

        assert_eq!(
            out,
            r#"package pb

type User struct {
	// @gotags: valid:"required"
	Email string `protobuf:"bytes,1,opt,name=email,proto3" json:"email,omitempty" valid:"required"`
	Id    int64  `json:"user_id" db:"id"` // @inject_tag: json:"user_id" db:"id"
	Name  string `json:"name"`
}
"#
        );
        assert_eq!(injection.changes.len(), 2);
        assert_eq!(injection.changes[1].struct_name.as_deref(), Some("User"));
        assert_eq!(injection.changes[1].field, "Id");
        assert_eq!(injection.changes[1].old_tag, r#"`json:"id"`"#);
    }

    #[test]
    fn test_tree_holds_new_literal() {
        let mut parsed = parsed(USER);
        annotate(&mut parsed, &InjectOptions::default());

        let id = &parsed.file.structs[0].fields[1];
        assert_eq!(id.tag.as_ref().unwrap().value, r#"`json:"user_id" db:"id"`"#);
    }

    #[test]
    fn test_idempotent() {
        let options = InjectOptions::default();
        let (once, _) = rewrite(USER, &options);
        let (twice, injection) = rewrite(&once, &options);

        assert_eq!(once, twice);
        assert!(injection.regions.is_empty());
    }

    #[test]
    fn test_doc_lines_then_trailing_line() {
        let src = r#"package p
type T struct {
	// @gotags: a:"doc1" b:"doc1"
	// @gotags: a:"doc2"
	X int `a:"0"` // @gotags: b:"trail"
}
"#;
        let (out, _) = rewrite(src, &InjectOptions::default());
        assert!(out.contains(r#"X int `a:"doc2" b:"trail"` // @gotags"#));
    }

    #[test]
    fn test_embedded_field_is_skipped() {
        let src = "package p\ntype T struct {\n\t// @gotags: json:\"base\"\n\tBase `json:\"b\"`\n}\n";
        let (out, injection) = rewrite(src, &InjectOptions::default());

        assert_eq!(out, src);
        assert!(injection.regions.is_empty());
    }

    #[test]
    fn test_skip_list_excludes_field() {
        let src = "package p\ntype T struct {\n\tXXX_a int `json:\"-\"` // @gotags: xml:\"-\"\n\tB int `json:\"b\"` // @gotags: xml:\"b\"\n}\n";
        let options = InjectConfig {
            skip_fields: vec!["XXX_*".into()],
            ..Default::default()
        }
        .options(false)
        .unwrap();

        let (_, injection) = rewrite(src, &options);
        assert_eq!(injection.changes.len(), 1);
        assert_eq!(injection.changes[0].field, "B");
    }

    #[test]
    fn test_no_directives_is_noop() {
        let src = "package p\n// @gotags: a:\"1\"\ntype T struct {\n\tA int `a:\"0\"` // note\n}\n";
        let (out, injection) = rewrite(src, &InjectOptions::default());

        assert_eq!(out, src);
        assert_eq!(injection, Injection::default());
    }

    #[test]
    fn test_empty_fragment_keeps_tag() {
        let src = "package p\ntype T struct {\n\tA int `a:\"0\"` // @gotags:\n}\n";
        let (out, injection) = rewrite(src, &InjectOptions::default());

        assert_eq!(out, src);
        assert!(injection.regions.is_empty());
    }

    #[test]
    fn test_field_without_tag_is_skipped() {
        let src = "package p\ntype T struct {\n\tA int // @gotags: a:\"1\"\n}\n";
        let (out, _) = rewrite(src, &InjectOptions::default());
        assert_eq!(out, src);
    }

    #[test]
    fn test_interpreted_tag_becomes_raw() {
        let src = "package p\ntype T struct {\n\tA int \"a:\\\"0\\\"\" // @gotags: b:\"1\"\n}\n";
        let (out, _) = rewrite(src, &InjectOptions::default());
        assert!(out.contains("A int `a:\"0\" b:\"1\"` //"));
    }

    #[test]
    fn test_backtick_in_tag_stays_interpreted() {
        let src = "package p\ntype T struct {\n\tX int \"x:\\\"a`b\\\"\" // @gotags: a:\"1\"\n}\n";
        let (once, _) = rewrite(src, &InjectOptions::default());
        assert!(once.contains("X int \"x:\\\"a`b\\\" a:\\\"1\\\"\" //"));

        let (twice, injection) = rewrite(&once, &InjectOptions::default());
        assert_eq!(once, twice);
        assert!(injection.regions.is_empty());
    }

    #[test]
    fn test_comment_after_open_brace_is_not_a_directive() {
        let src = "package p\ntype T struct { // @gotags: a:\"1\"\n\tX int `x:\"0\"`\n}\n";
        let (out, injection) = rewrite(src, &InjectOptions::default());
        assert_eq!(out, src);
        assert!(injection.regions.is_empty());
    }

    #[test]
    fn test_nested_regions_ascending() {
        let src = r#"package p
type Outer struct {
	// @gotags: o:"1"
	Inner struct {
		X int `x:"0"` // @gotags: x:"1"
	} `inner:"0"` // @gotags: i:"1"
	Y int `y:"0"` // @gotags: y:"1"
}
"#;
        let options = InjectOptions {
            strip_directives: true,
            ..Default::default()
        };
        let (out, injection) = rewrite(src, &options);

        let starts: Vec<_> = injection.regions.iter().map(|r| r.start).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
        for pair in injection.regions.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }

        assert_eq!(
            out,
            r#"package p
type Outer struct {
	Inner struct {
		X int `x:"1"`
	} `inner:"0" o:"1" i:"1"`
	Y int `y:"1"`
}
"#
        );
        assert_eq!(injection.directives_removed, 4);
    }
}
