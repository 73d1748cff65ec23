//! @ai:module:intent Parse Go source files into struct declarations with tags and comments
//! @ai:module:layer application
//! @ai:module:public_api parse_file, parse_source, ParsedSource
//! @ai:module:depends_on lexer, syntax, error
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::lexer::{tokenize, SyntaxError, Token, TokenKind};
use crate::syntax::{Comment, Field, SourceFile, StructType, TagLit};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// @ai:intent Parsed Go file together with the bytes it was parsed from
#[derive(Debug)]
pub struct ParsedSource {
    pub path: PathBuf,
    pub content: Vec<u8>,
    pub file: SourceFile,
}

/// @ai:intent Parse a Go source file and extract its struct declarations
/// @ai:pre path exists and is readable
/// @ai:post result contains every struct type of the file in source order
/// @ai:effects fs:read
pub fn parse_file(path: &Path) -> Result<ParsedSource> {
    tracing::debug!("parsing file {:?} for inject tag comments", path);

    let content = std::fs::read(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let file = parse_source(&content).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        line: e.line,
        message: e.message,
    })?;

    Ok(ParsedSource {
        path: path.to_path_buf(),
        content,
        file,
    })
}

/// @ai:intent Parse Go source bytes into struct declarations
/// @ai:effects pure
pub fn parse_source(src: &[u8]) -> std::result::Result<SourceFile, SyntaxError> {
    let tokens = tokenize(src)?;
    let matching = match_brackets(src, &tokens)?;
    let parser = Parser {
        src,
        tokens,
        matching,
    };

    let package = parser.package_clause()?;
    let structs = parser.scan_structs(0, parser.tokens.len(), false)?;

    Ok(SourceFile { package, structs })
}

/// @ai:intent Pair every opening bracket with its closing bracket
/// @ai:post matching[open] == Some(close) for each balanced pair
/// @ai:effects pure
fn match_brackets(
    src: &[u8],
    tokens: &[Token],
) -> std::result::Result<Vec<Option<usize>>, SyntaxError> {
    let mut matching = vec![None; tokens.len()];
    let mut stack: Vec<(usize, u8)> = Vec::new();

    for (idx, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Punct {
            continue;
        }
        match src[token.start] {
            b'(' => stack.push((idx, b')')),
            b'[' => stack.push((idx, b']')),
            b'{' => stack.push((idx, b'}')),
            close @ (b')' | b']' | b'}') => match stack.pop() {
                Some((open, expected)) if expected == close => matching[open] = Some(idx),
                _ => {
                    return Err(SyntaxError::new(
                        token.line,
                        format!("unexpected '{}'", close as char),
                    ))
                }
            },
            _ => {}
        }
    }

    if let Some((open, _)) = stack.pop() {
        let token = &tokens[open];
        return Err(SyntaxError::new(
            token.line,
            format!("unclosed '{}'", src[token.start] as char),
        ));
    }

    Ok(matching)
}

struct Parser<'a> {
    src: &'a [u8],
    tokens: Vec<Token>,
    matching: Vec<Option<usize>>,
}

impl Parser<'_> {
    fn package_clause(&self) -> std::result::Result<String, SyntaxError> {
        let keyword = self.next_code(0, self.tokens.len());
        let name = keyword.and_then(|k| self.next_code(k + 1, self.tokens.len()));

        match (keyword, name) {
            (Some(k), Some(n))
                if self.tokens[k].is_ident(self.src, "package")
                    && self.tokens[n].kind == TokenKind::Ident =>
            {
                Ok(self.text(n))
            }
            (Some(k), _) => Err(SyntaxError::new(
                self.tokens[k].line,
                "expected 'package' clause",
            )),
            (None, _) => Err(SyntaxError::new(1, "expected 'package' clause")),
        }
    }

    /// Find `struct {` in tokens `[from, to)` and parse each one found.
    fn scan_structs(
        &self,
        from: usize,
        to: usize,
        in_type_group: bool,
    ) -> std::result::Result<Vec<StructType>, SyntaxError> {
        let mut structs = Vec::new();
        let mut i = from;

        while i < to {
            let token = &self.tokens[i];

            if token.is_ident(self.src, "type") {
                if let Some(open) = self.next_code(i + 1, to) {
                    if self.tokens[open].is_punct(self.src, b'(') {
                        let close = self.close_of(open);
                        structs.extend(self.scan_structs(open + 1, close, true)?);
                        i = close + 1;
                        continue;
                    }
                }
            }

            if let Some(open) = self.struct_body(i, to) {
                let name = self.declared_name(i, in_type_group);
                structs.push(self.parse_struct(open, name)?);
                i = self.close_of(open) + 1;
                continue;
            }

            i += 1;
        }

        Ok(structs)
    }

    /// Index of the `{` when token `i` is the `struct` keyword opening a body.
    fn struct_body(&self, i: usize, to: usize) -> Option<usize> {
        if !self.tokens[i].is_ident(self.src, "struct") {
            return None;
        }
        self.next_code(i + 1, to)
            .filter(|&open| self.tokens[open].is_punct(self.src, b'{'))
    }

    fn declared_name(&self, struct_idx: usize, in_type_group: bool) -> Option<String> {
        let name_idx = self.prev_code(struct_idx)?;
        if self.tokens[name_idx].kind != TokenKind::Ident {
            return None;
        }

        let before = self.prev_code(name_idx);
        let after_type = before.is_some_and(|b| self.tokens[b].is_ident(self.src, "type"));
        let starts_decl = before.map_or(true, |b| {
            let prev = &self.tokens[b];
            prev.end_line < self.tokens[name_idx].line
                || prev.is_punct(self.src, b'(')
                || prev.is_punct(self.src, b';')
        });

        (after_type || (in_type_group && starts_decl)).then(|| self.text(name_idx))
    }

    fn parse_struct(
        &self,
        open: usize,
        name: Option<String>,
    ) -> std::result::Result<StructType, SyntaxError> {
        let close = self.close_of(open);
        let mut fields = Vec::new();
        let mut group: Vec<Comment> = Vec::new();
        // Line of the last code token; comments sharing it never become docs.
        let mut code_line = self.tokens[open].end_line;
        let mut i = open + 1;

        while i < close {
            let token = &self.tokens[i];

            if token.is_comment() {
                if token.line == code_line {
                    group.clear();
                    i += 1;
                    continue;
                }
                if group.last().is_some_and(|c| self.line_after(c) < token.line) {
                    group.clear();
                }
                group.push(self.comment(i));
                i += 1;
                continue;
            }

            if token.is_punct(self.src, b';') {
                group.clear();
                code_line = token.end_line;
                i += 1;
                continue;
            }

            let attached = group
                .last()
                .is_some_and(|last| self.line_after(last) == token.line);
            let doc = if attached {
                std::mem::take(&mut group)
            } else {
                Vec::new()
            };
            group.clear();

            let (field, next) = self.parse_field(i, close, doc)?;
            fields.push(field);
            code_line = self
                .prev_code(next)
                .map_or(code_line, |p| self.tokens[p].end_line);
            i = next;
        }

        Ok(StructType {
            name,
            line: self.tokens[open].line,
            fields,
        })
    }

    /// Parse one field starting at `start`; returns it with the index after it.
    fn parse_field(
        &self,
        start: usize,
        close: usize,
        doc: Vec<Comment>,
    ) -> std::result::Result<(Field, usize), SyntaxError> {
        let mut code: Vec<usize> = Vec::new();
        let mut trailing: Vec<Comment> = Vec::new();
        let mut nested: Vec<StructType> = Vec::new();
        let mut i = start;

        while i < close {
            let token = &self.tokens[i];
            let last = code.last().map(|&l| &self.tokens[l]);

            if token.is_comment() {
                match last {
                    Some(last) if token.line == last.end_line => trailing.push(self.comment(i)),
                    Some(last) if last.ends_line(self.src) => break,
                    _ => {}
                }
                i += 1;
                continue;
            }

            if let Some(last) = last {
                if token.line > last.end_line && last.ends_line(self.src) {
                    break;
                }
                if token.line == last.end_line {
                    trailing.clear();
                }
            }

            if token.is_punct(self.src, b';') {
                i += 1;
                self.absorb_line_comments(&mut i, close, token.line, &mut trailing);
                break;
            }

            if let Some(open) = self.struct_body(i, close) {
                let inner_close = self.close_of(open);
                nested.push(self.parse_struct(open, None)?);
                code.extend([i, open, inner_close]);
                i = inner_close + 1;
                continue;
            }

            if let Some(pair_close) = self.matching[i] {
                nested.extend(self.scan_structs(i + 1, pair_close, false)?);
                code.extend([i, pair_close]);
                i = pair_close + 1;
                continue;
            }

            code.push(i);
            i += 1;
        }

        let field = self.build_field(&code, doc, trailing, nested);
        Ok((field, i))
    }

    /// After an explicit `;`, comments closing out the same line trail the field.
    fn absorb_line_comments(
        &self,
        i: &mut usize,
        close: usize,
        line: usize,
        trailing: &mut Vec<Comment>,
    ) {
        let mut j = *i;
        let mut found = Vec::new();
        while j < close && self.tokens[j].is_comment() && self.tokens[j].line == line {
            found.push(self.comment(j));
            j += 1;
        }
        let line_ends = j >= close || self.tokens[j].line > line;
        if !found.is_empty() && line_ends {
            trailing.extend(found);
            *i = j;
        }
    }

    fn build_field(
        &self,
        code: &[usize],
        doc: Vec<Comment>,
        trailing: Vec<Comment>,
        nested: Vec<StructType>,
    ) -> Field {
        let first = &self.tokens[code[0]];
        let last = &self.tokens[code[code.len() - 1]];

        let has_tag = code.len() >= 2
            && matches!(last.kind, TokenKind::String | TokenKind::RawString);
        let tag = has_tag.then(|| TagLit {
            value: self.text(code[code.len() - 1]),
            span: last.span(),
        });
        let type_tokens = if has_tag { &code[..code.len() - 1] } else { code };

        Field {
            names: self.field_names(type_tokens),
            tag,
            doc,
            trailing,
            nested,
            line: first.line,
            span: first.start..last.end,
        }
    }

    /// Names of the field, or nothing for `[*]Type[.Sel][TypeArgs]` embeddings.
    fn field_names(&self, toks: &[usize]) -> Vec<String> {
        let tok = |k: usize| &self.tokens[toks[k]];
        if toks.is_empty() || tok(0).kind != TokenKind::Ident {
            return Vec::new();
        }

        let declares_list = toks.len() > 1 && tok(1).is_punct(self.src, b',');
        if !declares_list {
            let mut k = 1;
            if k + 1 < toks.len() && tok(k).is_punct(self.src, b'.') {
                k += 2;
            }
            if k < toks.len() && tok(k).is_punct(self.src, b'[') {
                // bracket pairs are recorded as open + close
                k += 2;
            }
            if k >= toks.len() {
                return Vec::new();
            }
        }

        let mut names = vec![self.text(toks[0])];
        let mut k = 1;
        while k + 1 < toks.len()
            && tok(k).is_punct(self.src, b',')
            && tok(k + 1).kind == TokenKind::Ident
        {
            names.push(self.text(toks[k + 1]));
            k += 2;
        }
        names
    }

    fn comment(&self, idx: usize) -> Comment {
        let token = &self.tokens[idx];
        Comment {
            text: self.text(idx),
            span: token.span(),
            line: token.line,
            erase: erase_span(self.src, token.span()),
        }
    }

    fn line_after(&self, comment: &Comment) -> usize {
        let newlines = self.src[comment.span.clone()]
            .iter()
            .filter(|&&b| b == b'\n')
            .count();
        comment.line + newlines + 1
    }

    fn close_of(&self, open: usize) -> usize {
        // match_brackets guarantees every opener is paired
        self.matching[open].unwrap_or(self.tokens.len())
    }

    fn next_code(&self, from: usize, to: usize) -> Option<usize> {
        (from..to).find(|&i| !self.tokens[i].is_comment())
    }

    fn prev_code(&self, before: usize) -> Option<usize> {
        (0..before).rev().find(|&i| !self.tokens[i].is_comment())
    }

    fn text(&self, idx: usize) -> String {
        String::from_utf8_lossy(self.tokens[idx].text(self.src)).into_owned()
    }
}

/// @ai:intent Compute the bytes to delete when removing a comment
/// @ai:effects pure
fn erase_span(src: &[u8], span: Range<usize>) -> Range<usize> {
    let is_blank = |b: &u8| matches!(b, b' ' | b'\t');
    let line_start = src[..span.start]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |p| p + 1);
    let line_end = src[span.end..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(src.len(), |p| span.end + p);

    let alone = src[line_start..span.start].iter().all(is_blank)
        && src[span.end..line_end].iter().all(|b| is_blank(b) || *b == b'\r');
    if alone {
        return line_start..(line_end + 1).min(src.len());
    }

    let mut start = span.start;
    while start > line_start && is_blank(&src[start - 1]) {
        start -= 1;
    }
    start..span.end
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(src: &str) -> SourceFile {
        parse_source(src.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_struct_fields() {
        let file = parse(
            r#"package pb

// User is a user.
type User struct {
	// @gotags: db:"id"
	Id   int64  `json:"id"`
	Name string `json:"name"` // @inject_tag: db:"name"
	a, b int
}
"#,
        );

        assert_eq!(file.package, "pb");
        assert_eq!(file.structs.len(), 1);
        let user = &file.structs[0];
        assert_eq!(user.name.as_deref(), Some("User"));
        assert_eq!(user.fields.len(), 3);

        let id = &user.fields[0];
        assert_eq!(id.names, vec!["Id"]);
        assert_eq!(id.doc.len(), 1);
        assert_eq!(id.doc[0].text, r#"// @gotags: db:"id""#);
        assert_eq!(id.tag.as_ref().unwrap().value, r#"`json:"id"`"#);
        assert_eq!(id.line, 6);

        let name = &user.fields[1];
        assert!(name.doc.is_empty());
        assert_eq!(name.trailing[0].text, r#"// @inject_tag: db:"name""#);

        let ab = &user.fields[2];
        assert_eq!(ab.names, vec!["a", "b"]);
        assert!(ab.tag.is_none());
    }

    #[test]
    fn test_tag_span_is_exact() {
        let src = "package p\ntype T struct {\n\tX int `json:\"x\"`\n}\n";
        let file = parse(src);
        let tag = file.structs[0].fields[0].tag.clone().unwrap();
        assert_eq!(&src[tag.span], "`json:\"x\"`");
    }

    #[test]
    fn test_embedded_fields_have_no_names() {
        let file = parse(
            r#"package p
type T struct {
	Base `json:"base"`
	*pkg.Other
	Generic[int] `json:"g"`
	arr [4]int `json:"arr"`
	Named pkg.Type
}
"#,
        );
        let fields = &file.structs[0].fields;
        assert!(fields[0].is_embedded());
        assert!(fields[1].is_embedded());
        assert!(fields[2].is_embedded());
        assert_eq!(fields[3].names, vec!["arr"]);
        assert_eq!(fields[4].names, vec!["Named"]);
    }

    #[test]
    fn test_blank_line_detaches_doc_comment() {
        let file = parse(
            "package p\ntype T struct {\n\t// @gotags: a:\"1\"\n\n\tX int `b:\"2\"`\n}\n",
        );
        assert!(file.structs[0].fields[0].doc.is_empty());
    }

    #[test]
    fn test_comment_on_open_brace_line_is_not_doc() {
        let file = parse("package p\ntype T struct { // @gotags: a:\"1\"\n\tX int `x:\"0\"`\n}\n");
        let field = &file.structs[0].fields[0];
        assert!(field.doc.is_empty());
        assert!(field.trailing.is_empty());
    }

    #[test]
    fn test_comment_after_semicolon_is_not_next_doc() {
        let file = parse("package p\ntype T struct {\n\tA int; /* a */\n\tB int `b:\"0\"`\n}\n");
        let fields = &file.structs[0].fields;
        assert_eq!(fields.len(), 2);
        assert!(fields[1].doc.is_empty());
    }

    #[test]
    fn test_byte_order_mark_before_package() {
        let file = parse("\u{feff}package p\ntype T struct{ X int `x:\"0\"` }\n");
        assert_eq!(file.package, "p");
        assert_eq!(file.structs[0].fields[0].tag.as_ref().unwrap().span.start, 34);
    }

    #[test]
    fn test_nested_struct_fields() {
        let file = parse(
            r#"package p
type Outer struct {
	Inner struct {
		// @gotags: a:"1"
		X int `json:"x"`
	} `json:"inner"`
	List []struct{ Y int `json:"y"` } `json:"list"`
}
"#,
        );
        let outer = &file.structs[0];
        assert_eq!(outer.fields.len(), 2);
        let inner = &outer.fields[0];
        assert_eq!(inner.names, vec!["Inner"]);
        assert_eq!(inner.tag.as_ref().unwrap().value, r#"`json:"inner"`"#);
        assert_eq!(inner.nested[0].fields[0].names, vec!["X"]);
        assert_eq!(inner.nested[0].fields[0].doc.len(), 1);
        assert_eq!(outer.fields[1].nested[0].fields[0].names, vec!["Y"]);
    }

    #[test]
    fn test_semicolon_separated_fields() {
        let file = parse("package p\nvar v struct { A int `a:\"1\"`; B int `b:\"2\"` } // @gotags: c:\"3\"\n");
        let fields = &file.structs[0].fields;
        assert_eq!(fields.len(), 2);
        assert!(file.structs[0].name.is_none());
        assert_eq!(fields[1].tag.as_ref().unwrap().value, "`b:\"2\"`");
        assert!(fields[1].trailing.is_empty());
    }

    #[test]
    fn test_type_group_names() {
        let file = parse("package p\ntype (\n\tA struct{}\n\tB struct{ X int }\n)\n");
        let names: Vec<_> = file.structs.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec![Some("A".to_string()), Some("B".to_string())]);
    }

    #[test]
    fn test_erase_span() {
        let src = b"a\n\t// x\nb // y\n";
        assert_eq!(erase_span(src, 3..7), 2..8);
        assert_eq!(erase_span(src, 10..14), 9..14);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_source(b"type T struct {}").unwrap_err().line, 1);
        let err = parse_source(b"package p\ntype T struct {\n\tX int\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("unclosed"));
        assert!(parse_source(b"package p\n}\n").is_err());
    }

    #[test]
    fn test_parse_file_reports_path() {
        let mut file = NamedTempFile::with_suffix(".go").unwrap();
        write!(file, "package p\nfunc f() {{\n").unwrap();

        match parse_file(file.path()) {
            Err(Error::Parse { path, line, .. }) => {
                assert_eq!(path, file.path());
                assert_eq!(line, 2);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
