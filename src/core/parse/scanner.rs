//! Finding annotation candidates in doc comments.
//!
//! Line comments carry at most one annotation, right after the `//` and
//! optional blanks. Block comments carry one per physical line that starts
//! with `@`; the line holding the opening `/*` never counts.

use std::sync::LazyLock;

use regex::Regex;
use swc_common::{
    BytePos,
    comments::{Comment, CommentKind},
};

use super::{ParseError, call::parse_call};
use crate::core::{
    annotation::{Annotation, Argument, SymbolReference},
    parse::CallArgument,
    source::{Declaration, SourceModel},
};

static LINE_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t]*@").unwrap());
static BLOCK_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^@").unwrap());

/// TypeScript compiler pragmas (`// @ts-ignore`) are not annotations.
const PRAGMA_PREFIX: &str = "ts-";

/// Call text following a marker, with the absolute position of its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Candidate<'a> {
    pub text: &'a str,
    pub pos: BytePos,
}

pub(super) fn candidates(comment: &Comment) -> Vec<Candidate<'_>> {
    let text: &str = &comment.text;
    // `comment.text` starts after the `//` or `/*`.
    let start = comment.span.lo + BytePos(2);

    let found: Vec<Candidate<'_>> = match comment.kind {
        CommentKind::Line => LINE_MARKER
            .find(text)
            .map(|m| candidate(text, m.end(), start))
            .into_iter()
            .collect(),
        CommentKind::Block => BLOCK_MARKER
            .find_iter(text)
            .filter(|m| m.start() > 0)
            .map(|m| candidate(text, m.end(), start))
            .collect(),
    };
    found
        .into_iter()
        .filter(|candidate| !candidate.text.starts_with(PRAGMA_PREFIX))
        .collect()
}

fn candidate(text: &str, from: usize, start: BytePos) -> Candidate<'_> {
    let rest = &text[from..];
    let line = rest.find('\n').map_or(rest, |end| &rest[..end]);
    Candidate {
        text: line.trim_end(),
        pos: start + BytePos(from as u32),
    }
}

/// Annotations and parse errors for a whole model or a single declaration.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Scanned {
    pub annotations: Vec<Annotation>,
    pub errors: Vec<ParseError>,
}

/// Scan every declaration of the model, in model order.
pub fn scan(model: &SourceModel) -> Scanned {
    let mut scanned = Scanned::default();
    for decl in model.declarations() {
        scan_declaration(model, decl, &mut scanned);
    }
    tracing::debug!(
        annotations = scanned.annotations.len(),
        errors = scanned.errors.len(),
        "scanned doc comments"
    );
    scanned
}

/// Scan one declaration's doc comment. A declaration without one yields nothing.
pub fn scan_declaration(model: &SourceModel, decl: &Declaration, out: &mut Scanned) {
    for comment in &decl.doc {
        for candidate in candidates(comment) {
            match parse_call(candidate.text, candidate.pos) {
                Ok(call) => {
                    let args = call
                        .args
                        .into_iter()
                        .map(|arg| match arg {
                            CallArgument::Literal(literal) => Argument::Literal(literal),
                            CallArgument::Reference { path, offset } => {
                                let location = model.location(candidate.pos + BytePos(offset as u32));
                                Argument::Reference(SymbolReference::new(path, decl.id, location))
                            }
                        })
                        .collect();
                    out.annotations.push(Annotation {
                        name: call.name,
                        args,
                        anchor: decl.id,
                        location: model.location(candidate.pos),
                        text: candidate.text.to_string(),
                    });
                }
                Err(err) => {
                    let location = model.location(candidate.pos + BytePos(err.offset as u32));
                    tracing::debug!(%location, text = candidate.text, "malformed annotation");
                    out.errors.push(ParseError {
                        location: Some(location),
                        text: candidate.text.to_string(),
                        message: err.message,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use swc_common::{
        BytePos, Span,
        comments::{Comment, CommentKind},
    };

    use crate::core::fixtures;
    use crate::core::parse::scanner::candidates;

    fn comment(kind: CommentKind, text: &str) -> Comment {
        Comment {
            kind,
            span: Span::new(BytePos(100), BytePos(100 + text.len() as u32 + 4)),
            text: text.into(),
        }
    }

    fn texts(comment: &Comment) -> Vec<&str> {
        candidates(comment).iter().map(|c| c.text).collect()
    }

    #[test]
    fn test_line_comment_with_and_without_space() {
        assert_eq!(texts(&comment(CommentKind::Line, " @OnType()")), vec!["OnType()"]);
        assert_eq!(texts(&comment(CommentKind::Line, "@OnType()")), vec!["OnType()"]);
        assert_eq!(texts(&comment(CommentKind::Line, "\t @OnType()  ")), vec!["OnType()"]);
    }

    #[test]
    fn test_line_comment_position_points_after_marker() {
        let line = comment(CommentKind::Line, " @OnType()");
        let found = candidates(&line);
        // `//` + ` @` puts the call text four bytes in.
        assert_eq!(found[0].pos, BytePos(104));
    }

    #[test]
    fn test_line_comment_marker_must_lead() {
        assert!(texts(&comment(CommentKind::Line, " mail me @ home")).is_empty());
        assert!(texts(&comment(CommentKind::Line, "/ @Triple()")).is_empty());
    }

    #[test]
    fn test_block_comment_one_per_line() {
        let c = comment(CommentKind::Block, "\n@First(1)\n  @NotLeading()\n@Second(\"x\")\r\n");
        assert_eq!(texts(&c), vec!["First(1)", "Second(\"x\")"]);
    }

    #[test]
    fn test_block_comment_opening_line_never_counts() {
        assert!(texts(&comment(CommentKind::Block, "@Inline()")).is_empty());
    }

    #[test]
    fn test_typescript_pragmas_are_skipped() {
        assert!(texts(&comment(CommentKind::Line, " @ts-ignore")).is_empty());
        assert!(texts(&comment(CommentKind::Line, " @ts-expect-error missing types")).is_empty());
    }

    #[test]
    fn test_fixture_parse_errors_are_located() {
        let (_, scanned) = fixtures::scanned();
        let errors: Vec<String> = scanned.errors.iter().map(|err| err.to_string()).collect();
        assert_eq!(
            errors,
            vec![
                "src/annotations.ts:67:5: NotACall.Foo.Bar + 1: not a func call, instead binary expression",
                "src/annotations.ts:68:23: BadCallSyntax(foo bar): Expected ',', got 'ident'",
                r#"src/annotations.ts:69:17: BadCallMath(1 + 1): unsupported syntax "1 + 1""#,
                r#"src/annotations.ts:70:21: BadCallFn(-555, Foo.Bar()): unsupported syntax "Foo.Bar()""#,
            ]
        );
    }
}
