//! The annotation micro-parser.
//!
//! Candidates are pulled out of doc comments by the [`scanner`] and parsed as
//! TypeScript call expressions with `swc_ecma_parser`, then each argument is
//! checked against the small grammar annotations allow: literals and dotted
//! identifier paths.

mod call;
mod literal;
mod scanner;

use std::fmt;

use swc_common::BytePos;

pub use call::{AnnotationCall, CallArgument};
pub use scanner::{Scanned, scan, scan_declaration};

use crate::diagnostics::{Diagnostic, Location, Stage};

/// Position used for text parsed without a source model.
const STANDALONE_BASE: BytePos = BytePos(1);

/// A malformed annotation. Never fatal: scanning continues with the next
/// candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Real source location of the problem; `None` for standalone text.
    pub location: Option<Location>,
    /// The whole candidate text.
    pub text: String,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{}: {}: {}", location, self.text, self.message),
            None => write!(f, "bad annotation {:?}: {}", self.text, self.message),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for Diagnostic {
    fn from(err: ParseError) -> Self {
        let message = format!("{}: {}", err.text, err.message);
        Diagnostic::error(Stage::Parse, err.location, message)
    }
}

/// Parse annotation text that did not come from a source model, such as
/// `OnType()` or `@Literals("a", 1)`.
pub fn parse_annotation_text(text: &str) -> Result<AnnotationCall, ParseError> {
    let text = text.trim();
    let text = text.strip_prefix('@').unwrap_or(text);
    call::parse_call(text, STANDALONE_BASE).map_err(|err| ParseError {
        location: None,
        text: text.to_string(),
        message: err.message,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::core::parse::*;

    #[test]
    fn test_marker_is_optional_for_standalone_text() {
        assert_eq!(
            parse_annotation_text("@OnType()").unwrap(),
            parse_annotation_text("OnType()").unwrap()
        );
    }

    #[test]
    fn test_located_error_display() {
        let err = ParseError {
            location: Some(Location::new("src/annotations.ts", 67, 17)),
            text: "BadCallMath(1 + 1)".to_string(),
            message: r#"unsupported syntax "1 + 1""#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"src/annotations.ts:67:17: BadCallMath(1 + 1): unsupported syntax "1 + 1""#
        );

        let diag = Diagnostic::from(err.clone());
        assert_eq!(diag.to_string(), err.to_string());
        assert_eq!(diag.stage, Stage::Parse);
    }
}
