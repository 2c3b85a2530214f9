//! Parsing one annotation candidate as a call expression.

use swc_common::{BytePos, GLOBALS, Globals, Span, Spanned};
use swc_ecma_ast::{Callee, Expr, ExprOrSpread, MemberProp};
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

use super::literal::{self, LiteralError};
use crate::core::annotation::Literal;

/// The name and arguments of a parsed annotation, before anchoring.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationCall {
    pub name: String,
    pub args: Vec<CallArgument>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallArgument {
    Literal(Literal),
    /// A dotted identifier path; `offset` is its byte offset in the call text.
    Reference { path: Vec<String>, offset: usize },
}

/// A failure at `offset` bytes into the call text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct CallError {
    pub offset: usize,
    pub message: String,
}

/// Parse `text` as `Name(arg, ...)`. `base` is the absolute position of the
/// first byte of `text`, so every span the parser produces is a real position.
pub(super) fn parse_call(text: &str, base: BytePos) -> Result<AnnotationCall, CallError> {
    let parser = CallParser { text, base };
    GLOBALS.set(&Globals::new(), || parser.parse())
}

struct CallParser<'a> {
    text: &'a str,
    base: BytePos,
}

impl CallParser<'_> {
    fn parse(&self) -> Result<AnnotationCall, CallError> {
        let hi = self.base + BytePos(self.text.len() as u32);
        let mut parser = Parser::new(
            Syntax::Typescript(TsSyntax::default()),
            StringInput::new(self.text, self.base, hi),
            None,
        );

        let expr = parser
            .parse_expr()
            .map_err(|err| self.error(err.span().lo, err.kind().msg()))?;
        if let Some(err) = parser.take_errors().into_iter().next() {
            return Err(self.error(err.span().lo, err.kind().msg()));
        }

        self.check_trailing(expr.span().hi)?;
        self.call(&expr)
    }

    /// Only whitespace or a comment may follow the call.
    fn check_trailing(&self, hi: BytePos) -> Result<(), CallError> {
        let end = self.offset(hi);
        let rest = self.text.get(end..).unwrap_or_default();
        let trimmed = rest.trim_start();
        if trimmed.is_empty() || trimmed.starts_with("//") || trimmed.starts_with("/*") {
            return Ok(());
        }
        Err(CallError {
            offset: end + (rest.len() - trimmed.len()),
            message: format!("unexpected {:?} after call", trimmed.trim_end()),
        })
    }

    fn call(&self, expr: &Expr) -> Result<AnnotationCall, CallError> {
        let Expr::Call(call) = expr else {
            return Err(self.error(
                expr.span().lo,
                format!("not a func call, instead {}", expr_kind(expr)),
            ));
        };

        let name = match &call.callee {
            Callee::Expr(callee) => dotted_path(callee).map(|path| path.join(".")),
            _ => None,
        };
        let Some(name) = name else {
            let span = call.callee.span();
            return Err(self.error(span.lo, format!("unsupported callee \"{}\"", self.slice(span))));
        };

        if let Some(type_args) = &call.type_args {
            return Err(self.unsupported(type_args.span));
        }

        let args = call
            .args
            .iter()
            .map(|arg| self.argument(arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AnnotationCall { name, args })
    }

    fn argument(&self, arg: &ExprOrSpread) -> Result<CallArgument, CallError> {
        if let Some(spread) = arg.spread {
            return Err(self.unsupported(Span::new(spread.lo, arg.expr.span().hi)));
        }

        match &*arg.expr {
            expr @ (Expr::Ident(_) | Expr::Member(_)) => {
                let mut path = Vec::new();
                self.collect_path(expr, expr, &mut path)?;
                Ok(CallArgument::Reference {
                    path,
                    offset: self.offset(expr.span().lo),
                })
            }
            expr @ (Expr::Lit(_) | Expr::Unary(_)) => literal::evaluate(expr)
                .map(CallArgument::Literal)
                .map_err(|err| self.literal_error(err)),
            other => Err(self.unsupported(other.span())),
        }
    }

    fn collect_path(&self, whole: &Expr, expr: &Expr, path: &mut Vec<String>) -> Result<(), CallError> {
        match expr {
            Expr::Ident(ident) => {
                path.push(ident.sym.to_string());
                Ok(())
            }
            Expr::Member(member) => {
                self.collect_path(whole, &member.obj, path)?;
                match &member.prop {
                    MemberProp::Ident(prop) => {
                        path.push(prop.sym.to_string());
                        Ok(())
                    }
                    MemberProp::Computed(computed) => {
                        Err(self.unsupported_in_reference("computed member access", computed.span, whole))
                    }
                    MemberProp::PrivateName(private) => {
                        Err(self.unsupported_in_reference("private name", private.span, whole))
                    }
                }
            }
            other => Err(self.unsupported_in_reference(expr_kind(other), other.span(), whole)),
        }
    }

    fn literal_error(&self, err: LiteralError) -> CallError {
        match err {
            LiteralError::Unsupported(span) => {
                self.error(span.lo, format!("unsupported literal \"{}\"", self.slice(span)))
            }
            LiteralError::NegatedString(span) => {
                self.error(span.lo, format!("cannot negate string literal \"{}\"", self.slice(span)))
            }
            LiteralError::UnaryOperator(span, op) => {
                self.error(span.lo, format!("unsupported unary operator \"{op}\""))
            }
            LiteralError::NotLiteral(span) => self.unsupported(span),
            LiteralError::InvalidNumber(span, reason) => self.error(
                span.lo,
                format!("invalid number literal \"{}\": {}", self.slice(span), reason),
            ),
        }
    }

    fn unsupported(&self, span: Span) -> CallError {
        self.error(span.lo, format!("unsupported syntax \"{}\"", self.slice(span)))
    }

    fn unsupported_in_reference(&self, kind: &str, span: Span, whole: &Expr) -> CallError {
        self.error(
            span.lo,
            format!("unsupported syntax {} in reference \"{}\"", kind, self.slice(whole.span())),
        )
    }

    fn error(&self, pos: BytePos, message: impl Into<String>) -> CallError {
        CallError {
            offset: self.offset(pos),
            message: message.into(),
        }
    }

    fn offset(&self, pos: BytePos) -> usize {
        (pos.0.saturating_sub(self.base.0) as usize).min(self.text.len())
    }

    fn slice(&self, span: Span) -> &str {
        self.text
            .get(self.offset(span.lo)..self.offset(span.hi))
            .unwrap_or(self.text)
    }
}

/// `a.b.c` as segments, for plain identifier/member chains only.
fn dotted_path(expr: &Expr) -> Option<Vec<String>> {
    match expr {
        Expr::Ident(ident) => Some(vec![ident.sym.to_string()]),
        Expr::Member(member) => {
            let MemberProp::Ident(prop) = &member.prop else {
                return None;
            };
            let mut path = dotted_path(&member.obj)?;
            path.push(prop.sym.to_string());
            Some(path)
        }
        _ => None,
    }
}

fn expr_kind(expr: &Expr) -> &'static str {
    match expr {
        Expr::This(_) => "this expression",
        Expr::Array(_) => "array literal",
        Expr::Object(_) => "object literal",
        Expr::Fn(_) => "function expression",
        Expr::Unary(_) => "unary expression",
        Expr::Update(_) => "update expression",
        Expr::Bin(_) => "binary expression",
        Expr::Assign(_) => "assignment expression",
        Expr::Member(_) => "member expression",
        Expr::SuperProp(_) => "super property",
        Expr::Cond(_) => "conditional expression",
        Expr::Call(_) => "call expression",
        Expr::New(_) => "new expression",
        Expr::Seq(_) => "sequence expression",
        Expr::Ident(_) => "identifier",
        Expr::Lit(_) => "literal",
        Expr::Tpl(_) => "template literal",
        Expr::TaggedTpl(_) => "tagged template",
        Expr::Arrow(_) => "arrow function",
        Expr::Class(_) => "class expression",
        Expr::Await(_) => "await expression",
        Expr::Paren(_) => "parenthesized expression",
        Expr::OptChain(_) => "optional chain",
        Expr::TsAs(_) | Expr::TsTypeAssertion(_) | Expr::TsSatisfies(_) => "type assertion",
        Expr::TsNonNull(_) => "non-null assertion",
        _ => "expression",
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::core::annotation::Literal;
    use crate::core::parse::{AnnotationCall, CallArgument, parse_annotation_text};

    fn reference(path: &[&str], offset: usize) -> CallArgument {
        CallArgument::Reference {
            path: path.iter().map(|s| s.to_string()).collect(),
            offset,
        }
    }

    #[test]
    fn test_no_arguments() {
        assert_eq!(
            parse_annotation_text("OnType()").unwrap(),
            AnnotationCall {
                name: "OnType".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_dotted_name_is_kept_whole() {
        let call = parse_annotation_text("Group.Member(1)").unwrap();
        assert_eq!(call.name, "Group.Member");
        assert_eq!(call.args, vec![CallArgument::Literal(Literal::Int(1))]);
    }

    #[test]
    fn test_reference_arguments_keep_order_and_offsets() {
        let call = parse_annotation_text("LocalRefs(Thing, Thing.greeting)").unwrap();
        assert_eq!(
            call.args,
            vec![reference(&["Thing"], 10), reference(&["Thing", "greeting"], 17)]
        );
    }

    #[test]
    fn test_trailing_comment_is_ignored() {
        let call = parse_annotation_text("Tagged(\"x\") // why").unwrap();
        assert_eq!(call.name, "Tagged");
    }

    #[test]
    fn test_not_a_call() {
        let err = parse_annotation_text("NotACall.Foo.Bar + 1").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"bad annotation "NotACall.Foo.Bar + 1": not a func call, instead binary expression"#
        );
    }

    #[test]
    fn test_syntax_error_is_surfaced() {
        let err = parse_annotation_text("BadCallSyntax(foo bar)").unwrap_err();
        assert_eq!(err.text, "BadCallSyntax(foo bar)");
        assert_eq!(err.message, "Expected ',', got 'ident'");
    }

    #[test]
    fn test_unsupported_argument_syntax_names_the_text() {
        let err = parse_annotation_text("BadCallMath(1 + 1)").unwrap_err();
        assert_eq!(err.message, r#"unsupported syntax "1 + 1""#);

        let err = parse_annotation_text("BadCallFn(-555, Foo.Bar())").unwrap_err();
        assert_eq!(err.message, r#"unsupported syntax "Foo.Bar()""#);

        let err = parse_annotation_text("Spread(...xs)").unwrap_err();
        assert_eq!(err.message, r#"unsupported syntax "...xs""#);
    }

    #[test]
    fn test_unsupported_node_inside_reference() {
        let err = parse_annotation_text("Ref(a.b().c)").unwrap_err();
        assert_eq!(err.message, r#"unsupported syntax call expression in reference "a.b().c""#);

        let err = parse_annotation_text("Ref(a[0])").unwrap_err();
        assert_eq!(err.message, r#"unsupported syntax computed member access in reference "a[0]""#);
    }

    #[test]
    fn test_unsupported_callee() {
        let err = parse_annotation_text("a[0]()").unwrap_err();
        assert_eq!(err.message, r#"unsupported callee "a[0]""#);
    }

    #[test]
    fn test_trailing_text_is_rejected() {
        let err = parse_annotation_text("Foo() bar").unwrap_err();
        assert_eq!(err.message, r#"unexpected "bar" after call"#);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let text = r#"Mixed("a", 1, -2.5, a.b)"#;
        assert_eq!(parse_annotation_text(text), parse_annotation_text(text));
    }
}
