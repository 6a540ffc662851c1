use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Failures raised while turning source text into an expression tree.
#[derive(Diagnostic, Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected \"=\" at character {position}")]
    #[diagnostic(help("equality is written `==`, there is no assignment"))]
    UnexpectedCharacter {
        position: usize,
        #[label("this `=` is not followed by another `=`")]
        span: SourceSpan,
    },
    #[error("unterminated string")]
    UnterminatedString {
        #[label("this string literal")]
        span: SourceSpan,
    },
    #[error("empty input")]
    #[diagnostic(help("write an expression such as `ready && count == 3`"))]
    EmptyInput,
    #[error("unparsable expression")]
    UnparsableExpression {
        #[label("expected a value here")]
        span: SourceSpan,
    },
    #[error("expected value or function but got \"{token}\" at location {position}")]
    UnexpectedToken {
        token: String,
        position: usize,
        #[label("here")]
        span: SourceSpan,
    },
    #[error("expected \"(\" after function `{name}`")]
    ExpectedOpenParen {
        name: String,
        #[label("called here")]
        span: SourceSpan,
    },
    #[error("expressions nest deeper than {limit} levels")]
    NestedTooDeep {
        limit: usize,
        #[label("too deep from here")]
        span: SourceSpan,
    },
    #[error("expected \")\" before end of program")]
    ExpectedCloseParen {
        #[label("never closed")]
        span: SourceSpan,
    },
}

/// Failures raised while evaluating an expression tree.
///
/// Native functions report their own failures through this type too, and the
/// evaluator hands them back to the caller untouched.
#[derive(Diagnostic, Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("`{name}` is not bound in the environment")]
    Unbound { name: String },
    #[error("`{function}` expects {expected} argument(s), got {found}")]
    Arity {
        function: String,
        expected: usize,
        found: usize,
    },
    #[error("`{function}` expects {expected}, got {found}")]
    Type {
        function: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{0}")]
    Custom(String),
}

impl RuntimeError {
    pub fn custom(message: impl Into<String>) -> Self {
        RuntimeError::Custom(message.into())
    }
}
