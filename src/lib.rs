pub mod builtins;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod value;

pub use env::{Environment, NativeFunction, SharedEnv};
pub use error::{ParseError, RuntimeError};
pub use lexer::*;
pub use value::Value;

use evaluator::Evaluator;
use parser::{Expr, Parser};

/// A parsed expression bound to the environment it was parsed against.
///
/// Each [`Thunk::call`] evaluates the whole tree again, so it sees the
/// current variable bindings and re-runs every native function.
#[derive(Clone)]
pub struct Thunk {
    expr: Expr,
    evaluator: Evaluator,
}

impl Thunk {
    pub fn call(&self) -> Result<Value, RuntimeError> {
        self.evaluator.eval(&self.expr)
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl std::fmt::Debug for Thunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Thunk").field(&self.expr).finish()
    }
}

/// Tokenizes and parses `source`, resolving names against `env`.
pub fn parse(source: &str, env: &SharedEnv) -> Result<Thunk, ParseError> {
    let expr = Parser::new(source, &env.borrow()).parse()?;
    Ok(Thunk {
        expr,
        evaluator: Evaluator::with_env(env.clone()),
    })
}
