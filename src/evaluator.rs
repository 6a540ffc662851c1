use std::cmp::Ordering;

use crate::{
    env::SharedEnv,
    error::RuntimeError,
    parser::{Expr, Op},
    value::Value,
};

/// Tree-walking interpreter over [`Expr`].
///
/// Nothing is cached: every evaluation re-reads variables from the
/// environment and re-invokes native functions.
#[derive(Clone)]
pub struct Evaluator {
    env: SharedEnv,
}

impl Evaluator {
    pub fn with_env(env: SharedEnv) -> Self {
        Self { env }
    }

    pub fn eval(&self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable(name) => self
                .env
                .borrow()
                .variable(name)
                .ok_or_else(|| RuntimeError::Unbound { name: name.clone() }),
            Expr::Call { name, args } => self.call(name, args),
            Expr::Chain { first, rest } => self.chain(first, rest),
        }
    }

    fn call(&self, name: &str, args: &[Expr]) -> Result<Value, RuntimeError> {
        // the borrow ends here so the function itself may touch the environment
        let function = self
            .env
            .borrow()
            .function(name)
            .ok_or_else(|| RuntimeError::Unbound {
                name: name.to_string(),
            })?;

        let values = args
            .iter()
            .map(|arg| self.eval(arg))
            .collect::<Result<Vec<_>, _>>()?;

        log::trace!("calling {}({:?})", name, values);
        function(&values)
    }

    /// Evaluates a right-grouped operator chain without recursing per operator.
    ///
    /// Comparisons wait on the value of everything to their right, so their
    /// left sides are stacked and folded once the tail is known. `&&` and `||`
    /// either decide the whole tail on the spot or hand over to it.
    fn chain(&self, first: &Expr, rest: &[(Op, Expr)]) -> Result<Value, RuntimeError> {
        let mut pending: Vec<(Value, Op)> = vec![];
        let mut current = self.eval(first)?;

        for (op, operand) in rest {
            match op {
                Op::And if !current.truthy() => break,
                Op::Or if current.truthy() => break,
                Op::And | Op::Or => current = self.eval(operand)?,
                _ => {
                    let left = std::mem::replace(&mut current, self.eval(operand)?);
                    pending.push((left, *op));
                }
            }
        }

        while let Some((left, op)) = pending.pop() {
            current = Value::Bool(compare(op, &left, &current));
        }
        Ok(current)
    }
}

fn compare(op: Op, left: &Value, right: &Value) -> bool {
    match op {
        Op::Equal => left.loose_eq(right),
        Op::Less => left.loose_cmp(right) == Some(Ordering::Less),
        Op::LessEqual => matches!(
            left.loose_cmp(right),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Op::Greater => left.loose_cmp(right) == Some(Ordering::Greater),
        Op::GreaterEqual => matches!(
            left.loose_cmp(right),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Op::And | Op::Or => false,
    }
}
