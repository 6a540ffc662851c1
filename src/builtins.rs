//! A small prelude of native functions.
//!
//! Nothing is registered unless [`install`] is called; the `merv` binary
//! installs these so expressions typed at the command line have something to
//! call.

use crate::{env::Environment, error::RuntimeError, value::Value};

pub fn install(env: &mut Environment) {
    env.define_function("not", |args| {
        expect_arity("not", args, 1)?;
        Ok(Value::Bool(!args[0].truthy()))
    });
    env.define_function("contains", contains);
    env.define_function("len", len);
    env.define_function("any", |args| {
        Ok(Value::Bool(args.iter().any(Value::truthy)))
    });
    env.define_function("all", |args| {
        Ok(Value::Bool(args.iter().all(Value::truthy)))
    });
    env.define_function("list", |args| Ok(Value::List(args.to_vec())));
}

fn expect_arity(function: &str, args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::Arity {
            function: function.to_string(),
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

/// Membership for lists (exact equality, no coercion), substring search
/// for strings.
fn contains(args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("contains", args, 2)?;
    match &args[0] {
        Value::List(items) => Ok(Value::Bool(items.contains(&args[1]))),
        Value::String(haystack) => Ok(Value::Bool(haystack.contains(&args[1].to_string()))),
        other => Err(RuntimeError::Type {
            function: "contains".to_string(),
            expected: "a list or a string",
            found: other.type_name(),
        }),
    }
}

fn len(args: &[Value]) -> Result<Value, RuntimeError> {
    expect_arity("len", args, 1)?;
    match &args[0] {
        Value::List(items) => Ok(Value::Number(items.len() as f64)),
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        other => Err(RuntimeError::Type {
            function: "len".to_string(),
            expected: "a list or a string",
            found: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn eval(input: &str) -> Result<Value, RuntimeError> {
        let mut env = Environment::new();
        install(&mut env);
        env.define_variable("words", vec!["hello", "world"]);
        env.define_variable("greeting", "hello world");
        parse(input, &env.shared()).unwrap().call()
    }

    #[test]
    fn test_not() {
        assert_eq!(eval("not(false)"), Ok(Value::Bool(true)));
        assert_eq!(eval("not(words)"), Ok(Value::Bool(false)));
        assert_eq!(
            eval("not(true, false)"),
            Err(RuntimeError::Arity {
                function: "not".to_string(),
                expected: 1,
                found: 2,
            })
        );
    }

    #[test]
    fn test_contains() {
        assert_eq!(eval(r#"contains(words, "world")"#), Ok(Value::Bool(true)));
        assert_eq!(eval(r#"contains(words, "there")"#), Ok(Value::Bool(false)));
        assert_eq!(eval(r#"contains(greeting, "lo w")"#), Ok(Value::Bool(true)));
        assert_eq!(eval("contains(list(1, 2), 2)"), Ok(Value::Bool(true)));
        assert_eq!(eval("contains(list(1, 2), \"2\")"), Ok(Value::Bool(false)));
        assert_eq!(eval("contains(list(true), 1)"), Ok(Value::Bool(false)));
        assert_eq!(
            eval("contains(true, 1)"),
            Err(RuntimeError::Type {
                function: "contains".to_string(),
                expected: "a list or a string",
                found: "bool",
            })
        );
    }

    #[test]
    fn test_len() {
        assert_eq!(eval("len(words) == 2"), Ok(Value::Bool(true)));
        assert_eq!(eval("len(greeting)"), Ok(Value::Number(11.0)));
    }

    #[test]
    fn test_any_all() {
        assert_eq!(eval("any(false, 0, \"x\")"), Ok(Value::Bool(true)));
        assert_eq!(eval("all(true, 1, \"\")"), Ok(Value::Bool(false)));
        assert_eq!(eval("all()"), Ok(Value::Bool(true)));
    }
}
