use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{error::RuntimeError, value::Value};

/// A callable registered by the embedder, invoked with evaluated arguments.
pub type NativeFunction = Rc<dyn Fn(&[Value]) -> Result<Value, RuntimeError>>;

/// An environment shared between the caller and the thunks built from it.
pub type SharedEnv = Rc<RefCell<Environment>>;

/// Variable and function bindings an expression is parsed and evaluated against.
#[derive(Clone, Default)]
pub struct Environment {
    variables: HashMap<String, Value>,
    functions: HashMap<String, NativeFunction>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(self) -> SharedEnv {
        Rc::new(RefCell::new(self))
    }

    pub fn define_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn define_function<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> Result<Value, RuntimeError> + 'static,
    {
        self.functions.insert(name.into(), Rc::new(function));
    }

    /// Removes a binding of either kind, returning whether anything was bound.
    pub fn undefine(&mut self, name: &str) -> bool {
        let variable = self.variables.remove(name).is_some();
        let function = self.functions.remove(name).is_some();
        variable || function
    }

    pub fn variable(&self, name: &str) -> Option<Value> {
        self.variables.get(name).cloned()
    }

    pub fn function(&self, name: &str) -> Option<NativeFunction> {
        self.functions.get(name).cloned()
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut functions: Vec<_> = self.functions.keys().collect();
        functions.sort();
        f.debug_struct("Environment")
            .field("variables", &self.variables)
            .field("functions", &functions)
            .finish()
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.variables.keys().collect();
        names.sort();
        for name in names {
            writeln!(f, "{} = {}", name, self.variables[name])?;
        }

        let mut names: Vec<_> = self.functions.keys().collect();
        names.sort();
        for name in names {
            writeln!(f, "{}(..)", name)?;
        }
        Ok(())
    }
}
