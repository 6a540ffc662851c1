use std::cmp::Ordering;

/// A runtime value produced by evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
        }
    }

    /// `false`, `0`, `NaN`, `""` and `nil` are falsy, everything else is truthy.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(_) => true,
        }
    }

    /// Numeric reading of a value, `NaN` when there is none.
    ///
    /// Strings are trimmed first and a blank string reads as `0`. Lists read
    /// through their comma-joined text, so `[]` is `0` and `[7]` is `7`.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Nil => f64::NAN,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse().unwrap_or(f64::NAN)
                }
            }
            Value::List(_) => Value::String(self.to_string()).to_number(),
        }
    }

    /// Coercing equality used by `==`.
    ///
    /// Values of the same kind compare directly. A bool on either side turns
    /// into `1`/`0`, a number against a string compares numerically, and a
    /// list against a scalar compares through its comma-joined text. `nil`
    /// only equals `nil`.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Nil, _) | (_, Value::Nil) => false,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.loose_eq(b))
            }
            (Value::Bool(_), _) => Value::Number(self.to_number()).loose_eq(other),
            (_, Value::Bool(_)) => self.loose_eq(&Value::Number(other.to_number())),
            (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            (Value::List(_), _) => Value::String(self.to_string()).loose_eq(other),
            (_, Value::List(_)) => self.loose_eq(&Value::String(other.to_string())),
        }
    }

    /// Ordering used by `<`, `<=`, `>` and `>=`.
    ///
    /// Lists are first read as their comma-joined text. Two strings then
    /// order lexicographically; anything else orders by its numeric reading,
    /// and `None` comes back when either side is `NaN`.
    pub fn loose_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self.as_text(), other.as_text()) {
            (Value::String(a), Value::String(b)) => Some(a.cmp(&b)),
            (a, b) => a.to_number().partial_cmp(&b.to_number()),
        }
    }

    fn as_text(&self) -> Value {
        match self {
            Value::List(_) => Value::String(self.to_string()),
            other => other.clone(),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}
