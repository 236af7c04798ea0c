//! Defines [`Value`], the value model shared by front matter and templates,
//! and the [`Context`] mapping that templates are rendered against.

use std::collections::BTreeMap;
use std::fmt;

/// A flat mapping of names to [`Value`]s. A [`BTreeMap`] keeps iteration order
/// stable, which keeps anything derived from a context deterministic.
pub type Context = BTreeMap<String, Value>;

/// A scalar or a list of scalars.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
}

impl Value {
    /// Reports whether the value counts as "true" for `{{#if}}` blocks: a
    /// non-empty string, a non-zero number, `true`, or a non-empty list.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    /// Writes the value's string form, which is what interpolation inserts.
    /// Lists are joined with `, `.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => Ok(()),
            Value::Bool(b) => fmt::Display::fmt(b, f),
            Value::Integer(i) => fmt::Display::fmt(i, f),
            Value::Float(x) => fmt::Display::fmt(x, f),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt::Display::fmt(item, f)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Value {
        Value::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Integer(i)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Value {
        match i64::try_from(n) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Float(n as f64),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Value {
        match opt {
            Some(v) => v.into(),
            None => Value::Nil,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Value {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<&[String]> for Value {
    fn from(items: &[String]) -> Value {
        Value::List(items.iter().map(Value::from).collect())
    }
}

impl From<serde_yaml::Value> for Value {
    /// Converts parsed YAML into a [`Value`]. Nested mappings have no
    /// representation and become [`Value::Nil`]; tags are dropped.
    fn from(yaml: serde_yaml::Value) -> Value {
        use serde_yaml::Value as Yaml;
        match yaml {
            Yaml::Null => Value::Nil,
            Yaml::Bool(b) => Value::Bool(b),
            Yaml::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Nil, Value::Float),
            },
            Yaml::String(s) => Value::String(s),
            Yaml::Sequence(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Yaml::Mapping(_) => Value::Nil,
            Yaml::Tagged(tagged) => Value::from(tagged.value),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Integer(-1).is_truthy());
        assert!(!Value::Float(f64::NAN).is_truthy());
        assert!(!Value::List(Vec::new()).is_truthy());
        assert!(Value::from(vec![1i64]).is_truthy());
        assert!(!Value::Bool(false).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Integer(2).to_string(), "2");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Nil.to_string(), "");
        assert_eq!(
            Value::from(vec!["rust", "blogging"]).to_string(),
            "rust, blogging"
        );
    }

    #[test]
    fn test_from_yaml() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str("[1, 2.5, true, ~, hello, {a: b}]").unwrap();
        assert_eq!(
            Value::from(yaml),
            Value::List(vec![
                Value::Integer(1),
                Value::Float(2.5),
                Value::Bool(true),
                Value::Nil,
                Value::from("hello"),
                Value::Nil,
            ])
        );
    }
}
