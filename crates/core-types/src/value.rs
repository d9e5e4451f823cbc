use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single scalar value carried by a parameter or an observation field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    /// The numeric view of the value. Integers and booleans widen to `f64`,
    /// text has no numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(v) => Some(*v as f64),
            Scalar::Float(v) => Some(*v),
            Scalar::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Scalar::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(v) => write!(f, "{}", v),
            // `{:?}` keeps the fractional part on whole floats (`2.0`, not `2`).
            Scalar::Float(v) => write!(f, "{:?}", v),
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<usize> for Scalar {
    fn from(v: usize) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Scalar::Bool(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

/// The value a caller supplies for one schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Scalar(Scalar),
    /// Flattened into `name0, name1, ...` when the record is built.
    Sequence(Vec<Scalar>),
}

impl FieldValue {
    /// Appends the `(name, value)` pairs this field contributes to a record.
    pub fn flatten_into(&self, name: &str, out: &mut Vec<(String, Scalar)>) {
        match self {
            FieldValue::Scalar(value) => out.push((name.to_string(), value.clone())),
            FieldValue::Sequence(values) => {
                for (i, value) in values.iter().enumerate() {
                    out.push((format!("{}{}", name, i), value.clone()));
                }
            }
        }
    }
}

macro_rules! field_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    FieldValue::Scalar(v.into())
                }
            }

            impl From<Vec<$t>> for FieldValue {
                fn from(v: Vec<$t>) -> Self {
                    FieldValue::Sequence(v.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

field_value_from!(i64, i32, usize, f64, bool, &str, String);

impl From<Scalar> for FieldValue {
    fn from(v: Scalar) -> Self {
        FieldValue::Scalar(v)
    }
}

impl From<Vec<Scalar>> for FieldValue {
    fn from(v: Vec<Scalar>) -> Self {
        FieldValue::Sequence(v)
    }
}

/// The data handed to `Report::observation`, either keyed by field name or
/// matched positionally against the stream's schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ObservationInput {
    Mapping(HashMap<String, FieldValue>),
    Positional(Vec<FieldValue>),
}

impl ObservationInput {
    /// Builds a `Mapping` input from `(name, value)` pairs.
    pub fn mapping<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        ObservationInput::Mapping(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds a `Positional` input from values in schema order.
    pub fn positional<V, I>(values: I) -> Self
    where
        V: Into<FieldValue>,
        I: IntoIterator<Item = V>,
    {
        ObservationInput::Positional(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_display_keeps_fraction() {
        assert_eq!(Scalar::Float(2.0).to_string(), "2.0");
        assert_eq!(Scalar::Float(0.25).to_string(), "0.25");
        assert_eq!(Scalar::Int(7).to_string(), "7");
        assert_eq!(Scalar::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(Scalar::Int(3).as_f64(), Some(3.0));
        assert_eq!(Scalar::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Scalar::Text("x".into()).as_f64(), None);
    }

    #[test]
    fn test_sequence_flattening() {
        let mut out = Vec::new();
        FieldValue::from(vec![1.5, 2.5]).flatten_into("w", &mut out);
        FieldValue::from(3).flatten_into("n", &mut out);
        let names: Vec<&str> = out.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["w0", "w1", "n"]);
        assert_eq!(out[1].1, Scalar::Float(2.5));
    }

    #[test]
    fn test_scalar_deserializes_untagged() {
        let values: Vec<Scalar> = serde_json::from_str(r#"[1, 0.5, true, "a"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                Scalar::Int(1),
                Scalar::Float(0.5),
                Scalar::Bool(true),
                Scalar::Text("a".into())
            ]
        );
    }
}
