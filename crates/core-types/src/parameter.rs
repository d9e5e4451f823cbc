use crate::value::Scalar;

/// A named piece of experiment state (e.g. the current run index) whose current
/// value is stamped onto every observation.
///
/// The default is fixed at construction; `reset` restores it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    value: Scalar,
    default: Scalar,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            default: value.clone(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Scalar {
        &self.value
    }

    pub fn default_value(&self) -> &Scalar {
        &self.default
    }

    /// Overwrites the current value. No type check is made against the default.
    pub fn set_value(&mut self, value: impl Into<Scalar>) {
        self.value = value.into();
    }

    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_restores_default() {
        let mut param = Parameter::new("Run", 1);
        param.set_value(5);
        assert_eq!(param.value(), &Scalar::Int(5));
        assert_eq!(param.default_value(), &Scalar::Int(1));

        param.reset();
        assert_eq!(param.value(), &Scalar::Int(1));
    }

    #[test]
    fn test_set_value_accepts_other_types() {
        let mut param = Parameter::new("alpha", 0.5);
        param.set_value("off");
        assert_eq!(param.value(), &Scalar::Text("off".into()));
    }
}
