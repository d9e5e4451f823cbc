use crate::value::Scalar;

/// A merged observation: the current parameter values followed by the stream's
/// own (flattened) fields, in the order writers receive them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Scalar)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: Scalar) {
        self.fields.push((name.into(), value));
    }

    /// Looks a field up by name. This is the mapping view of the record that
    /// derivation hooks consume; if a name repeats, the later entry wins.
    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.fields
            .iter()
            .rev()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Scalar> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Extend<(String, Scalar)> for Record {
    fn extend<T: IntoIterator<Item = (String, Scalar)>>(&mut self, iter: T) {
        self.fields.extend(iter);
    }
}

impl FromIterator<(String, Scalar)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Scalar)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
