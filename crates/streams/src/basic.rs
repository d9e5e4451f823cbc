use crate::DataStream;

/// A plain stream: a schema and nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicStream {
    scheme: Vec<String>,
}

impl BasicStream {
    pub fn new<I, S>(scheme: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scheme: scheme.into_iter().map(Into::into).collect(),
        }
    }
}

impl DataStream for BasicStream {
    fn scheme(&self) -> &[String] {
        &self.scheme
    }
}
