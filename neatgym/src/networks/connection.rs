use std::fmt;

/// An incoming weighted edge of a phenotype node.
#[derive(Clone, Copy, PartialEq)]
pub struct Connection {
    pub source: usize,
    pub weight: f32,
}

impl Connection {
    /// Creates a new Connection coming from the
    /// specified node index with the specified weight.
    pub fn new(source: usize, weight: f32) -> Connection {
        Connection { source, weight }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.9}", self.source, self.weight)
    }
}
