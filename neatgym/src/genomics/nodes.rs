use super::GeneValidityError;
use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fmt;

/// A NodeKind indicates the function of
/// the node's network equivalent.
///
/// Only sensors accept external input, and
/// sensors can never be the target of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Input nodes.
    Sensor,
    /// Hidden nodes.
    Hidden,
    /// Output nodes.
    Output,
}

/// Node genes are the structural elements of genomes
/// between which connections are created.
///
/// Besides its id and kind, a node keeps track of the
/// innovation numbers of the connections entering and
/// leaving it. This adjacency is derived data: it is
/// rebuilt whenever connections are added to a genome.
#[derive(Clone, Debug, Eq)]
pub struct NodeGene {
    id: Innovation,
    kind: NodeKind,
    inputs: HashSet<Innovation, RandomState>,
    outputs: HashSet<Innovation, RandomState>,
}

impl NodeGene {
    /// Generate a new node with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{NodeGene, NodeKind};
    ///
    /// let node = NodeGene::new(5, NodeKind::Hidden);
    /// ```
    pub fn new(id: Innovation, kind: NodeKind) -> NodeGene {
        NodeGene {
            id,
            kind,
            inputs: HashSet::default(),
            outputs: HashSet::default(),
        }
    }

    /// Adds the passed innovation number to the node's
    /// list of input connections.
    ///
    /// # Errors
    /// This function returns an error if the connection is already
    /// in the node's inputs.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{NodeGene, NodeKind};
    ///
    /// let mut node = NodeGene::new(5, NodeKind::Hidden);
    ///
    /// node.add_input_connection(9).unwrap();
    /// assert_eq!(*node.input_connections().next().unwrap(), 9);
    ///
    /// assert!(node.add_input_connection(9).is_err());
    /// ```
    pub fn add_input_connection(
        &mut self,
        innovation: Innovation,
    ) -> Result<(), GeneValidityError> {
        if self.inputs.insert(innovation) {
            Ok(())
        } else {
            Err(GeneValidityError::DuplicateInnovation(innovation))
        }
    }

    /// Adds the passed innovation number to the node's
    /// list of output connections.
    ///
    /// # Errors
    /// This function returns an error if the connection is already
    /// in the node's outputs.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{NodeGene, NodeKind};
    ///
    /// let mut node = NodeGene::new(5, NodeKind::Hidden);
    ///
    /// node.add_output_connection(9).unwrap();
    /// assert_eq!(*node.output_connections().next().unwrap(), 9);
    ///
    /// assert!(node.add_output_connection(9).is_err());
    /// ```
    pub fn add_output_connection(
        &mut self,
        innovation: Innovation,
    ) -> Result<(), GeneValidityError> {
        if self.outputs.insert(innovation) {
            Ok(())
        } else {
            Err(GeneValidityError::DuplicateInnovation(innovation))
        }
    }

    /// Returns the node's id.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{NodeGene, NodeKind};
    ///
    /// let node = NodeGene::new(5, NodeKind::Hidden);
    ///
    /// assert_eq!(node.id(), 5);
    /// ```
    pub fn id(&self) -> Innovation {
        self.id
    }

    /// Returns the node's kind.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{NodeGene, NodeKind};
    ///
    /// let node = NodeGene::new(5, NodeKind::Output);
    ///
    /// assert_eq!(node.kind(), NodeKind::Output);
    /// ```
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns an iterator over the innovation numbers
    /// of the node's input connections.
    pub fn input_connections(&self) -> impl Iterator<Item = &Innovation> {
        self.inputs.iter()
    }

    /// Returns an iterator over the innovation numbers
    /// of the node's output connections.
    pub fn output_connections(&self) -> impl Iterator<Item = &Innovation> {
        self.outputs.iter()
    }

    /// Returns a copy of the node without any adjacency.
    pub(super) fn detached(&self) -> NodeGene {
        NodeGene::new(self.id, self.kind)
    }
}

impl PartialEq for NodeGene {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{:?}, IN: {:?}, OUT: {:?}]",
            self.id, self.kind, self.inputs, self.outputs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_is_tracked_per_direction() {
        let mut node = NodeGene::new(3, NodeKind::Hidden);
        node.add_input_connection(1).unwrap();
        node.add_output_connection(2).unwrap();
        node.add_output_connection(1).unwrap();
        assert_eq!(node.input_connections().count(), 1);
        assert_eq!(node.output_connections().count(), 2);
    }

    #[test]
    fn equality_ignores_adjacency() {
        let mut a = NodeGene::new(3, NodeKind::Output);
        let b = NodeGene::new(3, NodeKind::Output);
        a.add_input_connection(11).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, NodeGene::new(3, NodeKind::Hidden));
    }
}
