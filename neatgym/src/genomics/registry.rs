use super::{EncodingError, Genome};
use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// An `InnovationRegistry` keeps track of structural innovations
/// during one evolutionary run, in order to make sure identical
/// mutations are assigned the same innovation numbers.
///
/// For connections the input and output node ids identify
/// identical mutations, and the corresponding innovation
/// number is recorded. Numbers are handed out in first-seen
/// order starting at 1, and are never reused.
///
/// For node additions the split connection identifies identical
/// mutations, and the id of the hidden node placed in the middle
/// is recorded.
///
/// A registry is scoped to a single run: populations own theirs,
/// and independent runs (or tests) must each start from a fresh
/// or [`reset`] registry.
///
/// [`reset`]: InnovationRegistry::reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InnovationRegistry {
    next_innovation: Innovation,
    next_node_id: Innovation,
    connections: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    endpoints: HashMap<Innovation, (Innovation, Innovation), RandomState>,
    splits: HashMap<Innovation, Innovation, RandomState>,
}

impl Default for InnovationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InnovationRegistry {
    /// Creates an empty registry.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::InnovationRegistry;
    ///
    /// let registry = InnovationRegistry::new();
    /// assert_eq!(registry.max_innovation(), 0);
    /// ```
    pub fn new() -> InnovationRegistry {
        InnovationRegistry {
            next_innovation: 1,
            next_node_id: 0,
            connections: HashMap::default(),
            endpoints: HashMap::default(),
            splits: HashMap::default(),
        }
    }

    /// Forgets every recorded innovation, returning
    /// the registry to its freshly constructed state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Returns the innovation number previously assigned to
    /// the connection `input_id -> output_id`, or assigns
    /// and returns the next available one.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::InnovationRegistry;
    ///
    /// let mut registry = InnovationRegistry::new();
    ///
    /// assert_eq!(registry.get_or_create(0, 3), 1);
    /// assert_eq!(registry.get_or_create(2, 3), 2);
    /// // Identical structure, identical number.
    /// assert_eq!(registry.get_or_create(0, 3), 1);
    /// ```
    pub fn get_or_create(&mut self, input_id: Innovation, output_id: Innovation) -> Innovation {
        match self.connections.entry((input_id, output_id)) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let innovation = self.next_innovation;
                entry.insert(innovation);
                self.endpoints.insert(innovation, (input_id, output_id));
                self.next_innovation += 1;
                innovation
            }
        }
    }

    /// Returns the innovation number assigned to the
    /// connection `input_id -> output_id`, if any.
    pub fn lookup(&self, input_id: Innovation, output_id: Innovation) -> Option<Innovation> {
        self.connections.get(&(input_id, output_id)).copied()
    }

    /// Returns the endpoints recorded for an innovation number, if any.
    pub fn endpoints_of(&self, innovation: Innovation) -> Option<(Innovation, Innovation)> {
        self.endpoints.get(&innovation).copied()
    }

    /// Makes sure node ids `0..count` are never
    /// handed out to hidden nodes. Used to set aside
    /// ids for sensor and output nodes.
    pub fn reserve_nodes(&mut self, count: usize) {
        self.next_node_id = self.next_node_id.max(count);
    }

    /// Returns the id of the hidden node previously created
    /// by splitting `connection`, if any.
    pub fn recorded_split(&self, connection: Innovation) -> Option<Innovation> {
        self.splits.get(&connection).copied()
    }

    /// Registers the split of `connection` (going `input_id -> output_id`)
    /// and returns the triplet `(input gene, new node, output gene)`.
    ///
    /// Splitting the same connection anywhere in the run yields the same
    /// triplet, unless `fresh` is `true`: then a new node id is allocated
    /// and recorded in place of the old one. This is needed when the
    /// mutating genome already contains the recorded node, which would
    /// otherwise result in duplicate nodes within the same genome.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::InnovationRegistry;
    ///
    /// let mut registry = InnovationRegistry::new();
    /// registry.reserve_nodes(2);
    /// let split_gene = registry.get_or_create(0, 1);
    ///
    /// let (input_gene, node, output_gene) = registry.split(split_gene, 0, 1, false);
    /// assert_eq!(node, 2);
    /// assert_eq!(registry.split(split_gene, 0, 1, false), (input_gene, node, output_gene));
    ///
    /// let (_, fresh_node, _) = registry.split(split_gene, 0, 1, true);
    /// assert_eq!(fresh_node, 3);
    /// ```
    pub fn split(
        &mut self,
        connection: Innovation,
        input_id: Innovation,
        output_id: Innovation,
        fresh: bool,
    ) -> (Innovation, Innovation, Innovation) {
        let node = match self.splits.get(&connection) {
            Some(node) if !fresh => *node,
            _ => {
                let node = self.next_node_id;
                self.next_node_id += 1;
                self.splits.insert(connection, node);
                node
            }
        };
        (
            self.get_or_create(input_id, node),
            node,
            self.get_or_create(node, output_id),
        )
    }

    /// Folds the structure of an externally obtained genome (e.g. one
    /// decoded from a record) into the registry, so that further
    /// mutations stay consistent with it.
    ///
    /// # Errors
    /// Returns an error if any of the genome's connections contradicts
    /// a pairing already recorded.
    pub fn observe(&mut self, genome: &Genome) -> Result<(), EncodingError> {
        for gene in genome.connections() {
            let endpoints = gene.endpoints();
            if let Some(&recorded) = self.connections.get(&endpoints) {
                if recorded != gene.innovation() {
                    return Err(EncodingError::ConflictingEndpoints {
                        endpoints,
                        innovations: (recorded, gene.innovation()),
                    });
                }
            }
            if let Some(&recorded) = self.endpoints.get(&gene.innovation()) {
                if recorded != endpoints {
                    return Err(EncodingError::ConflictingInnovation {
                        innovation: gene.innovation(),
                        endpoints: (recorded, endpoints),
                    });
                }
            }
        }

        for gene in genome.connections() {
            self.connections.insert(gene.endpoints(), gene.innovation());
            self.endpoints.insert(gene.innovation(), gene.endpoints());
            self.next_innovation = self.next_innovation.max(gene.innovation() + 1);
        }
        if let Some(max_node) = genome.nodes().map(|n| n.id()).max() {
            self.next_node_id = self.next_node_id.max(max_node + 1);
        }

        Ok(())
    }

    /// Returns the highest connection innovation number generated,
    /// or 0 if none has been.
    pub fn max_innovation(&self) -> Innovation {
        self.next_innovation - 1
    }

    /// Returns the next node id that will be handed out.
    pub fn next_node_id(&self) -> Innovation {
        self.next_node_id
    }

    /// Returns an iterator over the complete record of
    /// connection innovations, in the format
    /// `((input node, output node), innovation)`.
    /// No ordering is guaranteed.
    pub fn connection_history(
        &self,
    ) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.connections.iter()
    }
}
