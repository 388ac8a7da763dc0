//! A Genome is the genetic encoding of a single network:
//! a set of node genes plus a set of connection genes, each
//! connection carrying the innovation number that aligns
//! it with structurally identical genes in other genomes.
mod config;
mod errors;
mod genes;
mod nodes;
mod record;
mod registry;

pub use config::GeneticConfig;
pub use errors::*;
pub use genes::ConnectionGene;
pub use nodes::{NodeGene, NodeKind};
pub use record::{ConnectionRecord, GenomeRecord, NodeRecord};
pub use registry::InnovationRegistry;

use crate::Innovation;

use std::collections::{HashMap, HashSet};
use std::fmt;

use ahash::RandomState;
use rand::prelude::{IteratorRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Genomes are the focus of evolution in NEAT.
/// They are a collection of nodes and of connections
/// between them, and can be mutated, recombined with
/// one another, and compared to measure their
/// genetic distance.
///
/// A genome's structure is validated whenever it is
/// edited: connections always join existing nodes,
/// never target a sensor, and no two connections share
/// the same endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "GenomeRecord", try_from = "GenomeRecord")]
pub struct Genome {
    nodes: HashMap<Innovation, NodeGene, RandomState>,
    connections: HashMap<Innovation, ConnectionGene, RandomState>,
    node_pairings: HashMap<(Innovation, Innovation), Innovation, RandomState>,
}

impl Genome {
    /// Creates a genome with no nodes and no connections.
    pub fn empty() -> Genome {
        Genome {
            nodes: HashMap::default(),
            connections: HashMap::default(),
            node_pairings: HashMap::default(),
        }
    }

    /// Creates a new genome according to the specified configuration.
    ///
    /// Sensor nodes take ids `0..input_count`, and output nodes
    /// the following `output_count` ids. Each sensor-output pair
    /// is then connected with probability [`initial_expression_chance`],
    /// in sensor-major order, using innovation numbers from the registry
    /// and weights uniformly drawn in ±[`weight_bound`].
    ///
    /// [`initial_expression_chance`]: GeneticConfig::initial_expression_chance
    /// [`weight_bound`]: GeneticConfig::weight_bound
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = InnovationRegistry::new();
    /// let genome = Genome::genesis(&config, &mut registry);
    ///
    /// assert_eq!(genome.nodes().count(), 5);
    /// assert_eq!(genome.connections().count(), 6);
    /// assert_eq!(registry.max_innovation(), 6);
    /// ```
    pub fn genesis(config: &GeneticConfig, registry: &mut InnovationRegistry) -> Genome {
        let input_count = config.input_count.get();
        let output_count = config.output_count.get();
        registry.reserve_nodes(input_count + output_count);

        let mut genome = Genome::empty();
        for id in 0..input_count {
            genome.add_node_unchecked(id, NodeKind::Sensor);
        }
        for id in input_count..input_count + output_count {
            genome.add_node_unchecked(id, NodeKind::Output);
        }

        let mut rng = rand::thread_rng();
        for input in 0..input_count {
            for output in input_count..input_count + output_count {
                if rng.gen::<f32>() < config.initial_expression_chance {
                    let innovation = registry.get_or_create(input, output);
                    genome.add_connection_unchecked(ConnectionGene::new(
                        innovation,
                        input,
                        output,
                        ConnectionGene::random_weight(config),
                    ));
                }
            }
        }

        genome
    }

    /// Adds a new node with the specified id and kind.
    ///
    /// # Errors
    /// Returns an error if a node with the same id
    /// is already in the genome.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{Genome, NodeKind};
    ///
    /// let mut genome = Genome::empty();
    /// genome.add_node(4, NodeKind::Hidden).unwrap();
    ///
    /// assert!(genome.add_node(4, NodeKind::Sensor).is_err());
    /// ```
    pub fn add_node(
        &mut self,
        id: Innovation,
        kind: NodeKind,
    ) -> Result<&mut NodeGene, NodeValidityError> {
        if self.nodes.contains_key(&id) {
            return Err(NodeValidityError::DuplicateNodeId(id));
        }
        Ok(self.add_node_unchecked(id, kind))
    }

    fn add_node_unchecked(&mut self, id: Innovation, kind: NodeKind) -> &mut NodeGene {
        self.nodes.entry(id).or_insert_with(|| NodeGene::new(id, kind))
    }

    /// Adds a new enabled connection between two existing nodes,
    /// taking its innovation number from the registry.
    ///
    /// # Errors
    /// Returns an error if either endpoint is missing, the target
    /// is a sensor, or the genome already connects the same endpoints.
    /// The registry is left untouched on failure.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{Genome, InnovationRegistry, NodeKind};
    ///
    /// let mut registry = InnovationRegistry::new();
    /// let mut genome = Genome::empty();
    /// genome.add_node(0, NodeKind::Sensor).unwrap();
    /// genome.add_node(1, NodeKind::Output).unwrap();
    ///
    /// let gene = genome.add_connection(&mut registry, 0, 1, 0.5).unwrap();
    /// assert_eq!(gene.innovation(), 1);
    ///
    /// assert!(genome.add_connection(&mut registry, 0, 1, 0.5).is_err());
    /// assert!(genome.add_connection(&mut registry, 1, 0, 0.5).is_err());
    /// ```
    pub fn add_connection(
        &mut self,
        registry: &mut InnovationRegistry,
        input: Innovation,
        output: Innovation,
        weight: f32,
    ) -> Result<&mut ConnectionGene, GeneValidityError> {
        self.check_endpoints(registry.lookup(input, output).unwrap_or(0), input, output)?;
        let innovation = registry.get_or_create(input, output);
        self.insert_connection(ConnectionGene::new(innovation, input, output, weight))
    }

    /// Inserts an already numbered connection gene, keeping
    /// its weight and enabled status.
    ///
    /// # Errors
    /// Returns an error if the innovation number is already present,
    /// either endpoint is missing, the target is a sensor, or the genome
    /// already connects the same endpoints.
    pub fn insert_connection(
        &mut self,
        gene: ConnectionGene,
    ) -> Result<&mut ConnectionGene, GeneValidityError> {
        if self.connections.contains_key(&gene.innovation()) {
            return Err(GeneValidityError::DuplicateInnovation(gene.innovation()));
        }
        self.check_endpoints(gene.innovation(), gene.input(), gene.output())?;
        Ok(self.add_connection_unchecked(gene))
    }

    fn check_endpoints(
        &self,
        innovation: Innovation,
        input: Innovation,
        output: Innovation,
    ) -> Result<(), GeneValidityError> {
        match (self.nodes.get(&input), self.nodes.get(&output)) {
            (Some(_), Some(target)) => {
                if target.kind() == NodeKind::Sensor {
                    Err(GeneValidityError::SensorTarget(output))
                } else if self.node_pairings.contains_key(&(input, output)) {
                    Err(GeneValidityError::DuplicateEndpoints(innovation, (input, output)))
                } else {
                    Ok(())
                }
            }
            _ => Err(GeneValidityError::NonexistantEndpoints(input, output)),
        }
    }

    fn add_connection_unchecked(&mut self, gene: ConnectionGene) -> &mut ConnectionGene {
        let innovation = gene.innovation();
        let (input, output) = gene.endpoints();
        // Adjacency sets cannot already hold a fresh innovation number.
        if let Some(node) = self.nodes.get_mut(&input) {
            let _ = node.add_output_connection(innovation);
        }
        if let Some(node) = self.nodes.get_mut(&output) {
            let _ = node.add_input_connection(innovation);
        }
        self.node_pairings.insert((input, output), innovation);
        self.connections.entry(innovation).or_insert(gene)
    }

    /// Mutates the connection weights of the genome.
    ///
    /// Each weight is reset with a probability of [`weight_reset_chance`],
    /// scaled down for older genes, and otherwise nudged with a
    /// probability of [`weight_nudge_chance`].
    ///
    /// [`weight_reset_chance`]: GeneticConfig::weight_reset_chance
    /// [`weight_nudge_chance`]: GeneticConfig::weight_nudge_chance
    pub fn mutate_weights(&mut self, config: &GeneticConfig) {
        let mut rng = rand::thread_rng();
        let max_innovation = self.max_innovation().max(1) as f32;
        for gene in self.connections.values_mut() {
            // Older genes have had more time to settle.
            let age_factor = (gene.innovation() as f32 / max_innovation).powi(2);
            if rng.gen::<f32>() < config.weight_reset_chance * age_factor {
                gene.randomize_weight(config);
            } else if rng.gen::<f32>() < config.weight_nudge_chance {
                gene.nudge_weight(config);
            }
        }
    }

    /// Adds a connection between a random pair of nodes that
    /// are not yet connected. With probability [`recursion_chance`]
    /// a non-sensor node is connected to itself instead.
    ///
    /// At most [`max_connection_addition_attempts`] candidate
    /// input nodes are tried.
    ///
    /// [`recursion_chance`]: GeneticConfig::recursion_chance
    /// [`max_connection_addition_attempts`]: GeneticConfig::max_connection_addition_attempts
    ///
    /// # Errors
    /// Returns an error if every node is already fully connected,
    /// or no viable pair was found in the allowed attempts.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 1.0,
    ///     max_connection_addition_attempts: 5,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = InnovationRegistry::new();
    /// let mut genome = Genome::genesis(&config, &mut registry);
    /// assert_eq!(genome.connections().count(), 0);
    ///
    /// let gene = genome.mutate_add_connection(&mut registry, &config).unwrap();
    /// assert_eq!((gene.input(), gene.output()), (0, 1));
    /// ```
    pub fn mutate_add_connection(
        &mut self,
        registry: &mut InnovationRegistry,
        config: &GeneticConfig,
    ) -> Result<&ConnectionGene, ConnectionMutationError> {
        let targets = self.non_sensor_nodes();
        let mut candidates: Vec<Innovation> = self
            .nodes
            .values()
            .filter(|n| n.output_connections().count() < targets.len())
            .map(|n| n.id())
            .collect();
        if candidates.is_empty() {
            return Err(ConnectionMutationError::GenomeFullyConnected);
        }

        let mut rng = rand::thread_rng();
        candidates.sort_unstable();
        candidates.shuffle(&mut rng);

        let (input, output) = candidates
            .iter()
            .take(config.max_connection_addition_attempts)
            .find_map(|&input| {
                self.choose_target_for(input, &targets, config)
                    .map(|output| (input, output))
            })
            .ok_or(ConnectionMutationError::NoInputOutputPairFound)?;

        let innovation = registry.get_or_create(input, output);
        Ok(self.add_connection_unchecked(ConnectionGene::new(
            innovation,
            input,
            output,
            ConnectionGene::random_weight(config),
        )))
    }

    fn non_sensor_nodes(&self) -> HashSet<Innovation> {
        self.nodes
            .values()
            .filter(|n| n.kind() != NodeKind::Sensor)
            .map(|n| n.id())
            .collect()
    }

    fn choose_target_for(
        &self,
        input: Innovation,
        targets: &HashSet<Innovation>,
        config: &GeneticConfig,
    ) -> Option<Innovation> {
        let mut rng = rand::thread_rng();
        let connected: HashSet<Innovation> = self.nodes[&input]
            .output_connections()
            .map(|c| self.connections[c].output())
            .collect();

        if targets.contains(&input)
            && !connected.contains(&input)
            && rng.gen::<f32>() < config.recursion_chance
        {
            return Some(input);
        }

        let mut free: Vec<Innovation> = targets
            .iter()
            .copied()
            .filter(|t| *t != input && !connected.contains(t))
            .collect();
        free.sort_unstable();
        free.into_iter().choose(&mut rng)
    }

    /// Splits a random enabled connection `a -> b` in two by
    /// placing a new hidden node `n` in the middle. The old
    /// connection is disabled, `a -> n` gets a weight of 1.0
    /// and `n -> b` keeps the old weight, so the network's
    /// behavior is initially preserved.
    ///
    /// Returns the triplet (_in gene_, _new node_, _out gene_).
    ///
    /// # Errors
    /// Returns an error if the genome has no enabled connection.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry, NodeKind};
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = InnovationRegistry::new();
    /// let mut genome = Genome::genesis(&config, &mut registry);
    /// let old_weight = genome.connections().next().unwrap().weight();
    ///
    /// let (in_gene, node, out_gene) = genome.mutate_add_node(&mut registry).unwrap();
    /// assert_eq!(node.kind(), NodeKind::Hidden);
    /// assert_eq!(in_gene.weight(), 1.0);
    /// assert_eq!(out_gene.weight(), old_weight);
    ///
    /// assert!(!genome.connection(1).unwrap().enabled());
    /// ```
    pub fn mutate_add_node(
        &mut self,
        registry: &mut InnovationRegistry,
    ) -> Result<(&ConnectionGene, &NodeGene, &ConnectionGene), NodeMutationError> {
        let mut rng = rand::thread_rng();
        let mut enabled: Vec<Innovation> = self
            .connections
            .values()
            .filter(|c| c.enabled())
            .map(|c| c.innovation())
            .collect();
        enabled.sort_unstable();
        let split = *enabled
            .choose(&mut rng)
            .ok_or(NodeMutationError::NoEnabledConnection)?;

        let (input, output) = self.connections[&split].endpoints();
        let weight = self.connections[&split].weight();
        let fresh = registry
            .recorded_split(split)
            .map_or(false, |node| self.nodes.contains_key(&node));
        let (in_gene, node, out_gene) = registry.split(split, input, output, fresh);

        if let Some(gene) = self.connections.get_mut(&split) {
            gene.set_enabled(false);
        }
        self.add_node_unchecked(node, NodeKind::Hidden);
        self.add_connection_unchecked(ConnectionGene::new(in_gene, input, node, 1.0));
        self.add_connection_unchecked(ConnectionGene::new(out_gene, node, output, weight));

        Ok((
            &self.connections[&in_gene],
            &self.nodes[&node],
            &self.connections[&out_gene],
        ))
    }

    /// Applies every mutation kind to the genome: weights always,
    /// node and connection additions with their configured chances.
    /// Failed structural mutations leave the genome unchanged.
    pub fn mutate(&mut self, registry: &mut InnovationRegistry, config: &GeneticConfig) {
        let mut rng = rand::thread_rng();
        self.mutate_weights(config);
        if rng.gen::<f32>() < config.node_addition_mutation_chance {
            let _ = self.mutate_add_node(registry);
        }
        if rng.gen::<f32>() < config.connection_addition_mutation_chance {
            let _ = self.mutate_add_connection(registry, config);
        }
    }

    /// Combines two genomes into a child.
    ///
    /// Matched connections (same innovation number) are copied from
    /// a random parent, or averaged with probability
    /// [`mate_by_averaging_chance`]. A copy that is disabled while
    /// the other parent's is enabled is re-enabled with probability
    /// [`reenable_chance`]. Unmatched connections are inherited only
    /// from the fitter parent, which is `a` if `fitter_is_a` and `b`
    /// otherwise.
    ///
    /// [`mate_by_averaging_chance`]: GeneticConfig::mate_by_averaging_chance
    /// [`reenable_chance`]: GeneticConfig::reenable_chance
    pub fn crossover(a: &Genome, b: &Genome, fitter_is_a: bool, config: &GeneticConfig) -> Genome {
        let (fitter, other) = if fitter_is_a { (a, b) } else { (b, a) };
        let mut rng = rand::thread_rng();
        let average = rng.gen::<f32>() < config.mate_by_averaging_chance;

        let mut child = Genome::empty();
        for node in a.nodes.values().chain(b.nodes.values()) {
            if node.kind() != NodeKind::Hidden {
                child.add_node_unchecked(node.id(), node.kind());
            }
        }

        let mut innovations: Vec<Innovation> = fitter.connections.keys().copied().collect();
        innovations.sort_unstable();
        for innovation in innovations {
            let own = &fitter.connections[&innovation];
            let gene = match other.connections.get(&innovation) {
                Some(theirs) => {
                    let mut gene = if rng.gen::<bool>() {
                        own.clone()
                    } else {
                        theirs.clone()
                    };
                    if average {
                        gene.set_weight((own.weight() + theirs.weight()) / 2.0);
                    }
                    if !gene.enabled()
                        && (own.enabled() || theirs.enabled())
                        && rng.gen::<f32>() < config.reenable_chance
                    {
                        gene.set_enabled(true);
                    }
                    gene
                }
                None => own.clone(),
            };

            for endpoint in [gene.input(), gene.output()] {
                let node = fitter.nodes.get(&endpoint).or_else(|| other.nodes.get(&endpoint));
                if let Some(node) = node {
                    child.nodes.entry(endpoint).or_insert_with(|| node.detached());
                }
            }
            child.add_connection_unchecked(gene);
        }

        child
    }

    /// Returns the genetic distance between two genomes.
    ///
    /// Over the union of both genomes' innovation numbers, genes present
    /// in only one genome count as _excess_ if their innovation number is
    /// beyond the other genome's highest, and as _disjoint_ otherwise.
    /// The distance is
    ///
    /// `excess_gene_factor * E / N + disjoint_gene_factor * D / N + common_weight_factor * W`
    ///
    /// where `W` is the mean absolute weight difference of matched genes
    /// (0 if there are none), and `N` is the length of the larger genome
    /// if it exceeds [`size_normalization_threshold`], 1 otherwise.
    ///
    /// [`size_normalization_threshold`]: GeneticConfig::size_normalization_threshold
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 1.0,
    ///     excess_gene_factor: 1.0,
    ///     disjoint_gene_factor: 1.0,
    ///     common_weight_factor: 0.4,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = InnovationRegistry::new();
    /// let a = Genome::genesis(&config, &mut registry);
    /// let b = Genome::genesis(&config, &mut registry);
    ///
    /// assert_eq!(Genome::distance(&a, &a, &config), 0.0);
    /// assert_eq!(Genome::distance(&a, &b, &config), Genome::distance(&b, &a, &config));
    /// ```
    pub fn distance(a: &Genome, b: &Genome, config: &GeneticConfig) -> f32 {
        let (max_a, max_b) = (a.max_innovation(), b.max_innovation());
        let mut innovations: Vec<Innovation> = a
            .connections
            .keys()
            .chain(b.connections.keys())
            .copied()
            .collect();
        innovations.sort_unstable();
        innovations.dedup();

        let (mut excess, mut disjoint, mut matched) = (0usize, 0usize, 0usize);
        let mut weight_difference = 0.0;
        for innovation in innovations {
            match (a.connections.get(&innovation), b.connections.get(&innovation)) {
                (Some(x), Some(y)) => {
                    matched += 1;
                    weight_difference += (x.weight() - y.weight()).abs();
                }
                (Some(_), None) if innovation > max_b => excess += 1,
                (None, Some(_)) if innovation > max_a => excess += 1,
                _ => disjoint += 1,
            }
        }

        let longest = a.len().max(b.len());
        let normalization = if longest > config.size_normalization_threshold {
            longest as f32
        } else {
            1.0
        };
        let mean_weight_difference = if matched > 0 {
            weight_difference / matched as f32
        } else {
            0.0
        };

        config.excess_gene_factor * excess as f32 / normalization
            + config.disjoint_gene_factor * disjoint as f32 / normalization
            + config.common_weight_factor * mean_weight_difference
    }

    /// Returns the genome's structured record as a JSON value.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<serde_json::Value, EncodingError> {
        Ok(serde_json::to_value(GenomeRecord::from(self))?)
    }

    /// Rebuilds a genome from its structured record.
    ///
    /// # Errors
    /// Returns an error if the record is missing fields, or
    /// describes a structurally invalid genome.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
    ///
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let genome = Genome::genesis(&config, &mut InnovationRegistry::new());
    ///
    /// let copy = Genome::from_json(genome.to_json().unwrap()).unwrap();
    /// assert_eq!(copy.to_json().unwrap(), genome.to_json().unwrap());
    /// ```
    pub fn from_json(value: serde_json::Value) -> Result<Genome, EncodingError> {
        let record: GenomeRecord = serde_json::from_value(value)?;
        Genome::try_from(record)
    }

    /// Returns an iterator over the genome's nodes. No ordering is guaranteed.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    /// Returns an iterator over the genome's connections. No ordering is guaranteed.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values()
    }

    /// Returns the node with the specified id, if present.
    pub fn node(&self, id: Innovation) -> Option<&NodeGene> {
        self.nodes.get(&id)
    }

    /// Returns the connection with the specified innovation number, if present.
    pub fn connection(&self, innovation: Innovation) -> Option<&ConnectionGene> {
        self.connections.get(&innovation)
    }

    /// Returns the ids of all nodes of the given kind, in ascending order.
    pub fn node_ids(&self, kind: NodeKind) -> Vec<Innovation> {
        let mut ids: Vec<Innovation> = self
            .nodes
            .values()
            .filter(|n| n.kind() == kind)
            .map(|n| n.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the highest innovation number among
    /// the genome's connections, or 0 if it has none.
    pub fn max_innovation(&self) -> Innovation {
        self.connections.keys().copied().max().unwrap_or(0)
    }

    /// Returns the genome's length: the total gene count,
    /// nodes and connections alike.
    pub fn len(&self) -> usize {
        self.nodes.len() + self.connections.len()
    }

    /// Returns `true` if the genome has no genes at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut connections: Vec<&ConnectionGene> = self.connections.values().collect();
        let mut nodes: Vec<&NodeGene> = self.nodes.values().collect();
        connections.sort_unstable_by_key(|c| c.innovation());
        nodes.sort_unstable_by_key(|n| n.id());
        write!(f, "Genome {{ nodes: [")?;
        for (i, node) in nodes.iter().enumerate() {
            write!(f, "{}{}:{:?}", if i > 0 { ", " } else { "" }, node.id(), node.kind())?;
        }
        write!(f, "], connections: [")?;
        for (i, gene) in connections.iter().enumerate() {
            write!(f, "{}{}", if i > 0 { ", " } else { "" }, gene)?;
        }
        write!(f, "] }}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    fn connected_config(inputs: usize, outputs: usize) -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(inputs).unwrap(),
            output_count: NonZeroUsize::new(outputs).unwrap(),
            initial_expression_chance: 1.0,
            weight_bound: 2.0,
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            common_weight_factor: 0.4,
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn genesis_fully_connected() {
        for input_count in 1..6 {
            for output_count in 1..6 {
                let config = connected_config(input_count, output_count);
                let mut registry = InnovationRegistry::new();
                let genome = Genome::genesis(&config, &mut registry);

                assert_eq!(genome.connections.len(), input_count * output_count);
                assert_eq!(genome.node_ids(NodeKind::Sensor), (0..input_count).collect::<Vec<_>>());
                assert_eq!(
                    genome.node_ids(NodeKind::Output),
                    (input_count..input_count + output_count).collect::<Vec<_>>()
                );
                for gene in genome.connections() {
                    // Sensor-major order, starting at 1.
                    assert_eq!(
                        gene.innovation(),
                        gene.input() * output_count + (gene.output() - input_count) + 1
                    );
                    assert!(gene.weight().abs() <= config.weight_bound);
                    assert!(genome.nodes[&gene.input()]
                        .output_connections()
                        .any(|c| *c == gene.innovation()));
                    assert!(genome.nodes[&gene.output()]
                        .input_connections()
                        .any(|c| *c == gene.innovation()));
                }
                assert_eq!(registry.next_node_id(), input_count + output_count);
            }
        }
    }

    #[test]
    fn genesis_unconnected() {
        let config = GeneticConfig::zero();
        let genome = Genome::genesis(&config, &mut InnovationRegistry::new());
        assert_eq!(genome.connections.len(), 0);
        assert_eq!(genome.len(), 2);
    }

    #[test]
    fn innovations_follow_creation_order() {
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::empty();
        for id in 0..3 {
            genome.add_node(id, NodeKind::Sensor).unwrap();
        }
        genome.add_node(3, NodeKind::Output).unwrap();
        genome.add_node(4, NodeKind::Hidden).unwrap();

        let pairs = [(0, 3), (2, 3), (4, 3), (0, 4), (1, 4), (3, 4)];
        for (expected, (input, output)) in (1..).zip(pairs) {
            let gene = genome.add_connection(&mut registry, input, output, 1.0).unwrap();
            assert_eq!(gene.innovation(), expected);
        }
        assert_eq!(genome.len(), 5 + 6);
    }

    #[test]
    fn same_structure_same_innovation_across_genomes() {
        let config = connected_config(2, 1);
        let mut registry = InnovationRegistry::new();
        let mut a = Genome::genesis(&config, &mut registry);
        let mut b = Genome::genesis(&config, &mut registry);

        let hidden = registry.next_node_id();
        a.add_node(hidden, NodeKind::Hidden).unwrap();
        b.add_node(hidden, NodeKind::Hidden).unwrap();
        let first = a.add_connection(&mut registry, 0, hidden, 1.0).unwrap().innovation();
        let second = b.add_connection(&mut registry, 0, hidden, -1.0).unwrap().innovation();
        let other = b.add_connection(&mut registry, 1, hidden, -1.0).unwrap().innovation();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn failed_connection_leaves_registry_untouched() {
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::empty();
        genome.add_node(0, NodeKind::Sensor).unwrap();
        genome.add_node(1, NodeKind::Sensor).unwrap();

        assert_eq!(
            genome.add_connection(&mut registry, 0, 1, 1.0).unwrap_err(),
            GeneValidityError::SensorTarget(1)
        );
        assert_eq!(
            genome.add_connection(&mut registry, 0, 9, 1.0).unwrap_err(),
            GeneValidityError::NonexistantEndpoints(0, 9)
        );
        assert_eq!(registry.max_innovation(), 0);
    }

    #[test]
    fn insert_connection_duplicates() {
        let mut genome = Genome::empty();
        genome.add_node(0, NodeKind::Sensor).unwrap();
        genome.add_node(1, NodeKind::Output).unwrap();
        genome.add_node(2, NodeKind::Hidden).unwrap();
        genome.insert_connection(ConnectionGene::new(5, 0, 1, 1.0)).unwrap();

        assert_eq!(
            genome.insert_connection(ConnectionGene::new(5, 0, 2, 1.0)).unwrap_err(),
            GeneValidityError::DuplicateInnovation(5)
        );
        assert_eq!(
            genome.insert_connection(ConnectionGene::new(6, 0, 1, 1.0)).unwrap_err(),
            GeneValidityError::DuplicateEndpoints(6, (0, 1))
        );
    }

    #[test]
    fn mutate_weights_none() {
        let config = GeneticConfig {
            weight_bound: 5.0,
            ..connected_config(2, 2)
        };
        let mut genome = Genome::genesis(&config, &mut InnovationRegistry::new());
        let before = GenomeRecord::from(&genome);
        genome.mutate_weights(&config);
        assert_eq!(GenomeRecord::from(&genome), before);
    }

    /// It is possible this test will fail due to the
    /// rng returning the same weight, but the chances
    /// of this are minimal.
    #[test]
    fn mutate_weights_reset() {
        let config = GeneticConfig {
            weight_reset_chance: 1.0,
            ..connected_config(1, 1)
        };
        let mut genome = Genome::genesis(&config, &mut InnovationRegistry::new());
        let initial_weight = genome.connections[&1].weight();
        genome.mutate_weights(&config);
        assert_ne!(initial_weight, genome.connections[&1].weight());
    }

    #[test]
    fn mutate_weights_nudge_within_bounds() {
        let config = GeneticConfig {
            weight_nudge_chance: 1.0,
            weight_mutation_power: 0.5,
            ..connected_config(3, 3)
        };
        let mut genome = Genome::genesis(&config, &mut InnovationRegistry::new());
        for _ in 0..50 {
            genome.mutate_weights(&config);
            assert!(genome.connections().all(|c| c.weight().abs() <= config.weight_bound));
        }
    }

    #[test]
    fn mutate_connection_addition() {
        let config = GeneticConfig {
            max_connection_addition_attempts: 20,
            ..connected_config(1, 1)
        };
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::genesis(&config, &mut registry);
        genome.add_node(2, NodeKind::Hidden).unwrap();

        let gene = genome.mutate_add_connection(&mut registry, &config).unwrap();
        let (input, output) = gene.endpoints();
        assert_eq!(gene.innovation(), registry.lookup(input, output).unwrap());
        assert!((0..=2).contains(&input));
        assert!((1..=2).contains(&output));
        assert_ne!(input, output);
    }

    #[test]
    fn mutate_connection_addition_recursive() {
        let config = GeneticConfig {
            max_connection_addition_attempts: 20,
            recursion_chance: 1.0,
            ..connected_config(1, 1)
        };
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::genesis(&config, &mut registry);
        genome.add_node(50, NodeKind::Hidden).unwrap();
        genome.add_connection(&mut registry, 0, 50, 2.0).unwrap();
        genome.add_connection(&mut registry, 50, 1, 2.0).unwrap();
        genome.add_connection(&mut registry, 1, 50, 2.0).unwrap();

        // Only self loops are left.
        let gene = genome.mutate_add_connection(&mut registry, &config).unwrap();
        assert_eq!(gene.input(), gene.output());
    }

    #[test]
    fn mutate_connection_addition_fully_connected() {
        let config = GeneticConfig {
            max_connection_addition_attempts: 20,
            recursion_chance: 1.0,
            ..connected_config(1, 1)
        };
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::genesis(&config, &mut registry);
        genome.add_connection(&mut registry, 1, 1, 1.0).unwrap();

        assert_eq!(
            genome.mutate_add_connection(&mut registry, &config).unwrap_err(),
            ConnectionMutationError::GenomeFullyConnected
        );
    }

    #[test]
    fn mutate_connection_addition_no_attempts() {
        let config = connected_config(2, 2);
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::genesis(&config, &mut registry);
        genome.add_node(10, NodeKind::Hidden).unwrap();

        assert_eq!(
            genome.mutate_add_connection(&mut registry, &config).unwrap_err(),
            ConnectionMutationError::NoInputOutputPairFound
        );
    }

    #[test]
    fn mutate_node_addition() {
        let config = connected_config(1, 1);
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::genesis(&config, &mut registry);

        let (input, node, output) = genome.mutate_add_node(&mut registry).unwrap();
        assert_eq!(input.innovation(), *node.input_connections().next().unwrap());
        assert_eq!(output.innovation(), *node.output_connections().next().unwrap());
        assert_eq!(node.id(), 2);
        assert_eq!(genome.connections.len(), 3);
        assert_eq!(genome.nodes.len(), 3);
        assert!(!genome.connections[&1].enabled());
    }

    #[test]
    fn identical_splits_share_innovations() {
        let config = connected_config(1, 1);
        let mut registry = InnovationRegistry::new();
        let mut a = Genome::genesis(&config, &mut registry);
        let mut b = Genome::genesis(&config, &mut registry);

        let (a_in, a_node, a_out) = a.mutate_add_node(&mut registry).unwrap();
        let a_triplet = (a_in.innovation(), a_node.id(), a_out.innovation());
        let (b_in, b_node, b_out) = b.mutate_add_node(&mut registry).unwrap();
        assert_eq!(a_triplet, (b_in.innovation(), b_node.id(), b_out.innovation()));
    }

    #[test]
    fn resplitting_allocates_fresh_node() {
        let config = connected_config(1, 1);
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::genesis(&config, &mut registry);
        genome.mutate_add_node(&mut registry).unwrap();

        // Re-enable the split connection so it is chosen again
        // among the enabled ones eventually.
        genome.connections.get_mut(&1).unwrap().set_enabled(true);
        while genome.nodes.len() < 5 {
            genome.mutate_add_node(&mut registry).unwrap();
        }
        let hidden = genome.node_ids(NodeKind::Hidden);
        assert_eq!(hidden.len(), 3);
        let record = GenomeRecord::from(&genome);
        assert_eq!(Genome::try_from(record).unwrap().len(), genome.len());
    }

    #[test]
    fn mutate_node_addition_without_connections() {
        let config = GeneticConfig::zero();
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::genesis(&config, &mut registry);
        assert_eq!(
            genome.mutate_add_node(&mut registry).unwrap_err(),
            NodeMutationError::NoEnabledConnection
        );
    }

    #[test]
    fn crossover_only_uses_parental_innovations() {
        let config = GeneticConfig {
            max_connection_addition_attempts: 10,
            recursion_chance: 0.2,
            ..connected_config(3, 2)
        };
        let mut registry = InnovationRegistry::new();
        let mut a = Genome::genesis(&config, &mut registry);
        let mut b = Genome::genesis(&config, &mut registry);
        for _ in 0..5 {
            let _ = a.mutate_add_node(&mut registry);
            let _ = b.mutate_add_connection(&mut registry, &config);
            let _ = b.mutate_add_node(&mut registry);
        }

        for fitter_is_a in [true, false] {
            let child = Genome::crossover(&a, &b, fitter_is_a, &config);
            let fitter = if fitter_is_a { &a } else { &b };
            for gene in child.connections() {
                assert!(fitter.connection(gene.innovation()).is_some());
                assert!(child.node(gene.input()).is_some());
                assert!(child.node(gene.output()).is_some());
            }
            assert_eq!(child.connections.len(), fitter.connections.len());
            assert_eq!(child.node_ids(NodeKind::Sensor), vec![0, 1, 2]);
            assert_eq!(child.node_ids(NodeKind::Output), vec![3, 4]);
        }
    }

    #[test]
    fn crossover_averages_matched_weights() {
        let config = GeneticConfig {
            mate_by_averaging_chance: 1.0,
            ..connected_config(2, 2)
        };
        let mut registry = InnovationRegistry::new();
        let a = Genome::genesis(&config, &mut registry);
        let b = Genome::genesis(&config, &mut registry);

        let child = Genome::crossover(&a, &b, true, &config);
        for gene in child.connections() {
            let expected = (a.connections[&gene.innovation()].weight()
                + b.connections[&gene.innovation()].weight())
                / 2.0;
            assert_eq!(gene.weight(), expected);
        }
    }

    #[test]
    fn crossover_reenables_disabled_genes() {
        let config = GeneticConfig {
            reenable_chance: 1.0,
            ..connected_config(1, 1)
        };
        let mut registry = InnovationRegistry::new();
        let mut a = Genome::genesis(&config, &mut registry);
        let b = a.clone();
        a.connections.get_mut(&1).unwrap().set_enabled(false);

        let child = Genome::crossover(&a, &b, true, &config);
        assert!(child.connections[&1].enabled());
    }

    #[test]
    fn distance_identity_and_symmetry() {
        let config = GeneticConfig {
            max_connection_addition_attempts: 10,
            size_normalization_threshold: 4,
            ..connected_config(3, 2)
        };
        let mut registry = InnovationRegistry::new();
        let mut a = Genome::genesis(&config, &mut registry);
        let mut b = Genome::genesis(&config, &mut registry);
        for _ in 0..4 {
            let _ = a.mutate_add_node(&mut registry);
            let _ = b.mutate_add_connection(&mut registry, &config);
        }
        let _ = b.mutate_add_node(&mut registry);

        assert_eq!(Genome::distance(&a, &a, &config), 0.0);
        assert_eq!(Genome::distance(&b, &b, &config), 0.0);
        assert_eq!(Genome::distance(&a, &b, &config), Genome::distance(&b, &a, &config));
        assert!(Genome::distance(&a, &b, &config) > 0.0);
    }

    #[test]
    fn distance_counts_excess_and_disjoint() {
        let config = GeneticConfig {
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 10.0,
            common_weight_factor: 100.0,
            size_normalization_threshold: 100,
            ..GeneticConfig::zero()
        };
        let mut a = Genome::empty();
        let mut b = Genome::empty();
        for genome in [&mut a, &mut b] {
            genome.add_node(0, NodeKind::Sensor).unwrap();
            genome.add_node(1, NodeKind::Sensor).unwrap();
            genome.add_node(2, NodeKind::Output).unwrap();
            genome.add_node(3, NodeKind::Hidden).unwrap();
        }
        a.insert_connection(ConnectionGene::new(1, 0, 2, 1.0)).unwrap();
        a.insert_connection(ConnectionGene::new(2, 1, 2, 1.0)).unwrap();
        a.insert_connection(ConnectionGene::new(5, 0, 3, 1.0)).unwrap();
        a.insert_connection(ConnectionGene::new(6, 3, 2, 1.0)).unwrap();
        b.insert_connection(ConnectionGene::new(1, 0, 2, 1.5)).unwrap();
        b.insert_connection(ConnectionGene::new(3, 1, 3, 1.0)).unwrap();

        // Matched: 1 (|1.0 - 1.5|). Disjoint: 2, 3. Excess: 5, 6.
        let expected = 1.0 * 2.0 + 10.0 * 2.0 + 100.0 * 0.5;
        assert_eq!(Genome::distance(&a, &b, &config), expected);
        assert_eq!(Genome::distance(&b, &a, &config), expected);
    }

    #[test]
    fn distance_without_matched_genes() {
        let config = GeneticConfig {
            disjoint_gene_factor: 1.0,
            common_weight_factor: 1.0,
            ..GeneticConfig::zero()
        };
        let mut a = Genome::empty();
        a.add_node(0, NodeKind::Sensor).unwrap();
        a.add_node(1, NodeKind::Output).unwrap();
        let b = a.clone();
        a.insert_connection(ConnectionGene::new(1, 0, 1, 1.0)).unwrap();

        assert_eq!(Genome::distance(&a, &b, &config), 0.0);
        assert_eq!(Genome::distance(&Genome::empty(), &Genome::empty(), &config), 0.0);
    }

    #[test]
    fn json_round_trip() {
        let config = GeneticConfig {
            max_connection_addition_attempts: 10,
            ..connected_config(3, 1)
        };
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::genesis(&config, &mut registry);
        for _ in 0..3 {
            let _ = genome.mutate_add_node(&mut registry);
            let _ = genome.mutate_add_connection(&mut registry, &config);
        }

        let decoded = Genome::from_json(genome.to_json().unwrap()).unwrap();
        assert_eq!(decoded.len(), genome.len());
        assert_eq!(GenomeRecord::from(&decoded), GenomeRecord::from(&genome));
        assert_eq!(Genome::distance(&decoded, &genome, &config), 0.0);

        let text = serde_json::to_string(&genome).unwrap();
        let parsed: Genome = serde_json::from_str(&text).unwrap();
        assert_eq!(GenomeRecord::from(&parsed), GenomeRecord::from(&genome));
    }

    #[test]
    fn json_field_names() {
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::empty();
        genome.add_node(0, NodeKind::Sensor).unwrap();
        genome.add_node(1, NodeKind::Output).unwrap();
        genome.add_connection(&mut registry, 0, 1, 0.5).unwrap();

        let value = genome.to_json().unwrap();
        let connection = &value["connections"][0];
        assert_eq!(connection["innovation_number"], 1);
        assert_eq!(connection["in"], 0);
        assert_eq!(connection["out"], 1);
        assert_eq!(connection["enabled"], true);
        assert_eq!(value["nodes"][1]["kind"], "Output");
    }

    #[test]
    fn clones_are_independent() {
        let config = connected_config(2, 1);
        let mut registry = InnovationRegistry::new();
        let original = Genome::genesis(&config, &mut registry);
        let mut copy = original.clone();
        copy.mutate_add_node(&mut registry).unwrap();

        assert_eq!(original.len(), 3 + 2);
        assert_eq!(copy.len(), 4 + 4);
    }
}
