//! A Phenotype is the evaluable network compiled from
//! a Genome, with disabled connections being ignored.
//! Connection genes become weighted edges, and node
//! genes become network nodes.
//!
//! Nodes are evaluated in a fixed order computed at build
//! time: sensors are skipped, and the remaining nodes are
//! sorted topologically (Kahn's algorithm), always taking
//! the ready node with the smallest id. When a cycle blocks
//! progress, the smallest-id pending node is forced next.
//!
//! A network that never needed forcing is acyclic and is
//! evaluated in a single pass. Otherwise it is evaluated in
//! [`recurrent_rounds`] passes over one activation buffer
//! that is updated in place: a node reads the current-pass
//! value of sources already evaluated in this pass, and the
//! previous pass's value of all others. The buffer persists
//! between calls, carrying recurrent state until [`reset`].
//!
//! [`recurrent_rounds`]: crate::genomics::GeneticConfig::recurrent_rounds
//! [`reset`]: Phenotype::reset
mod connection;

use crate::genomics::{GeneticConfig, Genome, NodeKind};
use crate::Innovation;
use connection::Connection;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::ops::RangeInclusive;

/// Nonlinearity applied at every non-sensor node of a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationType {
    /// Steepened logistic function, `1 / (1 + e^(-4.9x))`.
    Sigmoid,
    /// Hyperbolic tangent.
    Tanh,
    /// `e^(-x²)`.
    Gaussian,
    /// `x`.
    Identity,
}

impl ActivationType {
    /// Applies the function to the passed value.
    ///
    /// # Examples
    /// ```
    /// use neatgym::networks::ActivationType;
    ///
    /// assert_eq!(ActivationType::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(ActivationType::Identity.apply(-3.0), -3.0);
    /// ```
    pub fn apply(&self, x: f32) -> f32 {
        match self {
            ActivationType::Sigmoid => 1.0 / (1.0 + (-4.9 * x).exp()),
            ActivationType::Tanh => x.tanh(),
            ActivationType::Gaussian => (-x.powi(2)).exp(),
            ActivationType::Identity => x,
        }
    }

    /// Returns the closed range of values the function can produce.
    pub fn range(&self) -> RangeInclusive<f32> {
        match self {
            ActivationType::Sigmoid => 0.0..=1.0,
            ActivationType::Tanh => -1.0..=1.0,
            ActivationType::Gaussian => 0.0..=1.0,
            ActivationType::Identity => f32::NEG_INFINITY..=f32::INFINITY,
        }
    }
}

/// An arbitrarily-structured neural network,
/// possibly containing cycles.
#[derive(Clone, Debug)]
pub struct Phenotype {
    sensor_count: usize,
    output_count: usize,
    node_ids: Box<[Innovation]>,
    order: Box<[usize]>,
    incoming: Box<[Box<[Connection]>]>,
    activations: Box<[f32]>,
    activation: ActivationType,
    recurrent: bool,
    rounds: usize,
}

impl Phenotype {
    /// Compiles the passed genome into a network, using the
    /// configured activation function and number of recurrent rounds.
    ///
    /// # Panics
    /// Panics if a connection references a node absent from the
    /// genome. Genomes uphold this on every edit, so this only
    /// happens on a broken invariant.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use neatgym::networks::Phenotype;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_expression_chance: 1.0,
    ///     weight_bound: 5.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// let genome = Genome::genesis(&config, &mut InnovationRegistry::new());
    ///
    /// let mut network = Phenotype::build(&genome, &config);
    /// assert!(!network.is_recurrent());
    /// assert_eq!(network.compute(&[1.0, 0.0, -1.0]).len(), 2);
    /// ```
    pub fn build(genome: &Genome, config: &GeneticConfig) -> Phenotype {
        let sensors = genome.node_ids(NodeKind::Sensor);
        let outputs = genome.node_ids(NodeKind::Output);
        let hidden = genome.node_ids(NodeKind::Hidden);
        let node_ids: Vec<Innovation> = sensors
            .iter()
            .chain(&outputs)
            .chain(&hidden)
            .copied()
            .collect();
        let index_of: HashMap<Innovation, usize, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();

        let mut incoming = vec![vec![]; node_ids.len()];
        let mut successors = vec![vec![]; node_ids.len()];
        let mut blocking = vec![0usize; node_ids.len()];
        for gene in genome.connections().filter(|c| c.enabled()) {
            let source = index_of[&gene.input()];
            let target = index_of[&gene.output()];
            incoming[target].push(Connection::new(source, gene.weight()));
            if source >= sensors.len() {
                successors[source].push(target);
                blocking[target] += 1;
            }
        }
        // Fixed summation order, independent of gene iteration order.
        for edges in incoming.iter_mut() {
            edges.sort_unstable_by_key(|c| c.source);
        }

        let (order, recurrent) = evaluation_order(&node_ids, sensors.len(), &successors, blocking);

        Phenotype {
            sensor_count: sensors.len(),
            output_count: outputs.len(),
            activations: vec![0.0; node_ids.len()].into(),
            node_ids: node_ids.into(),
            order: order.into(),
            incoming: incoming.into_iter().map(|v| v.into()).collect(),
            activation: config.activation,
            recurrent,
            rounds: if recurrent {
                config.recurrent_rounds.get()
            } else {
                1
            },
        }
    }

    /// Feeds the inputs to the sensors (in ascending id order),
    /// propagates them through the network, and returns the
    /// output values (in ascending output id order).
    ///
    /// # Panics
    /// Panics if the number of inputs is not the number of sensors.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use neatgym::networks::{ActivationType, Phenotype};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     activation: ActivationType::Identity,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = InnovationRegistry::new();
    /// let mut genome = Genome::genesis(&config, &mut registry);
    /// genome.add_connection(&mut registry, 0, 2, 2.5).unwrap();
    /// genome.add_connection(&mut registry, 1, 2, -2.5).unwrap();
    ///
    /// let mut network = Phenotype::build(&genome, &config);
    /// assert_eq!(network.compute(&[0.5, 1.0]), vec![0.5 * 2.5 + 1.0 * -2.5]);
    /// ```
    pub fn compute(&mut self, inputs: &[f32]) -> Vec<f32> {
        assert_eq!(
            inputs.len(),
            self.sensor_count,
            "network expects {} inputs",
            self.sensor_count
        );
        self.activations[..self.sensor_count].copy_from_slice(inputs);
        for _ in 0..self.rounds {
            for &node in self.order.iter() {
                let sum: f32 = self.incoming[node]
                    .iter()
                    .map(|c| self.activations[c.source] * c.weight)
                    .sum();
                self.activations[node] = self.activation.apply(sum);
            }
        }
        self.outputs()
    }

    /// Computes the outputs for the passed inputs and returns
    /// the index of the largest one. The first maximum wins ties.
    pub fn argmax(&mut self, inputs: &[f32]) -> usize {
        let outputs = self.compute(inputs);
        let mut best = 0;
        for (i, value) in outputs.iter().enumerate().skip(1) {
            if *value > outputs[best] {
                best = i;
            }
        }
        best
    }

    /// Returns the current output values.
    pub fn outputs(&self) -> Vec<f32> {
        self.activations[self.sensor_count..self.sensor_count + self.output_count].to_vec()
    }

    /// Clears the carried activation state of all nodes.
    pub fn reset(&mut self) {
        self.activations.iter_mut().for_each(|a| *a = 0.0);
    }

    /// Returns whether the network contains a cycle.
    pub fn is_recurrent(&self) -> bool {
        self.recurrent
    }

    /// Returns the node ids in evaluation order.
    pub fn evaluation_order(&self) -> Vec<Innovation> {
        self.order.iter().map(|i| self.node_ids[*i]).collect()
    }
}

/// Orders the non-sensor nodes topologically, taking ready
/// nodes by ascending id and forcing the smallest-id pending
/// node whenever a cycle blocks progress. Returns the order
/// and whether any node had to be forced.
fn evaluation_order(
    node_ids: &[Innovation],
    sensor_count: usize,
    successors: &[Vec<usize>],
    mut blocking: Vec<usize>,
) -> (Vec<usize>, bool) {
    let mut pending: BTreeSet<(Innovation, usize)> = (sensor_count..node_ids.len())
        .map(|i| (node_ids[i], i))
        .collect();
    let mut ready: BTreeSet<(Innovation, usize)> = pending
        .iter()
        .copied()
        .filter(|(_, i)| blocking[*i] == 0)
        .collect();

    let mut order = Vec::with_capacity(pending.len());
    let mut forced = false;
    while let Some(&first_pending) = pending.iter().next() {
        let next = match ready.iter().next() {
            Some(&next) => next,
            None => {
                forced = true;
                first_pending
            }
        };
        ready.remove(&next);
        pending.remove(&next);
        order.push(next.1);

        for &successor in &successors[next.1] {
            let key = (node_ids[successor], successor);
            if pending.contains(&key) {
                blocking[successor] -= 1;
                if blocking[successor] == 0 {
                    ready.insert(key);
                }
            }
        }
    }

    (order, forced)
}

impl fmt::Display for Phenotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::InnovationRegistry;
    use std::num::NonZeroUsize;

    fn sigmoid(x: f32) -> f32 {
        1.0 / (1.0 + (-4.9 * x).exp())
    }

    fn single_io() -> (Genome, InnovationRegistry) {
        let mut registry = InnovationRegistry::new();
        let genome = Genome::genesis(&GeneticConfig::zero(), &mut registry);
        (genome, registry)
    }

    #[test]
    fn disabled_connections_are_ignored() {
        let (mut genome, mut registry) = single_io();
        genome.add_node(2, NodeKind::Hidden).unwrap();
        genome.add_connection(&mut registry, 0, 2, 1.0).unwrap();
        genome.add_connection(&mut registry, 2, 1, 1.0).unwrap();
        genome.add_connection(&mut registry, 0, 1, 1.0).unwrap();
        let mut record = crate::genomics::GenomeRecord::from(&genome);
        record.connections[2].enabled = false;
        let genome = Genome::try_from(record).unwrap();

        let network = Phenotype::build(&genome, &GeneticConfig::zero());
        assert_eq!(network.incoming[1].len(), 1);
        assert_eq!(network.evaluation_order(), vec![2, 1]);
    }

    #[test]
    fn compute_empty() {
        let (genome, _) = single_io();
        let mut network = Phenotype::build(&genome, &GeneticConfig::zero());
        assert!((0..10).all(|_| network.compute(&[1.0])[0] == sigmoid(0.0)));
    }

    #[test]
    fn compute_single() {
        let (mut genome, mut registry) = single_io();
        genome.add_connection(&mut registry, 0, 1, 1.0).unwrap();
        let mut network = Phenotype::build(&genome, &GeneticConfig::zero());
        for input in -20..=20 {
            let input = input as f32 / 10.0;
            assert_eq!(network.compute(&[input])[0], sigmoid(input));
        }
    }

    #[test]
    fn acyclic_chain_resolves_in_one_call() {
        let (mut genome, mut registry) = single_io();
        genome.add_node(2, NodeKind::Hidden).unwrap();
        genome.add_node(3, NodeKind::Hidden).unwrap();
        genome.add_connection(&mut registry, 0, 3, 1.0).unwrap();
        genome.add_connection(&mut registry, 3, 2, 1.0).unwrap();
        genome.add_connection(&mut registry, 2, 1, 1.0).unwrap();
        let config = GeneticConfig {
            recurrent_rounds: NonZeroUsize::new(5).unwrap(),
            ..GeneticConfig::zero()
        };
        let mut network = Phenotype::build(&genome, &config);

        assert!(!network.is_recurrent());
        assert_eq!(network.evaluation_order(), vec![3, 2, 1]);
        assert_eq!(network.compute(&[0.3])[0], sigmoid(sigmoid(sigmoid(0.3))));
    }

    #[test]
    fn self_loop_carries_state() {
        let (mut genome, mut registry) = single_io();
        genome.add_connection(&mut registry, 0, 1, 1.0).unwrap();
        genome.add_connection(&mut registry, 1, 1, -1.0).unwrap();
        let mut network = Phenotype::build(&genome, &GeneticConfig::zero());
        assert!(network.is_recurrent());

        let mut previous = 0.0;
        for input in -20..=20 {
            let input = input as f32 / 10.0;
            let output = network.compute(&[input])[0];
            assert_eq!(output, sigmoid(input - previous));
            previous = output;
        }

        network.reset();
        assert_eq!(network.compute(&[0.5])[0], sigmoid(0.5));
    }

    #[test]
    fn cycle_forces_smallest_id_and_uses_rounds() {
        let (mut genome, mut registry) = single_io();
        genome.add_node(2, NodeKind::Hidden).unwrap();
        genome.add_node(3, NodeKind::Hidden).unwrap();
        genome.add_connection(&mut registry, 0, 2, 1.0).unwrap();
        genome.add_connection(&mut registry, 2, 3, 1.0).unwrap();
        genome.add_connection(&mut registry, 3, 2, 1.0).unwrap();
        genome.add_connection(&mut registry, 3, 1, 1.0).unwrap();
        let config = GeneticConfig {
            recurrent_rounds: NonZeroUsize::new(2).unwrap(),
            ..GeneticConfig::zero()
        };
        let mut network = Phenotype::build(&genome, &config);
        assert_eq!(network.evaluation_order(), vec![1, 2, 3]);

        // Output 1 is forced first, reading node 3 from the previous pass.
        let h2 = sigmoid(1.0);
        let h3 = sigmoid(h2);
        let round_one = (sigmoid(0.0), h2, h3);
        let o = sigmoid(round_one.2);
        let h2 = sigmoid(1.0 + round_one.2);
        let h3 = sigmoid(h2);
        assert_eq!(network.compute(&[1.0]), vec![o]);
        assert_eq!(network.activations[2..], [h2, h3]);
    }

    #[test]
    fn rebuilt_networks_are_deterministic() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            initial_expression_chance: 1.0,
            weight_bound: 3.0,
            max_connection_addition_attempts: 10,
            recursion_chance: 0.3,
            recurrent_rounds: NonZeroUsize::new(3).unwrap(),
            ..GeneticConfig::zero()
        };
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::genesis(&config, &mut registry);
        for _ in 0..6 {
            let _ = genome.mutate_add_node(&mut registry);
            let _ = genome.mutate_add_connection(&mut registry, &config);
        }

        let mut a = Phenotype::build(&genome, &config);
        let mut b = Phenotype::build(&genome.clone(), &config);
        for step in 0..10 {
            let inputs = [step as f32 * 0.1, -0.5, 1.0];
            assert_eq!(a.compute(&inputs), b.compute(&inputs));
        }
    }

    #[test]
    fn outputs_lie_within_activation_range() {
        for activation in [
            ActivationType::Sigmoid,
            ActivationType::Tanh,
            ActivationType::Gaussian,
            ActivationType::Identity,
        ] {
            let config = GeneticConfig {
                input_count: NonZeroUsize::new(4).unwrap(),
                output_count: NonZeroUsize::new(3).unwrap(),
                activation,
                initial_expression_chance: 0.7,
                weight_bound: 4.0,
                max_connection_addition_attempts: 10,
                recursion_chance: 0.5,
                recurrent_rounds: NonZeroUsize::new(3).unwrap(),
                ..GeneticConfig::zero()
            };
            let mut registry = InnovationRegistry::new();
            let mut genome = Genome::genesis(&config, &mut registry);
            for _ in 0..10 {
                let _ = genome.mutate_add_node(&mut registry);
                let _ = genome.mutate_add_connection(&mut registry, &config);
            }

            let mut network = Phenotype::build(&genome, &config);
            for step in -5..5 {
                let x = step as f32;
                for output in network.compute(&[x, -x, x * 0.5, 1.0]) {
                    assert!(activation.range().contains(&output), "{:?}: {}", activation, output);
                }
            }
        }
    }

    #[test]
    fn argmax_prefers_first_maximum() {
        let config = GeneticConfig {
            output_count: NonZeroUsize::new(3).unwrap(),
            activation: ActivationType::Identity,
            ..GeneticConfig::zero()
        };
        let mut registry = InnovationRegistry::new();
        let mut genome = Genome::genesis(&config, &mut registry);
        let mut network = Phenotype::build(&genome, &config);
        assert_eq!(network.argmax(&[1.0]), 0);

        genome.add_connection(&mut registry, 0, 2, 1.0).unwrap();
        genome.add_connection(&mut registry, 0, 3, 1.0).unwrap();
        let mut network = Phenotype::build(&genome, &config);
        assert_eq!(network.argmax(&[1.0]), 1);
        assert_eq!(network.argmax(&[-1.0]), 0);
    }

    #[test]
    #[should_panic]
    fn wrong_input_count_panics() {
        let (genome, _) = single_io();
        Phenotype::build(&genome, &GeneticConfig::zero()).compute(&[1.0, 2.0]);
    }
}
