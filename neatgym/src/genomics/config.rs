use crate::networks::ActivationType;
use crate::populations::ConfigurationError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]; [`validate`]
/// rejects configurations where they are not.
///
/// [`validate`]: GeneticConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Nonlinearity applied at every non-sensor node
    /// of the genome's phenotype.
    pub activation: ActivationType,
    /// Chance that a connection between a sensor-output pair
    /// is created during genesis.
    pub initial_expression_chance: f32,
    /// Maximum magnitude of a connection's weight.
    pub weight_bound: f32,
    /// Chance of a connection weight being reset during mutation.
    pub weight_reset_chance: f32,
    /// Chance of a connection weight being nudged during mutation, if not reset.
    pub weight_nudge_chance: f32,
    /// Magnitude of bound on weight nudge uniform distribution.
    /// It is assumed to be lesser than [`weight_bound`].
    ///
    /// [`weight_bound`]: GeneticConfig::weight_bound
    pub weight_mutation_power: f32,
    /// Chance of a node addition mutation taking place.
    pub node_addition_mutation_chance: f32,
    /// Chance of a connection addition mutation taking place.
    pub connection_addition_mutation_chance: f32,
    /// Maximum number of candidate input nodes tried by a connection
    /// addition mutation before it returns with failure.
    pub max_connection_addition_attempts: usize,
    /// Chance that a self-looping connection will be created during
    /// connection mutation, if possible.
    pub recursion_chance: f32,
    /// Chance that a child produced by crossover is mutated.
    pub child_mutation_chance: f32,
    /// Chance that matched connection weights are averaged during crossover,
    /// instead of copying the gene from a randomly chosen parent.
    pub mate_by_averaging_chance: f32,
    /// Chance that a matched connection disabled in the inherited copy
    /// is re-enabled, when the other parent has it enabled.
    pub reenable_chance: f32,
    /// Weight of excess genes in genetic distance.
    pub excess_gene_factor: f32,
    /// Weight of disjoint genes in genetic distance.
    pub disjoint_gene_factor: f32,
    /// Weight of the matched gene weight difference average in genetic distance.
    pub common_weight_factor: f32,
    /// Genome length above which excess and disjoint counts
    /// are divided by the larger genome's length.
    pub size_normalization_threshold: usize,
    /// Number of propagation rounds used for networks containing cycles.
    pub recurrent_rounds: NonZeroUsize,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1. The activation is [`Sigmoid`].
    ///
    /// [`Sigmoid`]: crate::networks::ActivationType::Sigmoid
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::GeneticConfig;
    ///
    /// let config = GeneticConfig {
    ///     weight_bound: 5.0,
    ///     ..GeneticConfig::zero()
    /// };
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(1).unwrap(),
            output_count: NonZeroUsize::new(1).unwrap(),
            activation: ActivationType::Sigmoid,
            initial_expression_chance: 0.0,
            weight_bound: 0.0,
            weight_reset_chance: 0.0,
            weight_nudge_chance: 0.0,
            weight_mutation_power: 0.0,
            node_addition_mutation_chance: 0.0,
            connection_addition_mutation_chance: 0.0,
            max_connection_addition_attempts: 0,
            recursion_chance: 0.0,
            child_mutation_chance: 0.0,
            mate_by_averaging_chance: 0.0,
            reenable_chance: 0.0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            common_weight_factor: 0.0,
            size_normalization_threshold: 0,
            recurrent_rounds: NonZeroUsize::new(1).unwrap(),
        }
    }

    /// Checks that every probability lies in [0, 1]
    /// and that magnitudes and coefficients are non-negative.
    ///
    /// # Errors
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let probabilities = [
            ("initial_expression_chance", self.initial_expression_chance),
            ("weight_reset_chance", self.weight_reset_chance),
            ("weight_nudge_chance", self.weight_nudge_chance),
            ("node_addition_mutation_chance", self.node_addition_mutation_chance),
            (
                "connection_addition_mutation_chance",
                self.connection_addition_mutation_chance,
            ),
            ("recursion_chance", self.recursion_chance),
            ("child_mutation_chance", self.child_mutation_chance),
            ("mate_by_averaging_chance", self.mate_by_averaging_chance),
            ("reenable_chance", self.reenable_chance),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::ProbabilityOutOfRange(name, value));
            }
        }

        let magnitudes = [
            ("weight_bound", self.weight_bound),
            ("weight_mutation_power", self.weight_mutation_power),
            ("excess_gene_factor", self.excess_gene_factor),
            ("disjoint_gene_factor", self.disjoint_gene_factor),
            ("common_weight_factor", self.common_weight_factor),
        ];
        for (name, value) in magnitudes {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigurationError::NegativeValue(name, value));
            }
        }

        Ok(())
    }
}
