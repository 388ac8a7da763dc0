use crate::genomics::GeneticConfig;
use crate::Innovation;

use std::fmt;
use std::hash::{Hash, Hasher};

use rand::{thread_rng, Rng};

/// Connection genes are the principal components of genomes.
/// They are created between two nodes, and become
/// weighted edges in the genome's phenotype.
///
/// A gene's identity is its innovation number: two
/// genes compare equal (and hash equally) iff they
/// share one, regardless of weight or enabled status.
#[derive(Clone, Debug)]
pub struct ConnectionGene {
    innovation: Innovation,
    input: Innovation,
    output: Innovation,
    weight: f32,
    enabled: bool,
}

impl ConnectionGene {
    /// Returns a new _enabled_ gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(42, 3, 9, 2.0);
    /// assert!(gene.enabled());
    /// ```
    pub fn new(
        innovation: Innovation,
        input: Innovation,
        output: Innovation,
        weight: f32,
    ) -> ConnectionGene {
        ConnectionGene {
            innovation,
            input,
            output,
            weight,
            enabled: true,
        }
    }

    /// Returns a random weight. Uses a uniform distribution
    /// over the range ±[`weight_bound`].
    ///
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    pub(super) fn random_weight(config: &GeneticConfig) -> f32 {
        if config.weight_bound > 0.0 {
            thread_rng().gen_range(-config.weight_bound..=config.weight_bound)
        } else {
            0.0
        }
    }

    /// Randomizes the gene's weight. Uses a uniform
    /// distribution over the range ±[`weight_bound`].
    ///
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{ConnectionGene, GeneticConfig};
    ///
    /// let mut gene = ConnectionGene::new(42, 3, 9, 2.0);
    ///
    /// gene.randomize_weight(&GeneticConfig {
    ///     weight_bound: 5.0,
    ///     ..GeneticConfig::zero()
    /// });
    ///
    /// assert!(gene.weight().abs() <= 5.0);
    /// ```
    pub fn randomize_weight(&mut self, config: &GeneticConfig) {
        self.weight = Self::random_weight(config);
    }

    /// Nudges the gene's weight by a random amount. Uses
    /// a uniform distribution over the range ±[`weight_mutation_power`].
    /// If the weight's magnitude would exceed the [`weight_bound`],
    /// the weight is set to the maximum magnitude with the same
    /// sign.
    ///
    /// [`weight_mutation_power`]: crate::genomics::GeneticConfig::weight_mutation_power
    /// [`weight_bound`]: crate::genomics::GeneticConfig::weight_bound
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{ConnectionGene, GeneticConfig};
    ///
    /// let mut gene = ConnectionGene::new(42, 3, 9, 3.0);
    ///
    /// gene.nudge_weight(&GeneticConfig {
    ///     weight_mutation_power: 2.5,
    ///     weight_bound: 5.0,
    ///     ..GeneticConfig::zero()
    /// });
    ///
    /// assert!((gene.weight() - 3.0).abs() <= 2.5);
    /// assert!(gene.weight().abs() <= 5.0);
    /// ```
    pub fn nudge_weight(&mut self, config: &GeneticConfig) {
        if config.weight_mutation_power > 0.0 {
            let power = config.weight_mutation_power;
            self.weight += thread_rng().gen_range(-power..=power);
        }
        self.weight = self.weight.clamp(-config.weight_bound, config.weight_bound);
    }

    /// Returns the gene's innovation number.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(gene.innovation(), 42);
    /// ```
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the id of the gene's input node.
    pub fn input(&self) -> Innovation {
        self.input
    }

    /// Returns the id of the gene's output node.
    pub fn output(&self) -> Innovation {
        self.output
    }

    /// Returns the gene's weight.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Sets the gene's weight.
    pub fn set_weight(&mut self, w: f32) {
        self.weight = w;
    }

    /// Returns whether the gene is expressed in the phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the gene's expression status.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::ConnectionGene;
    ///
    /// let mut gene = ConnectionGene::new(42, 3, 9, 2.0);
    /// gene.set_enabled(false);
    ///
    /// assert!(!gene.enabled());
    /// ```
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns the gene's input and output node ids.
    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.input, self.output)
    }
}

impl PartialEq for ConnectionGene {
    fn eq(&self, other: &Self) -> bool {
        self.innovation == other.innovation
    }
}

impl Eq for ConnectionGene {}

impl Hash for ConnectionGene {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.innovation.hash(state);
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.input,
            self.output,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}
