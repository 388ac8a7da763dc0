use super::ConfigurationError;
use crate::environment::ActionMode;

use serde::{Deserialize, Serialize};

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]; [`validate`]
/// rejects configurations where they are not.
///
/// [`validate`]: PopulationConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: usize,
    /// Genetic distance threshold, beyond which
    /// genomes are considered as belonging to
    /// different species.
    pub compatibility_threshold: f32,
    /// Top fraction of each species which survives
    /// culling and can participate in mating.
    pub survival_threshold: f32,
    /// Chance that the second parent is drawn from
    /// the whole surviving population instead of
    /// the child's own species.
    pub interspecies_mating_chance: f32,
    /// Chance that the second parent is the
    /// population champion.
    pub champion_mating_chance: f32,
    /// Number of episodes each creature plays per generation.
    pub episodes_per_generation: usize,
    /// Maximum number of steps in an episode.
    pub steps_per_episode: usize,
    /// How phenotype outputs are turned into actions.
    pub action_mode: ActionMode,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, and the action mode is
    /// [`Discrete`].
    ///
    /// # Note
    /// This value is not valid. It is meant as a way
    /// to abbreviate configuration instantiation.
    ///
    /// [`Discrete`]: ActionMode::Discrete
    ///
    /// # Examples
    /// ```
    /// use neatgym::populations::PopulationConfig;
    ///
    /// let config = PopulationConfig {
    ///     size: 150,
    ///     compatibility_threshold: 3.0,
    ///     survival_threshold: 0.3,
    ///     episodes_per_generation: 1,
    ///     steps_per_episode: 200,
    ///     ..PopulationConfig::zero()
    /// };
    /// assert!(config.validate().is_ok());
    /// assert!(PopulationConfig::zero().validate().is_err());
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: 0,
            compatibility_threshold: 0.0,
            survival_threshold: 0.0,
            interspecies_mating_chance: 0.0,
            champion_mating_chance: 0.0,
            episodes_per_generation: 0,
            steps_per_episode: 0,
            action_mode: ActionMode::Discrete,
        }
    }

    /// Checks that counts are nonzero, thresholds positive
    /// and probabilities in [0, 1].
    ///
    /// # Errors
    /// Returns the first offending field.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let counts = [
            ("size", self.size),
            ("episodes_per_generation", self.episodes_per_generation),
            ("steps_per_episode", self.steps_per_episode),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(ConfigurationError::ZeroValue(name));
            }
        }

        let thresholds = [
            ("compatibility_threshold", self.compatibility_threshold),
            ("survival_threshold", self.survival_threshold),
        ];
        for (name, value) in thresholds {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigurationError::NonPositiveThreshold(name, value));
            }
        }

        let probabilities = [
            ("survival_threshold", self.survival_threshold),
            ("interspecies_mating_chance", self.interspecies_mating_chance),
            ("champion_mating_chance", self.champion_mating_chance),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::ProbabilityOutOfRange(name, value));
            }
        }

        Ok(())
    }
}
