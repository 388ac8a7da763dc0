use super::{FitnessError, SpeciesId};
use crate::environment::{Action, ActionMode};
use crate::genomics::{GeneticConfig, Genome};
use crate::networks::Phenotype;

use serde::{Deserialize, Serialize};

/// A single individual of a population: a genome, the network
/// expressed from it, and the fitness it earned this generation.
///
/// The phenotype is built on first use and kept until the
/// creature is replaced, so recurrent state can be carried
/// across the steps of an episode.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(into = "CreatureRecord", from = "CreatureRecord")]
pub struct Creature {
    genome: Genome,
    phenotype: Option<Phenotype>,
    fitness: Option<f32>,
    adjusted_fitness: f32,
    species: Option<SpeciesId>,
}

/// Serialized form of a creature.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatureRecord {
    pub genome: Genome,
    pub fitness: Option<f32>,
}

impl Creature {
    /// Wraps a genome into a fresh creature with no fitness
    /// and no species.
    pub fn new(genome: Genome) -> Creature {
        Creature {
            genome,
            phenotype: None,
            fitness: None,
            adjusted_fitness: 0.0,
            species: None,
        }
    }

    /// Returns the creature's genome.
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Returns the creature's network, building it first if needed.
    pub fn phenotype(&mut self, config: &GeneticConfig) -> &mut Phenotype {
        let genome = &self.genome;
        self.phenotype
            .get_or_insert_with(|| Phenotype::build(genome, config))
    }

    /// Chooses an action in response to an observation: the index
    /// of the largest output in [`Discrete`] mode, or the outputs
    /// themselves in [`Continuous`] mode.
    ///
    /// [`Discrete`]: ActionMode::Discrete
    /// [`Continuous`]: ActionMode::Continuous
    ///
    /// # Panics
    /// Panics if the observation size is not the genome's input count.
    pub fn get_action(
        &mut self,
        observation: &[f32],
        mode: ActionMode,
        config: &GeneticConfig,
    ) -> Action {
        let phenotype = self.phenotype(config);
        match mode {
            ActionMode::Discrete => Action::Discrete(phenotype.argmax(observation)),
            ActionMode::Continuous => Action::Continuous(phenotype.compute(observation)),
        }
    }

    /// Returns the creature's fitness, if evaluated.
    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    /// Sets the creature's fitness for this generation.
    ///
    /// # Errors
    /// Returns an error if the fitness was already set,
    /// or is negative or NaN.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use neatgym::populations::{Creature, FitnessError};
    ///
    /// let genome = Genome::genesis(&GeneticConfig::zero(), &mut InnovationRegistry::new());
    /// let mut creature = Creature::new(genome);
    ///
    /// assert_eq!(creature.set_fitness(-1.0), Err(FitnessError::Negative(-1.0)));
    /// creature.set_fitness(12.0).unwrap();
    /// assert_eq!(creature.set_fitness(13.0), Err(FitnessError::AlreadySet(12.0)));
    /// assert_eq!(creature.fitness(), Some(12.0));
    /// ```
    pub fn set_fitness(&mut self, fitness: f32) -> Result<(), FitnessError> {
        if let Some(current) = self.fitness {
            return Err(FitnessError::AlreadySet(current));
        }
        if fitness.is_nan() {
            return Err(FitnessError::NotANumber);
        }
        if fitness < 0.0 {
            return Err(FitnessError::Negative(fitness));
        }
        self.fitness = Some(fitness);
        Ok(())
    }

    /// Forgets the fitness of an aborted evaluation.
    pub(super) fn clear_fitness(&mut self) {
        self.fitness = None;
        self.adjusted_fitness = 0.0;
    }

    /// Returns the creature's fitness shared with its species.
    pub fn adjusted_fitness(&self) -> f32 {
        self.adjusted_fitness
    }

    pub(super) fn set_adjusted_fitness(&mut self, adjusted_fitness: f32) {
        self.adjusted_fitness = adjusted_fitness;
    }

    /// Returns the id of the species the creature was assigned to.
    pub fn species(&self) -> Option<SpeciesId> {
        self.species
    }

    pub(super) fn set_species(&mut self, species: SpeciesId) {
        self.species = Some(species);
    }

    /// Returns the genetic distance between two creatures.
    pub fn distance(&self, other: &Creature, config: &GeneticConfig) -> f32 {
        Genome::distance(&self.genome, &other.genome, config)
    }
}

impl From<Creature> for CreatureRecord {
    fn from(creature: Creature) -> Self {
        CreatureRecord {
            genome: creature.genome,
            fitness: creature.fitness,
        }
    }
}

impl From<CreatureRecord> for Creature {
    fn from(record: CreatureRecord) -> Self {
        Creature {
            fitness: record.fitness,
            ..Creature::new(record.genome)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::InnovationRegistry;
    use std::num::NonZeroUsize;

    fn creature(config: &GeneticConfig) -> Creature {
        Creature::new(Genome::genesis(config, &mut InnovationRegistry::new()))
    }

    #[test]
    fn rejects_nan_fitness() {
        let mut creature = creature(&GeneticConfig::zero());
        assert_eq!(creature.set_fitness(f32::NAN), Err(FitnessError::NotANumber));
        assert_eq!(creature.fitness(), None);
        assert!(creature.set_fitness(0.0).is_ok());
    }

    #[test]
    fn actions_follow_mode() {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(3).unwrap(),
            ..GeneticConfig::zero()
        };
        let mut creature = creature(&config);
        assert_eq!(
            creature.get_action(&[1.0, 1.0], ActionMode::Discrete, &config),
            Action::Discrete(0)
        );
        assert_eq!(
            creature.get_action(&[1.0, 1.0], ActionMode::Continuous, &config),
            Action::Continuous(vec![0.5; 3])
        );
    }

    #[test]
    fn record_keeps_genome_and_fitness() {
        let config = GeneticConfig {
            initial_expression_chance: 1.0,
            weight_bound: 1.0,
            ..GeneticConfig::zero()
        };
        let mut original = creature(&config);
        original.set_fitness(4.5).unwrap();
        original.set_species(SpeciesId(3));

        let json = serde_json::to_value(&original).unwrap();
        let decoded: Creature = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.fitness(), Some(4.5));
        assert_eq!(decoded.species(), None);
        assert_eq!(decoded.distance(&original, &config), 0.0);
    }
}
