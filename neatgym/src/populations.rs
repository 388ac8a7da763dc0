//! A Population is a collection of creatures.
//! These are grouped into species, which can
//! be evolved using environment rewards or any
//! other fitness measure as the source of selective
//! pressure.
mod config;
mod creature;
mod errors;
pub mod logging;
mod names;
mod offspring_factory;
mod species;

pub use config::PopulationConfig;
pub use creature::{Creature, CreatureRecord};
pub use errors::*;
pub use species::{Species, SpeciesId, SpeciesRecord};

use crate::environment::{run_episodes, Environment};
use crate::genomics::{GeneticConfig, Genome, InnovationRegistry};
use species::{best_by_fitness, compare_fitness};

use rayon::prelude::*;

use std::num::NonZeroUsize;

/// A population of creatures, together with the species
/// they are grouped into and the innovation registry
/// shared by all their genomes.
///
/// Each generation, every creature must be evaluated
/// (see [`evaluate_fitness`], [`evaluate_in`] and
/// [`par_evaluate_in`]) before calling [`evolve`].
///
/// [`evaluate_fitness`]: Population::evaluate_fitness
/// [`evaluate_in`]: Population::evaluate_in
/// [`par_evaluate_in`]: Population::par_evaluate_in
/// [`evolve`]: Population::evolve
#[derive(Clone, Debug)]
pub struct Population {
    creatures: Vec<Creature>,
    species: Vec<Species>,
    registry: InnovationRegistry,
    generation: usize,
    historical_species_count: usize,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
}

impl Population {
    /// Creates a new population of genesis genomes
    /// using the passed configurations.
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::GeneticConfig;
    /// use neatgym::populations::{Population, PopulationConfig};
    ///
    /// let population_config = PopulationConfig {
    ///     size: 150,
    ///     compatibility_threshold: 3.0,
    ///     survival_threshold: 0.3,
    ///     episodes_per_generation: 1,
    ///     steps_per_episode: 500,
    ///     ..PopulationConfig::zero()
    /// };
    /// let population = Population::new(population_config, GeneticConfig::zero()).unwrap();
    ///
    /// assert_eq!(population.creatures().count(), 150);
    /// assert_eq!(population.species().count(), 0);
    /// assert!(Population::new(PopulationConfig::zero(), GeneticConfig::zero()).is_err());
    /// ```
    pub fn new(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
    ) -> Result<Population, ConfigurationError> {
        population_config.validate()?;
        genetic_config.validate()?;

        let mut registry = InnovationRegistry::new();
        let creatures = (0..population_config.size)
            .map(|_| Creature::new(Genome::genesis(&genetic_config, &mut registry)))
            .collect();

        Ok(Population {
            creatures,
            species: vec![],
            registry,
            generation: 0,
            historical_species_count: 0,
            population_config,
            genetic_config,
        })
    }

    /// Creates a new population whose genomes have as many
    /// sensors as `env`'s observations hold values, and as
    /// many outputs as it has actions.
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid, or
    /// the environment has empty observations or actions.
    pub fn for_environment<E: Environment>(
        env: &E,
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
    ) -> Result<Population, ConfigurationError> {
        let genetic_config = GeneticConfig {
            input_count: NonZeroUsize::new(env.observation_size())
                .ok_or(ConfigurationError::ZeroValue("observation_size"))?,
            output_count: NonZeroUsize::new(env.action_size())
                .ok_or(ConfigurationError::ZeroValue("action_size"))?,
            ..genetic_config
        };
        Population::new(population_config, genetic_config)
    }

    /// Evaluates the fitness of each creature in the
    /// population using the passed evaluator.
    ///
    /// The return value of the evaluation function
    /// should be non-negative.
    ///
    /// # Errors
    /// Returns an error if a fitness is rejected, i.e. it is
    /// negative, NaN, or the creature was already evaluated.
    /// A failed evaluation discards every fitness set during
    /// this generation, so it can be run again.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::GeneticConfig;
    /// use neatgym::populations::{Population, PopulationConfig};
    ///
    /// # let population_config = PopulationConfig {
    /// #     size: 20,
    /// #     compatibility_threshold: 3.0,
    /// #     survival_threshold: 0.3,
    /// #     episodes_per_generation: 1,
    /// #     steps_per_episode: 1,
    /// #     ..PopulationConfig::zero()
    /// # };
    /// let mut population = Population::new(population_config, GeneticConfig::zero()).unwrap();
    ///
    /// population.evaluate_fitness(|creature, config| {
    ///     // Networks with outputs closer to 0 are given higher scores.
    ///     let output = creature.phenotype(config).compute(&[1.0])[0];
    ///     (1.0 - output).powi(2)
    /// }).unwrap();
    ///
    /// assert!(population.creatures().all(|c| c.fitness().is_some()));
    /// ```
    pub fn evaluate_fitness<F>(&mut self, mut evaluator: F) -> Result<(), EvaluationError>
    where
        F: FnMut(&mut Creature, &GeneticConfig) -> f32,
    {
        let genetic_config = &self.genetic_config;
        let result = self
            .creatures
            .iter_mut()
            .enumerate()
            .try_for_each(|(index, creature)| {
                let fitness = evaluator(creature, genetic_config);
                creature
                    .set_fitness(fitness)
                    .map_err(|source| EvaluationError::Fitness { creature: index, source })
            });
        self.discard_fitness_on_error(result)
    }

    /// Evaluates every creature in `env`, sequentially, for the
    /// configured number of episodes and steps. Each creature's
    /// fitness is the mean total reward of its episodes.
    ///
    /// # Errors
    /// Returns an error as soon as the environment fails or
    /// a fitness is rejected. No creature keeps a fitness then.
    pub fn evaluate_in<E: Environment>(&mut self, env: &mut E) -> Result<(), EvaluationError> {
        let (genetic_config, population_config) = (&self.genetic_config, &self.population_config);
        let result = self
            .creatures
            .iter_mut()
            .enumerate()
            .try_for_each(|(index, creature)| {
                evaluate_creature(index, creature, env, genetic_config, population_config)
            });
        self.discard_fitness_on_error(result)
    }

    /// Evaluates every creature in parallel, each in its own
    /// environment created by `factory`.
    ///
    /// # Errors
    /// Returns an error if any environment fails or
    /// any fitness is rejected. No creature keeps a fitness then.
    pub fn par_evaluate_in<E, F>(&mut self, factory: F) -> Result<(), EvaluationError>
    where
        E: Environment,
        F: Fn() -> E + Sync,
    {
        let (genetic_config, population_config) = (&self.genetic_config, &self.population_config);
        let result = self
            .creatures
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(index, creature)| {
                let mut env = factory();
                evaluate_creature(index, creature, &mut env, genetic_config, population_config)
            });
        self.discard_fitness_on_error(result)
    }

    /// Aborts the generation's evaluation if `result` is an error.
    fn discard_fitness_on_error(
        &mut self,
        result: Result<(), EvaluationError>,
    ) -> Result<(), EvaluationError> {
        if let Err(error) = &result {
            log::warn!("generation {}: evaluation aborted: {}", self.generation, error);
            self.creatures.iter_mut().for_each(Creature::clear_fitness);
        }
        result
    }

    /// Advances the population to the next generation:
    /// creatures are assigned to species, their fitness is
    /// shared within them, each species is allotted a number of
    /// offspring and culled, the offspring are bred, and
    /// species allotted no offspring are dropped as extinct.
    ///
    /// # Errors
    /// Returns an error if any creature has not been evaluated,
    /// or if the population is, or becomes, empty.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::GeneticConfig;
    /// use neatgym::populations::{EvolutionError, Population, PopulationConfig};
    ///
    /// # let population_config = PopulationConfig {
    /// #     size: 30,
    /// #     compatibility_threshold: 3.0,
    /// #     survival_threshold: 0.3,
    /// #     episodes_per_generation: 1,
    /// #     steps_per_episode: 1,
    /// #     ..PopulationConfig::zero()
    /// # };
    /// let mut population = Population::new(population_config, GeneticConfig::zero()).unwrap();
    /// assert_eq!(population.evolve(), Err(EvolutionError::MissingFitness(0)));
    ///
    /// population.evaluate_fitness(|_, _| 1.0).unwrap();
    /// population.evolve().unwrap();
    /// assert_eq!(population.generation(), 1);
    /// assert_eq!(population.creatures().count(), 30);
    /// ```
    pub fn evolve(&mut self) -> Result<(), EvolutionError> {
        if self.creatures.is_empty() {
            return Err(EvolutionError::Extinction);
        }
        if let Some(index) = self.creatures.iter().position(|c| c.fitness().is_none()) {
            return Err(EvolutionError::MissingFitness(index));
        }

        self.speciate_all();
        for species in &mut self.species {
            species.adjust_fitness();
        }
        let champion = best_by_fitness(self.species.iter().filter_map(Species::champion));
        if let Some(champion) = champion {
            log::info!(
                "generation {}: {} species, champion fitness {}",
                self.generation,
                self.species.iter().filter(|s| !s.is_empty()).count(),
                champion.fitness().unwrap_or(0.0)
            );
        }

        self.allot_offspring_quota();
        let survival_threshold = self.population_config.survival_threshold;
        for species in &mut self.species {
            species.cull_the_weak(survival_threshold);
        }
        self.reproduce();
        self.prune_extinct_species();
        self.generation += 1;

        if self.creatures.is_empty() {
            log::warn!("every species went extinct in generation {}", self.generation);
            return Err(EvolutionError::Extinction);
        }
        Ok(())
    }

    /// Rebuilds species memberships from the current creatures.
    fn speciate_all(&mut self) {
        for species in &mut self.species {
            species.clear_members();
        }
        for creature in std::mem::take(&mut self.creatures) {
            self.speciate(creature);
        }
    }

    /// Assigns a creature to the first compatible species,
    /// in order of founding, or founds a new one for it.
    fn speciate(&mut self, creature: Creature) -> SpeciesId {
        let threshold = self.population_config.compatibility_threshold;
        let config = &self.genetic_config;
        let compatible = self
            .species
            .iter()
            .position(|s| s.distance_to(creature.genome(), config) < threshold);

        match compatible {
            Some(index) => {
                self.species[index].add(creature);
                self.species[index].id()
            }
            None => {
                let id = SpeciesId(self.historical_species_count);
                self.historical_species_count += 1;
                let species = Species::new(id, creature);
                log::info!(
                    "species {} ({}) founded in generation {}",
                    id.0,
                    species.name(),
                    self.generation
                );
                self.species.push(species);
                id
            }
        }
    }

    /// Distributes the population size over the species
    /// proportionally to their mean fitness.
    fn allot_offspring_quota(&mut self) {
        let means: Vec<f32> = self.species.iter().map(Species::mean_fitness).collect();
        let populated: Vec<bool> = self.species.iter().map(|s| !s.is_empty()).collect();
        let mut ranking: Vec<usize> = (0..self.species.len()).collect();
        ranking.sort_by(|&a, &b| match (self.species[a].champion(), self.species[b].champion()) {
            (Some(a), Some(b)) => compare_fitness(b, a),
            (a, b) => b.is_some().cmp(&a.is_some()),
        });

        if means.iter().sum::<f32>() <= 0.0 {
            log::warn!(
                "generation {}: no species has positive fitness, sharing offspring equally",
                self.generation
            );
        }

        let quotas = allot_quotas(&means, &populated, &ranking, self.population_config.size);
        for (species, quota) in self.species.iter_mut().zip(quotas) {
            log::debug!(
                "species {} ({}): mean fitness {}, {} offspring",
                species.id().0,
                species.name(),
                species.mean_fitness(),
                quota
            );
            species.set_allotted_offspring_quota(quota);
        }
    }

    /// Replaces the creatures with every species' offspring.
    fn reproduce(&mut self) {
        let global_champion = best_by_fitness(self.species.iter().filter_map(Species::champion));
        let survivors: Vec<&Creature> = self.species.iter().flat_map(Species::members).collect();

        let mut offspring = Vec::with_capacity(self.population_config.size);
        for species in &self.species {
            offspring.extend(species.next_generation(
                global_champion,
                &survivors,
                &mut self.registry,
                &self.genetic_config,
                &self.population_config,
            ));
        }
        self.creatures = offspring;
    }

    /// Drops every species allotted no offspring,
    /// and ages the rest.
    fn prune_extinct_species(&mut self) {
        for species in &mut self.species {
            if species.allotted_offspring_quota() == 0 {
                species.mark_extinct();
                log::info!(
                    "species {} ({}) went extinct at age {}",
                    species.id().0,
                    species.name(),
                    species.age()
                );
            } else {
                species.grow_older();
            }
        }
        self.species.retain(|s| !s.is_extinct());
    }

    /// Resets the population to an initial randomized state,
    /// with a fresh innovation registry.
    /// Used primarily in case of population degeneration, e.g.
    /// when all creatures have a fitness score of 0.
    pub fn reset(&mut self) -> Result<(), ConfigurationError> {
        *self = Population::new(self.population_config.clone(), self.genetic_config.clone())?;
        Ok(())
    }

    /// Returns the best-performing evaluated creature, or,
    /// if none is evaluated yet, the best species champion
    /// of the previous generation.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::GeneticConfig;
    /// use neatgym::populations::{Population, PopulationConfig};
    ///
    /// # let population_config = PopulationConfig {
    /// #     size: 20,
    /// #     compatibility_threshold: 3.0,
    /// #     survival_threshold: 0.3,
    /// #     episodes_per_generation: 1,
    /// #     steps_per_episode: 1,
    /// #     ..PopulationConfig::zero()
    /// # };
    /// let mut population = Population::new(population_config, GeneticConfig::zero()).unwrap();
    /// assert!(population.champion().is_none());
    ///
    /// let mut fitness = 0.0;
    /// population.evaluate_fitness(|_, _| {
    ///     fitness += 10.0;
    ///     fitness
    /// }).unwrap();
    ///
    /// assert_eq!(population.champion().unwrap().fitness(), Some(20.0 * 10.0));
    /// ```
    pub fn champion(&self) -> Option<&Creature> {
        best_by_fitness(self.creatures.iter().filter(|c| c.fitness().is_some()))
            .or_else(|| best_by_fitness(self.species.iter().filter_map(Species::champion)))
    }

    /// Returns an iterator over all current creatures.
    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.iter()
    }

    /// Returns an iterator over all current species.
    ///
    /// Between generations, species hold the survivors
    /// of the last culling.
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation registry.
    pub fn registry(&self) -> &InnovationRegistry {
        &self.registry
    }

    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }
}

fn evaluate_creature<E: Environment>(
    index: usize,
    creature: &mut Creature,
    env: &mut E,
    genetic_config: &GeneticConfig,
    population_config: &PopulationConfig,
) -> Result<(), EvaluationError> {
    let reward = run_episodes(
        creature,
        env,
        population_config.episodes_per_generation,
        population_config.steps_per_episode,
        population_config.action_mode,
        genetic_config,
    )
    .map_err(|e| e.for_creature(index))?;
    creature
        .set_fitness(reward)
        .map_err(|source| EvaluationError::Fitness { creature: index, source })
}

/// Splits `size` offspring proportionally to `means`, flooring each
/// share. If no mean is positive, populated species share equally.
/// Any deficit goes to `ranking[0]`; any surplus is taken from the
/// back of `ranking`, never going below zero.
fn allot_quotas(means: &[f32], populated: &[bool], ranking: &[usize], size: usize) -> Vec<usize> {
    let total: f32 = means.iter().sum();
    let mut quotas: Vec<usize> = if total > 0.0 {
        means
            .iter()
            .map(|mean| (size as f32 * mean.max(0.0) / total).floor() as usize)
            .collect()
    } else {
        let populated_count = populated.iter().filter(|p| **p).count().max(1);
        populated
            .iter()
            .map(|&p| if p { size / populated_count } else { 0 })
            .collect()
    };

    let assigned: usize = quotas.iter().sum();
    if assigned < size {
        if let Some(&best) = ranking.first() {
            quotas[best] += size - assigned;
        }
    } else if assigned > size {
        let mut surplus = assigned - size;
        for &worst in ranking.iter().rev() {
            let cut = surplus.min(quotas[worst]);
            quotas[worst] -= cut;
            surplus -= cut;
            if surplus == 0 {
                break;
            }
        }
    }
    quotas
}
