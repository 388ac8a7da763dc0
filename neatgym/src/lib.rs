//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>,
//! for evolving agents that act in step-based environments.
//!
//! Genomes are graphs of node and connection genes whose structural
//! innovations are numbered by a run-wide [`InnovationRegistry`]. Each
//! genome is expressed as a [`Phenotype`] network, which drives a
//! [`Creature`] through the episodes of an [`Environment`]. The
//! [`Population`] groups creatures into species and breeds the next
//! generation from their rewards.
//!
//! [`InnovationRegistry`]: genomics::InnovationRegistry
//! [`Phenotype`]: networks::Phenotype
//! [`Creature`]: populations::Creature
//!
//! # Example usage: Evolving a sign detector
//! ```
//! use neatgym::environment::{Action, Environment, Transition};
//! use neatgym::genomics::GeneticConfig;
//! use neatgym::{Population, PopulationConfig};
//! use std::convert::Infallible;
//!
//! /// Shows a positive or negative number, and rewards
//! /// picking action 0 for positives and 1 for negatives.
//! struct Sign {
//!     step: usize,
//! }
//!
//! impl Sign {
//!     fn observation(&self) -> Vec<f32> {
//!         let value = if self.step % 2 == 0 { 1.0 } else { -1.0 };
//!         vec![value, 1.0]
//!     }
//! }
//!
//! impl Environment for Sign {
//!     type Error = Infallible;
//!
//!     fn observation_size(&self) -> usize {
//!         2
//!     }
//!
//!     fn action_size(&self) -> usize {
//!         2
//!     }
//!
//!     fn reset(&mut self) -> Result<Vec<f32>, Infallible> {
//!         self.step = 0;
//!         Ok(self.observation())
//!     }
//!
//!     fn step(&mut self, action: &Action) -> Result<Transition, Infallible> {
//!         let correct = Action::Discrete(self.step % 2);
//!         let reward = if *action == correct { 1.0 } else { 0.0 };
//!         self.step += 1;
//!         Ok(Transition {
//!             observation: self.observation(),
//!             reward,
//!             done: self.step == 10,
//!         })
//!     }
//! }
//!
//! let genetic_config = GeneticConfig {
//!     initial_expression_chance: 1.0,
//!     weight_bound: 5.0,
//!     weight_reset_chance: 0.1,
//!     weight_nudge_chance: 0.9,
//!     weight_mutation_power: 2.5,
//!     node_addition_mutation_chance: 0.03,
//!     connection_addition_mutation_chance: 0.05,
//!     max_connection_addition_attempts: 20,
//!     child_mutation_chance: 0.65,
//!     mate_by_averaging_chance: 0.4,
//!     reenable_chance: 0.25,
//!     excess_gene_factor: 1.0,
//!     disjoint_gene_factor: 1.0,
//!     common_weight_factor: 0.4,
//!     size_normalization_threshold: 20,
//!     ..GeneticConfig::zero()
//! };
//! let population_config = PopulationConfig {
//!     size: 50,
//!     compatibility_threshold: 3.0,
//!     survival_threshold: 0.3,
//!     interspecies_mating_chance: 0.001,
//!     champion_mating_chance: 0.01,
//!     episodes_per_generation: 1,
//!     steps_per_episode: 20,
//!     ..PopulationConfig::zero()
//! };
//!
//! let mut population =
//!     Population::for_environment(&Sign { step: 0 }, population_config, genetic_config).unwrap();
//! for _ in 0..10 {
//!     population.par_evaluate_in(|| Sign { step: 0 }).unwrap();
//!     if population.champion().and_then(|c| c.fitness()) == Some(10.0) {
//!         break;
//!     }
//!     population.evolve().unwrap();
//! }
//! ```

pub mod environment;
pub mod genomics;
pub mod networks;
pub mod populations;

/// Innovation numbers and node ids.
pub type Innovation = usize;

pub use environment::{Action, ActionMode, Environment};
pub use genomics::{GeneticConfig, Genome};
pub use networks::Phenotype;
pub use populations::{Creature, Population, PopulationConfig, Species};
