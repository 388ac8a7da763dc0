use super::{Creature, PopulationConfig, Species};
use crate::genomics::{GeneticConfig, Genome, InnovationRegistry};

use rand::{seq::SliceRandom, Rng};

/// Auxiliary type for offspring generation.
/// Produces a single species' allotted offspring
/// according to the specified configs.
pub(super) struct OffspringFactory<'a> {
    species: &'a Species,
    global_champion: Option<&'a Creature>,
    population: &'a [&'a Creature],
    registry: &'a mut InnovationRegistry,
    genetic_config: &'a GeneticConfig,
    population_config: &'a PopulationConfig,
}

impl<'a> OffspringFactory<'a> {
    pub(super) fn new(
        species: &'a Species,
        global_champion: Option<&'a Creature>,
        population: &'a [&'a Creature],
        registry: &'a mut InnovationRegistry,
        genetic_config: &'a GeneticConfig,
        population_config: &'a PopulationConfig,
    ) -> OffspringFactory<'a> {
        OffspringFactory {
            species,
            global_champion,
            population,
            registry,
            genetic_config,
            population_config,
        }
    }

    /// Generate the allotted offspring: the champion, unchanged,
    /// followed by mated children.
    pub(super) fn generate_offspring(&mut self) -> Vec<Creature> {
        let quota = self.species.allotted_offspring_quota();
        let mut offspring = Vec::with_capacity(quota);
        if quota == 0 {
            return offspring;
        }

        let species = self.species;
        let mut parents: Vec<&Creature> = species.members().collect();
        if parents.is_empty() {
            parents.extend(species.champion());
        }
        if parents.is_empty() {
            log::warn!(
                "species {} ({}) was allotted {} offspring but has no survivors",
                species.id().0,
                species.name(),
                quota
            );
            return offspring;
        }

        let elite = species.champion().unwrap_or(parents[0]);
        offspring.push(Creature::new(elite.genome().clone()));

        let mut rng = rand::thread_rng();
        while offspring.len() < quota {
            let parent_a = parents.choose(&mut rng).copied().unwrap_or(elite);
            let parent_b = self.choose_second_parent(&parents, elite);
            offspring.push(self.mate(parent_a, parent_b));
        }

        offspring
    }

    /// Choose the second parent from the whole population,
    /// the global champion, or the species' own survivors.
    fn choose_second_parent(
        &self,
        parents: &[&'a Creature],
        fallback: &'a Creature,
    ) -> &'a Creature {
        let mut rng = rand::thread_rng();
        let roll = rng.gen::<f32>();
        let interspecies = self.population_config.interspecies_mating_chance;

        if roll < interspecies {
            if let Some(mate) = self.population.choose(&mut rng) {
                return mate;
            }
        } else if roll < interspecies + self.population_config.champion_mating_chance {
            if let Some(champion) = self.global_champion {
                return champion;
            }
        }
        parents.choose(&mut rng).copied().unwrap_or(fallback)
    }

    /// Cross two parents over, the fitter one (or `a`, on ties)
    /// passing on its structure, and possibly mutate the child.
    fn mate(&mut self, a: &Creature, b: &Creature) -> Creature {
        let fitter_is_a = a.fitness().unwrap_or(0.0) >= b.fitness().unwrap_or(0.0);
        let mut child = Genome::crossover(a.genome(), b.genome(), fitter_is_a, self.genetic_config);
        if rand::thread_rng().gen::<f32>() < self.genetic_config.child_mutation_chance {
            child.mutate(self.registry, self.genetic_config);
        }
        Creature::new(child)
    }
}
