use super::offspring_factory::OffspringFactory;
use super::{names, Creature, PopulationConfig};
use crate::genomics::{EncodingError, GeneticConfig, Genome, InnovationRegistry};

use serde::{Deserialize, Serialize};

use std::cmp::Ordering;

/// Species identifier, handed out by the population
/// in order of founding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub usize);

/// Species are collections of reproductively
/// compatible (within a certain [genetic distance])
/// creatures. Membership is determined by calculating
/// the genetic distance to a _representative_, which
/// is the genome of the creature that founded the
/// species. The representative is never recomputed,
/// so members may drift away from it over time.
///
/// [genetic distance]: PopulationConfig::compatibility_threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "SpeciesRecord", try_from = "SpeciesRecord")]
pub struct Species {
    id: SpeciesId,
    name: String,
    representative: Genome,
    pub(super) members: Vec<Creature>,
    champion: Option<Creature>,
    mean_fitness: f32,
    allotted_offspring_quota: usize,
    age: usize,
    extinct: bool,
}

/// Serialized form of a species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub id: SpeciesId,
    pub name: String,
    pub age: usize,
    pub quota: usize,
    pub mean_fitness: f32,
    pub representative: Genome,
    pub champion: Option<Creature>,
    pub members: Vec<Creature>,
}

impl Species {
    /// Founds a new species with the specified id, a generated
    /// name, and `founder` as its representative and sole member.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use neatgym::populations::{Creature, Species, SpeciesId};
    ///
    /// let config = GeneticConfig::zero();
    /// let founder = Creature::new(Genome::genesis(&config, &mut InnovationRegistry::new()));
    /// let species = Species::new(SpeciesId(0), founder);
    ///
    /// assert_eq!(species.id(), SpeciesId(0));
    /// assert_eq!(species.members().count(), 1);
    /// assert_eq!(species.members().next().unwrap().species(), Some(SpeciesId(0)));
    /// ```
    pub fn new(id: SpeciesId, mut founder: Creature) -> Species {
        founder.set_species(id);
        Species {
            id,
            name: names::species_name(),
            representative: founder.genome().clone(),
            members: vec![founder],
            champion: None,
            mean_fitness: 0.0,
            allotted_offspring_quota: 0,
            age: 0,
            extinct: false,
        }
    }

    /// Returns the species' id.
    pub fn id(&self) -> SpeciesId {
        self.id
    }

    /// Returns the species' name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &Genome {
        &self.representative
    }

    /// Returns the genetic distance between the species'
    /// representative and `genome`.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use neatgym::populations::{Creature, Species, SpeciesId};
    ///
    /// let config = GeneticConfig {
    ///     excess_gene_factor: 1.0,
    ///     disjoint_gene_factor: 1.0,
    ///     common_weight_factor: 0.4,
    ///     ..GeneticConfig::zero()
    /// };
    /// let genome = Genome::genesis(&config, &mut InnovationRegistry::new());
    /// let species = Species::new(SpeciesId(0), Creature::new(genome.clone()));
    ///
    /// assert_eq!(species.distance_to(&genome, &config), 0.0);
    /// ```
    pub fn distance_to(&self, genome: &Genome, config: &GeneticConfig) -> f32 {
        Genome::distance(&self.representative, genome, config)
    }

    /// Adds a creature to the species.
    pub fn add(&mut self, mut creature: Creature) {
        creature.set_species(self.id);
        self.members.push(creature);
    }

    /// Returns an iterator over the species' members.
    pub fn members(&self) -> impl Iterator<Item = &Creature> {
        self.members.iter()
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the species has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the best-performing member, as of the
    /// last fitness adjustment or culling.
    pub fn champion(&self) -> Option<&Creature> {
        self.champion.as_ref()
    }

    /// Returns the mean raw fitness of the members,
    /// as of the last fitness adjustment.
    pub fn mean_fitness(&self) -> f32 {
        self.mean_fitness
    }

    /// Returns the number of offspring the species
    /// will produce this generation.
    pub fn allotted_offspring_quota(&self) -> usize {
        self.allotted_offspring_quota
    }

    /// Returns the number of generations the species has survived.
    pub fn age(&self) -> usize {
        self.age
    }

    /// Returns `true` if the species was allotted no offspring.
    pub fn is_extinct(&self) -> bool {
        self.extinct
    }

    /// Shares each member's fitness with the rest of the species,
    /// and updates the species' mean fitness and champion.
    ///
    /// # Panics
    /// Panics if a member has not been evaluated.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use neatgym::populations::{Creature, Species, SpeciesId};
    ///
    /// let config = GeneticConfig::zero();
    /// let mut registry = InnovationRegistry::new();
    /// let mut creatures: Vec<Creature> = (0..4)
    ///     .map(|_| Creature::new(Genome::genesis(&config, &mut registry)))
    ///     .collect();
    /// for (creature, fitness) in creatures.iter_mut().zip([2.0, 8.0, 4.0, 6.0]) {
    ///     creature.set_fitness(fitness).unwrap();
    /// }
    ///
    /// let mut creatures = creatures.into_iter();
    /// let mut species = Species::new(SpeciesId(0), creatures.next().unwrap());
    /// creatures.for_each(|c| species.add(c));
    /// species.adjust_fitness();
    ///
    /// assert_eq!(species.mean_fitness(), 5.0);
    /// assert_eq!(species.champion().unwrap().fitness(), Some(8.0));
    /// assert_eq!(species.members().nth(1).unwrap().adjusted_fitness(), 2.0);
    /// ```
    pub fn adjust_fitness(&mut self) {
        let member_count = self.members.len() as f32;
        let mut total = 0.0;
        for creature in &mut self.members {
            let fitness = creature
                .fitness()
                .unwrap_or_else(|| panic!("unevaluated creature in species {:?}", self.id));
            creature.set_adjusted_fitness(fitness / member_count);
            total += fitness;
        }
        self.mean_fitness = if self.members.is_empty() {
            0.0
        } else {
            total / member_count
        };
        self.champion = best_by_fitness(self.members.iter()).cloned();
    }

    /// Discards all but the top `survival_fraction` of the members,
    /// ranked by fitness. At least one member always survives, and
    /// it becomes the species champion.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
    /// use neatgym::populations::{Creature, Species, SpeciesId};
    ///
    /// let config = GeneticConfig::zero();
    /// let mut registry = InnovationRegistry::new();
    /// let mut founder = Creature::new(Genome::genesis(&config, &mut registry));
    /// founder.set_fitness(1.0).unwrap();
    /// let mut species = Species::new(SpeciesId(0), founder);
    /// for fitness in [3.0, 2.0] {
    ///     let mut creature = Creature::new(Genome::genesis(&config, &mut registry));
    ///     creature.set_fitness(fitness).unwrap();
    ///     species.add(creature);
    /// }
    ///
    /// species.cull_the_weak(0.1);
    /// assert_eq!(species.len(), 1);
    /// assert_eq!(species.champion().unwrap().fitness(), Some(3.0));
    /// ```
    pub fn cull_the_weak(&mut self, survival_fraction: f32) {
        self.members.sort_by(|a, b| compare_fitness(b, a));
        let survivors = ((self.members.len() as f32 * survival_fraction).round() as usize)
            .max(1)
            .min(self.members.len());
        log::debug!(
            "species {} ({}): {} of {} members survive culling",
            self.id.0,
            self.name,
            survivors,
            self.members.len()
        );
        self.members.truncate(survivors);
        self.champion = self.members.first().cloned();
    }

    /// Produces exactly [`allotted_offspring_quota`] new creatures from
    /// the species' survivors.
    ///
    /// [`allotted_offspring_quota`]: Species::allotted_offspring_quota
    pub fn next_generation(
        &self,
        global_champion: Option<&Creature>,
        population: &[&Creature],
        registry: &mut InnovationRegistry,
        genetic_config: &GeneticConfig,
        population_config: &PopulationConfig,
    ) -> Vec<Creature> {
        OffspringFactory::new(
            self,
            global_champion,
            population,
            registry,
            genetic_config,
            population_config,
        )
        .generate_offspring()
    }

    /// Serializes the species into a JSON record.
    ///
    /// # Errors
    /// Returns an error if JSON encoding fails.
    pub fn to_json(&self) -> Result<serde_json::Value, EncodingError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Deserializes a species from a JSON record.
    ///
    /// # Errors
    /// Returns an error if the record is malformed, any of
    /// its genomes is invalid, or two genomes assign different
    /// endpoints to the same innovation number.
    pub fn from_json(value: serde_json::Value) -> Result<Species, EncodingError> {
        let record: SpeciesRecord = serde_json::from_value(value)?;
        Species::try_from(record)
    }

    pub(super) fn clear_members(&mut self) {
        self.members.clear();
        self.champion = None;
    }

    pub(super) fn set_allotted_offspring_quota(&mut self, quota: usize) {
        self.allotted_offspring_quota = quota;
    }

    pub(super) fn mark_extinct(&mut self) {
        self.extinct = true;
    }

    pub(super) fn grow_older(&mut self) {
        self.age += 1;
    }
}

impl From<Species> for SpeciesRecord {
    fn from(species: Species) -> Self {
        SpeciesRecord {
            id: species.id,
            name: species.name,
            age: species.age,
            quota: species.allotted_offspring_quota,
            mean_fitness: species.mean_fitness,
            representative: species.representative,
            champion: species.champion,
            members: species.members,
        }
    }
}

impl TryFrom<SpeciesRecord> for Species {
    type Error = EncodingError;

    fn try_from(record: SpeciesRecord) -> Result<Self, Self::Error> {
        let mut registry = InnovationRegistry::new();
        registry.observe(&record.representative)?;
        if let Some(champion) = &record.champion {
            registry.observe(champion.genome())?;
        }
        for member in &record.members {
            registry.observe(member.genome())?;
        }

        let id = record.id;
        let mut members = record.members;
        members.iter_mut().for_each(|c| c.set_species(id));
        let mut champion = record.champion;
        if let Some(champion) = &mut champion {
            champion.set_species(id);
        }
        Ok(Species {
            id,
            name: record.name,
            representative: record.representative,
            members,
            champion,
            mean_fitness: record.mean_fitness,
            allotted_offspring_quota: record.quota,
            age: record.age,
            extinct: false,
        })
    }
}

/// Orders creatures by fitness, unevaluated ones first.
pub(super) fn compare_fitness(a: &Creature, b: &Creature) -> Ordering {
    match (a.fitness(), b.fitness()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

/// Returns the fittest creature, the earliest one on ties.
pub(super) fn best_by_fitness<'a>(
    creatures: impl Iterator<Item = &'a Creature>,
) -> Option<&'a Creature> {
    creatures.fold(None, |best, creature| match best {
        Some(best) if compare_fitness(creature, best) != Ordering::Greater => Some(best),
        _ => Some(creature),
    })
}
