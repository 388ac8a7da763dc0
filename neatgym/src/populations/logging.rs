use super::{Creature, Population, SpeciesId};
use crate::genomics::Genome;

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Clones every creature's genome.
    AllCreatures,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoCreatures,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    pub species_count: usize,
    pub creature_stats: Vec<(String, Stats)>,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {}", self.generation_number)?;
        writeln!(f, "\tspecies_count: {}", self.species_count)?;
        for (name, stats) in &self.creature_stats {
            writeln!(f, "\t{}: {:?}", name, stats)?;
        }
        write!(f, "}}")
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence,
    /// or `None` if it is empty.
    ///
    /// # Examples
    /// ```
    /// use neatgym::populations::logging::Stats;
    ///
    /// let stats = Stats::of([1.0, -2.0, 1.5, 0.5, -1.0]).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    ///
    /// assert_eq!(Stats::of([4.0, 1.0, 3.0, 2.0]).unwrap().median, 2.5);
    /// assert!(Stats::of(Vec::new()).is_none());
    /// ```
    pub fn of(data: impl IntoIterator<Item = f32>) -> Option<Stats> {
        let mut data: Vec<f32> = data.into_iter().collect();
        if data.is_empty() {
            return None;
        }
        data.sort_by(f32::total_cmp);

        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Some(Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / data.len() as f32,
            median,
        })
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    /// Every creature's genome and fitness.
    Creatures(Vec<(Genome, Option<f32>)>),
    /// Species ids, their champions' genomes and fitness,
    /// and species age.
    SpeciesChampions(Vec<(SpeciesId, Genome, Option<f32>, usize)>),
    /// Only the population champion's genome and fitness.
    PopulationChampion(Genome, Option<f32>),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population. Meant to be
    /// called after evaluation and before evolving.
    ///
    /// The `creature_stat_extractor` provides a way of
    /// obtaining arbitrary statistics on the evaluated
    /// creatures, where each statistic is named by `stat_names`.
    /// Statistics over no evaluated creatures are skipped.
    ///
    /// # Examples
    /// ```
    /// use neatgym::genomics::GeneticConfig;
    /// use neatgym::populations::logging::{EvolutionLogger, ReportingLevel};
    /// use neatgym::populations::{Creature, Population, PopulationConfig};
    ///
    /// let population_config = PopulationConfig {
    ///     size: 10,
    ///     compatibility_threshold: 3.0,
    ///     survival_threshold: 0.5,
    ///     episodes_per_generation: 1,
    ///     steps_per_episode: 1,
    ///     ..PopulationConfig::zero()
    /// };
    /// let mut population = Population::new(population_config, GeneticConfig::zero()).unwrap();
    /// let mut fitness = 0.0;
    /// population.evaluate_fitness(|_, _| { fitness += 1.0; fitness }).unwrap();
    ///
    /// let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    /// logger.log(
    ///     &population,
    ///     &|c: &Creature| [c.fitness().unwrap_or(0.0), c.genome().len() as f32],
    ///     ["fitness", "size"],
    /// );
    ///
    /// let log = logger.iter().next().unwrap();
    /// assert_eq!(log.creature_stats[0].1.maximum, 10.0);
    /// assert_eq!(log.creature_stats[0].1.mean, 5.5);
    /// ```
    pub fn log<CSE, const N: usize>(
        &mut self,
        population: &Population,
        creature_stat_extractor: &CSE,
        stat_names: [&str; N],
    ) where
        CSE: Fn(&Creature) -> [f32; N],
    {
        let samples: Vec<[f32; N]> = population
            .creatures()
            .filter(|c| c.fitness().is_some())
            .map(creature_stat_extractor)
            .collect();
        let creature_stats = stat_names
            .iter()
            .map(|name| name.to_string())
            .zip(unzip_n_vecs(&samples))
            .filter_map(|(name, data)| Some((name, Stats::of(data)?)))
            .collect();

        let generation_sample = match self.reporting_level {
            ReportingLevel::AllCreatures => GenerationMemberRecord::Creatures(
                population
                    .creatures()
                    .map(|c| (c.genome().clone(), c.fitness()))
                    .collect(),
            ),
            ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                population
                    .species()
                    .filter_map(|s| {
                        let champion = s.champion()?;
                        Some((s.id(), champion.genome().clone(), champion.fitness(), s.age()))
                    })
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => match population.champion() {
                Some(c) => {
                    GenerationMemberRecord::PopulationChampion(c.genome().clone(), c.fitness())
                }
                None => GenerationMemberRecord::None,
            },
            ReportingLevel::NoCreatures => GenerationMemberRecord::None,
        };

        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample,
            species_count: population.species().count(),
            creature_stats,
        })
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }

    /// Returns the most recent snapshot.
    pub fn last(&self) -> Option<&Log> {
        self.logs.last()
    }
}

fn unzip_n_vecs<T: Copy, const N: usize>(rows: &[[T; N]]) -> Vec<Vec<T>> {
    let mut columns = vec![Vec::with_capacity(rows.len()); N];
    for row in rows {
        for (column, item) in columns.iter_mut().zip(row) {
            column.push(*item);
        }
    }
    columns
}
