mod cartpole;

use cartpole::CartPole;
use neatgym::genomics::GeneticConfig;
use neatgym::populations::logging::{EvolutionLogger, ReportingLevel};
use neatgym::populations::Creature;
use neatgym::{Population, PopulationConfig};

use serde::Deserialize;

use std::error::Error;
use std::fs;

const DEFAULT_SETTINGS: &str = include_str!("../config.ron");

/// Run settings, read from a RON file.
#[derive(Debug, Deserialize)]
struct Settings {
    generations: usize,
    target_fitness: f32,
    population: PopulationConfig,
    genetics: GeneticConfig,
}

impl Settings {
    fn load(path: Option<String>) -> Result<Settings, Box<dyn Error>> {
        let text = match path {
            Some(path) => fs::read_to_string(path)?,
            None => DEFAULT_SETTINGS.to_string(),
        };
        Ok(ron::from_str(&text)?)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load(std::env::args().nth(1))?;
    settings.population.validate()?;
    settings.genetics.validate()?;

    let mut population =
        Population::for_environment(&CartPole::new(), settings.population, settings.genetics)?;
    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);

    for _ in 0..settings.generations {
        population.par_evaluate_in(CartPole::new)?;
        logger.log(
            &population,
            &|c: &Creature| [c.fitness().unwrap_or(0.0), c.genome().len() as f32],
            ["fitness", "genome length"],
        );
        if let Some(log) = logger.last() {
            log::debug!("{}", log);
        }

        let best = population.champion().and_then(Creature::fitness).unwrap_or(0.0);
        if best >= settings.target_fitness {
            log::info!(
                "balanced the pole for {} steps in generation {}",
                best,
                population.generation()
            );
            break;
        }
        population.evolve()?;
    }

    if let Some(champion) = population.champion() {
        println!("{}", serde_json::to_string_pretty(&champion.genome().to_json()?)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neatgym::Environment;

    #[test]
    fn default_settings_are_valid() {
        let settings = Settings::load(None).unwrap();
        assert!(settings.population.validate().is_ok());
        assert!(settings.genetics.validate().is_ok());
        assert_eq!(settings.genetics.input_count.get(), CartPole::new().observation_size());
    }
}
