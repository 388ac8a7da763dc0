//! The simulated world creatures are evaluated in.
//!
//! An [`Environment`] hands out observations, accepts actions and
//! reports rewards. A creature's fitness is the mean total reward
//! it collects over a number of episodes, see [`run_episodes`].
use crate::genomics::GeneticConfig;
use crate::populations::{Creature, EvaluationError, EvaluationPhase};

use serde::{Deserialize, Serialize};

/// How phenotype outputs are turned into actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionMode {
    /// The index of the largest output.
    Discrete,
    /// The raw output vector.
    Continuous,
}

/// An action taken by a creature.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    Discrete(usize),
    Continuous(Vec<f32>),
}

/// The outcome of a single environment step.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub observation: Vec<f32>,
    pub reward: f32,
    pub done: bool,
}

/// An episodic environment with fixed observation
/// and action dimensionality.
pub trait Environment {
    /// Error raised when the environment fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of values in each observation.
    fn observation_size(&self) -> usize;

    /// Number of discrete actions, or the
    /// length of a continuous action.
    fn action_size(&self) -> usize;

    /// Starts a new episode, returning the first observation.
    fn reset(&mut self) -> Result<Vec<f32>, Self::Error>;

    /// Applies an action and advances the environment by one step.
    fn step(&mut self, action: &Action) -> Result<Transition, Self::Error>;
}

/// Lets the creature play `episodes` episodes of at most `steps` steps
/// each, and returns the mean total reward it collected. The creature's
/// recurrent state is cleared at the start of every episode.
///
/// # Errors
/// Returns an error if the environment fails, or hands out
/// an observation of the wrong size.
///
/// # Examples
/// ```
/// use neatgym::environment::{run_episodes, Action, ActionMode, Environment, Transition};
/// use neatgym::genomics::{GeneticConfig, Genome, InnovationRegistry};
/// use neatgym::populations::Creature;
/// use std::convert::Infallible;
///
/// struct Counter(usize);
///
/// impl Environment for Counter {
///     type Error = Infallible;
///     fn observation_size(&self) -> usize { 1 }
///     fn action_size(&self) -> usize { 1 }
///     fn reset(&mut self) -> Result<Vec<f32>, Infallible> {
///         self.0 = 0;
///         Ok(vec![0.0])
///     }
///     fn step(&mut self, _: &Action) -> Result<Transition, Infallible> {
///         self.0 += 1;
///         Ok(Transition { observation: vec![0.0], reward: 1.0, done: self.0 == 3 })
///     }
/// }
///
/// let config = GeneticConfig::zero();
/// let mut creature = Creature::new(Genome::genesis(&config, &mut InnovationRegistry::new()));
/// let reward =
///     run_episodes(&mut creature, &mut Counter(0), 2, 10, ActionMode::Discrete, &config).unwrap();
/// assert_eq!(reward, 3.0);
/// ```
pub fn run_episodes<E: Environment>(
    creature: &mut Creature,
    env: &mut E,
    episodes: usize,
    steps: usize,
    mode: ActionMode,
    config: &GeneticConfig,
) -> Result<f32, EvaluationError> {
    if episodes == 0 {
        return Ok(0.0);
    }

    let mut total_reward = 0.0;
    for _ in 0..episodes {
        creature.phenotype(config).reset();
        let mut observation = env.reset().map_err(|e| EvaluationError::Environment {
            creature: None,
            phase: EvaluationPhase::Reset,
            source: Box::new(e),
        })?;

        for step in 0..steps {
            if observation.len() != config.input_count.get() {
                return Err(EvaluationError::ObservationSize {
                    creature: None,
                    expected: config.input_count.get(),
                    found: observation.len(),
                });
            }
            let action = creature.get_action(&observation, mode, config);
            let transition = env.step(&action).map_err(|e| EvaluationError::Environment {
                creature: None,
                phase: EvaluationPhase::Step(step),
                source: Box::new(e),
            })?;
            total_reward += transition.reward;
            if transition.done {
                break;
            }
            observation = transition.observation;
        }
    }

    Ok(total_reward / episodes as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{Genome, InnovationRegistry};
    use std::fmt;
    use std::num::NonZeroUsize;

    #[derive(Debug)]
    struct Broken;

    impl fmt::Display for Broken {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "broken")
        }
    }

    impl std::error::Error for Broken {}

    /// Fails on the given step, or on reset if `None`.
    struct Faulty {
        fail_at: Option<usize>,
        steps: usize,
        observation_size: usize,
    }

    impl Environment for Faulty {
        type Error = Broken;

        fn observation_size(&self) -> usize {
            1
        }

        fn action_size(&self) -> usize {
            2
        }

        fn reset(&mut self) -> Result<Vec<f32>, Broken> {
            self.steps = 0;
            match self.fail_at {
                None => Err(Broken),
                Some(_) => Ok(vec![0.5; self.observation_size]),
            }
        }

        fn step(&mut self, action: &Action) -> Result<Transition, Broken> {
            assert!(matches!(action, Action::Discrete(0..=1)));
            if Some(self.steps) == self.fail_at {
                return Err(Broken);
            }
            self.steps += 1;
            Ok(Transition {
                observation: vec![0.5; self.observation_size],
                reward: 0.5,
                done: false,
            })
        }
    }

    /// Runs a fresh single-sensor creature for four steps per episode.
    fn run(env: &mut Faulty, episodes: usize) -> Result<f32, EvaluationError> {
        let config = GeneticConfig {
            output_count: NonZeroUsize::new(2).unwrap(),
            initial_expression_chance: 1.0,
            weight_bound: 1.0,
            ..GeneticConfig::zero()
        };
        let mut creature = Creature::new(Genome::genesis(&config, &mut InnovationRegistry::new()));
        run_episodes(&mut creature, env, episodes, 4, ActionMode::Discrete, &config)
    }

    #[test]
    fn rewards_are_averaged_over_episodes() {
        let mut env = Faulty {
            fail_at: Some(usize::MAX),
            steps: 0,
            observation_size: 1,
        };
        let reward = run(&mut env, 3).unwrap();
        assert_eq!(reward, 2.0);
    }

    #[test]
    fn environment_failures_propagate() {
        let mut env = Faulty {
            fail_at: None,
            steps: 0,
            observation_size: 1,
        };
        let error = run(&mut env, 1).unwrap_err();
        assert!(matches!(
            error,
            EvaluationError::Environment {
                phase: EvaluationPhase::Reset,
                ..
            }
        ));

        env.fail_at = Some(2);
        let error = run(&mut env, 1).unwrap_err();
        assert!(matches!(
            error.for_creature(7),
            EvaluationError::Environment {
                creature: Some(7),
                phase: EvaluationPhase::Step(2),
                ..
            }
        ));
    }

    #[test]
    fn wrong_observation_size_is_an_error() {
        let mut env = Faulty {
            fail_at: Some(usize::MAX),
            steps: 0,
            observation_size: 3,
        };
        let error = run(&mut env, 1).unwrap_err();
        assert!(matches!(
            error,
            EvaluationError::ObservationSize {
                expected: 1,
                found: 3,
                ..
            }
        ));
    }
}
