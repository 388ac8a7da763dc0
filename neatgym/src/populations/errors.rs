use std::error::Error;
use std::fmt;

/// Boxed error raised by an environment.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// An error type indicating an invalid population
/// or genetic configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A count that must be nonzero is zero.
    ZeroValue(&'static str),
    /// A threshold that must be strictly positive is not.
    NonPositiveThreshold(&'static str, f32),
    /// A probability lies outside [0, 1].
    ProbabilityOutOfRange(&'static str, f32),
    /// A magnitude or coefficient is negative (or NaN).
    NegativeValue(&'static str, f32),
}

/// An error type indicating a creature's fitness
/// could not be set.
#[derive(Debug, Clone, PartialEq)]
pub enum FitnessError {
    /// The fitness was already set this generation.
    AlreadySet(f32),
    /// The fitness is negative.
    Negative(f32),
    /// The fitness is NaN.
    NotANumber,
}

/// The phase of an episode in which an
/// environment failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationPhase {
    /// While resetting the environment before an episode.
    Reset,
    /// While stepping the environment at the given step.
    Step(usize),
}

/// An error type indicating creature evaluation was aborted.
#[derive(Debug)]
pub enum EvaluationError {
    /// The environment failed.
    Environment {
        creature: Option<usize>,
        phase: EvaluationPhase,
        source: BoxError,
    },
    /// The environment produced an observation of the wrong size.
    ObservationSize {
        creature: Option<usize>,
        expected: usize,
        found: usize,
    },
    /// The resulting fitness was rejected.
    Fitness { creature: usize, source: FitnessError },
}

/// An error type indicating a generation could not be advanced.
#[derive(Debug, Clone, PartialEq)]
pub enum EvolutionError {
    /// The creature with the given index has no fitness.
    MissingFitness(usize),
    /// The population is empty: every species went extinct.
    Extinction,
}

impl EvaluationError {
    /// Attributes the error to the creature with the given index.
    pub(crate) fn for_creature(self, index: usize) -> EvaluationError {
        match self {
            Self::Environment { phase, source, .. } => Self::Environment {
                creature: Some(index),
                phase,
                source,
            },
            Self::ObservationSize { expected, found, .. } => Self::ObservationSize {
                creature: Some(index),
                expected,
                found,
            },
            fitness => fitness,
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroValue(name) => write!(f, "{} must be nonzero", name),
            Self::NonPositiveThreshold(name, value) => {
                write!(f, "{} must be positive, got {}", name, value)
            }
            Self::ProbabilityOutOfRange(name, value) => {
                write!(f, "{} must be in [0, 1], got {}", name, value)
            }
            Self::NegativeValue(name, value) => {
                write!(f, "{} must be non-negative, got {}", name, value)
            }
        }
    }
}

impl fmt::Display for FitnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySet(fitness) => {
                write!(f, "fitness already set to {} this generation", fitness)
            }
            Self::Negative(fitness) => write!(f, "negative fitness {}", fitness),
            Self::NotANumber => write!(f, "fitness is NaN"),
        }
    }
}

impl fmt::Display for EvaluationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reset => write!(f, "reset"),
            Self::Step(step) => write!(f, "step {}", step),
        }
    }
}

fn fmt_creature(creature: &Option<usize>) -> String {
    match creature {
        Some(index) => format!("creature {}", index),
        None => "creature".to_string(),
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment {
                creature,
                phase,
                source,
            } => write!(
                f,
                "environment failed during {} while evaluating {}: {}",
                phase,
                fmt_creature(creature),
                source
            ),
            Self::ObservationSize {
                creature,
                expected,
                found,
            } => write!(
                f,
                "environment returned an observation of size {} to {} expecting {}",
                found,
                fmt_creature(creature),
                expected
            ),
            Self::Fitness { creature, source } => {
                write!(f, "invalid fitness for creature {}: {}", creature, source)
            }
        }
    }
}

impl fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFitness(index) => {
                write!(f, "attempted evolution with unevaluated creature {}", index)
            }
            Self::Extinction => write!(f, "attempted evolution on extinct population"),
        }
    }
}

impl Error for ConfigurationError {}
impl Error for FitnessError {}
impl Error for EvolutionError {}

impl Error for EvaluationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Environment { source, .. } => Some(source.as_ref()),
            Self::Fitness { source, .. } => Some(source),
            Self::ObservationSize { .. } => None,
        }
    }
}
