use crate::Innovation;

use std::error::Error;
use std::fmt;

/// An error type indicating the connection being created
/// or added is invalid for the genome.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneValidityError {
    /// The connection's innovation number is a duplicate.
    DuplicateInnovation(Innovation),
    /// The connection's endpoints do not exist.
    NonexistantEndpoints(Innovation, Innovation),
    /// The connection has the same endpoints as another.
    DuplicateEndpoints(Innovation, (Innovation, Innovation)),
    /// The target of the connection is a sensor node.
    SensorTarget(Innovation),
}

/// An error type indicating the node being created
/// or added is invalid.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValidityError {
    /// The node's id is a duplicate.
    DuplicateNodeId(Innovation),
}

/// An error type indicating a failure
/// to carry out a connection addition mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionMutationError {
    /// Every node already connects to every possible target.
    GenomeFullyConnected,
    /// No pair of nodes was found to connect
    /// within the allowed number of attempts.
    NoInputOutputPairFound,
}

/// An error type indicating a failure
/// to carry out a node addition mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeMutationError {
    /// The genome had no enabled connection to split.
    NoEnabledConnection,
}

/// An error type indicating a malformed structured
/// record, or one that contradicts an innovation registry.
#[derive(Debug)]
pub enum EncodingError {
    /// The record could not be (de)serialized at all,
    /// e.g. because of a missing field.
    Json(serde_json::Error),
    /// Two nodes share an id.
    DuplicateNode(Innovation),
    /// Two connections share an innovation number.
    DuplicateInnovation(Innovation),
    /// A connection references a node absent from the record.
    DanglingEndpoint {
        innovation: Innovation,
        node: Innovation,
    },
    /// A connection targets a sensor node.
    SensorTarget(Innovation),
    /// The same endpoints were recorded under two different innovation numbers.
    ConflictingEndpoints {
        endpoints: (Innovation, Innovation),
        innovations: (Innovation, Innovation),
    },
    /// The same innovation number was recorded for two different endpoint pairs.
    ConflictingInnovation {
        innovation: Innovation,
        endpoints: ((Innovation, Innovation), (Innovation, Innovation)),
    },
}

impl fmt::Display for GeneValidityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateInnovation(id) => {
                write!(f, "duplicate connection insertion with innovation {}", id)
            }
            Self::NonexistantEndpoints(input, output) => write!(
                f,
                "connection insertion between nonexistant endpoint(s) {} -> {}",
                input, output
            ),
            Self::DuplicateEndpoints(duplicate_id, (input, output)) => write!(
                f,
                "connection insertion with endpoints {} -> {} and innovation {} \
                 shadows connection with same endpoints",
                input,
                output,
                duplicate_id,
            ),
            Self::SensorTarget(id) => {
                write!(f, "connection insertion with sensor node {} as target", id)
            }
        }
    }
}

impl fmt::Display for NodeValidityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateNodeId(id) => write!(f, "duplicate node insertion with id {}", id),
        }
    }
}

impl fmt::Display for ConnectionMutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenomeFullyConnected => {
                write!(f, "connection mutation on fully-connected genome")
            }
            Self::NoInputOutputPairFound => {
                write!(f, "no viable input-output pair found for connection mutation")
            }
        }
    }
}

impl fmt::Display for NodeMutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEnabledConnection => {
                write!(f, "node mutation on genome without enabled connections")
            }
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "malformed record: {}", e),
            Self::DuplicateNode(id) => write!(f, "record contains node {} more than once", id),
            Self::DuplicateInnovation(id) => {
                write!(f, "record contains innovation {} more than once", id)
            }
            Self::DanglingEndpoint { innovation, node } => write!(
                f,
                "connection {} references node {} absent from the record",
                innovation, node
            ),
            Self::SensorTarget(id) => write!(f, "connection {} targets a sensor node", id),
            Self::ConflictingEndpoints {
                endpoints: (input, output),
                innovations: (first, second),
            } => write!(
                f,
                "endpoints {} -> {} recorded under innovations {} and {}",
                input, output, first, second
            ),
            Self::ConflictingInnovation {
                innovation,
                endpoints: ((i1, o1), (i2, o2)),
            } => write!(
                f,
                "innovation {} recorded for both {} -> {} and {} -> {}",
                innovation, i1, o1, i2, o2
            ),
        }
    }
}

impl Error for GeneValidityError {}
impl Error for NodeValidityError {}
impl Error for ConnectionMutationError {}
impl Error for NodeMutationError {}

impl Error for EncodingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for EncodingError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<NodeValidityError> for EncodingError {
    fn from(e: NodeValidityError) -> Self {
        match e {
            NodeValidityError::DuplicateNodeId(id) => Self::DuplicateNode(id),
        }
    }
}
