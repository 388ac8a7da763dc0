use super::{ConnectionGene, EncodingError, GeneValidityError, Genome, NodeKind};
use crate::Innovation;

use serde::{Deserialize, Serialize};

/// Serialized form of a node gene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: Innovation,
    pub kind: NodeKind,
}

/// Serialized form of a connection gene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub innovation_number: Innovation,
    #[serde(rename = "in")]
    pub input: Innovation,
    #[serde(rename = "out")]
    pub output: Innovation,
    pub weight: f32,
    pub enabled: bool,
}

/// The structured record a [`Genome`] is saved as.
///
/// Nodes are listed by ascending id and connections by
/// ascending innovation number, so equal genomes always
/// produce equal records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenomeRecord {
    pub nodes: Vec<NodeRecord>,
    pub connections: Vec<ConnectionRecord>,
}

impl From<&Genome> for GenomeRecord {
    fn from(genome: &Genome) -> Self {
        let mut nodes: Vec<NodeRecord> = genome
            .nodes
            .values()
            .map(|n| NodeRecord {
                id: n.id(),
                kind: n.kind(),
            })
            .collect();
        let mut connections: Vec<ConnectionRecord> = genome
            .connections
            .values()
            .map(|c| ConnectionRecord {
                innovation_number: c.innovation(),
                input: c.input(),
                output: c.output(),
                weight: c.weight(),
                enabled: c.enabled(),
            })
            .collect();
        nodes.sort_unstable_by_key(|n| n.id);
        connections.sort_unstable_by_key(|c| c.innovation_number);
        GenomeRecord { nodes, connections }
    }
}

impl From<Genome> for GenomeRecord {
    fn from(genome: Genome) -> Self {
        GenomeRecord::from(&genome)
    }
}

impl TryFrom<GenomeRecord> for Genome {
    type Error = EncodingError;

    fn try_from(record: GenomeRecord) -> Result<Self, Self::Error> {
        let mut genome = Genome::empty();
        for node in record.nodes {
            genome.add_node(node.id, node.kind)?;
        }
        for c in record.connections {
            let mut gene = ConnectionGene::new(c.innovation_number, c.input, c.output, c.weight);
            gene.set_enabled(c.enabled);
            let shadowed = genome.node_pairings.get(&(c.input, c.output)).copied();
            let input_known = genome.nodes.contains_key(&c.input);
            genome.insert_connection(gene).map_err(|e| match e {
                GeneValidityError::DuplicateInnovation(id) => {
                    EncodingError::DuplicateInnovation(id)
                }
                GeneValidityError::NonexistantEndpoints(input, output) => {
                    EncodingError::DanglingEndpoint {
                        innovation: c.innovation_number,
                        node: if input_known { output } else { input },
                    }
                }
                GeneValidityError::DuplicateEndpoints(id, endpoints) => {
                    EncodingError::ConflictingEndpoints {
                        endpoints,
                        innovations: (shadowed.unwrap_or(id), id),
                    }
                }
                GeneValidityError::SensorTarget(_) => {
                    EncodingError::SensorTarget(c.innovation_number)
                }
            })?;
        }
        Ok(genome)
    }
}
