//! Gene schema, typed mutation operators, the gene tree, and the binned Pareto
//! archive that together drive the optimizer's candidate generation.

pub mod archive;
pub mod config;
pub mod gene;
pub mod individual;
pub mod metric;
pub mod mutate;
pub mod objective;
pub mod random;
pub mod sampler;
pub mod schema;
pub mod tree;

pub use archive::Archive;
pub use config::Config;
pub use gene::{GeneType, GeneValue};
pub use individual::{Individual, Lineage};
pub use metric::{MetricDef, Metrics};
pub use mutate::{MutatorTag, MutatorWeights};
pub use objective::Optimize;
pub use schema::GeneSchema;
pub use tree::GeneTree;
