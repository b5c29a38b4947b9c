pub mod model;
pub mod link_index;
pub mod oracle;
pub mod config;
pub mod graph;
pub mod builder;
pub mod estimator;


pub use model::{FlowId, ImpactId, Link, ProcessId, ProviderType, Selection};
pub use link_index::LinkIndex;
pub use oracle::{dangling_links, ContributionFigures, ContributionOracle, ContributionTable};
pub use config::{BuildConfig, EstimatorConfig, DEFAULT_MAX_NODE_COUNT, DEFAULT_MAX_PROBES};
pub use graph::{ContributionNetwork, GraphLink, ProcessNode};
pub use builder::{build, count_nodes};
pub use estimator::estimate_cutoff;
