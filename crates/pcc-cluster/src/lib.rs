pub mod micro;
pub mod denstream;

pub use micro::{ClusterStats, MicroCluster};
pub use denstream::StreamClusterer;
