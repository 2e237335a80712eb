//! # grt-algo: Network Reduction and Clustering Algorithms
//!
//! This crate provides the graph-reduction pipeline that collapses a
//! detailed transmission network into a coarse representative network while
//! preserving aggregate physical and economic properties.
//!
//! ## Pipeline stages
//!
//! The simplification stages run in strict sequence, each consuming a
//! network and emitting the reduced network plus a [`grt_core::Busmap`]:
//!
//! 1. [`unify::unify_voltage`] - map every bus and line onto the reference
//!    voltage level, eliminating transformers.
//! 2. [`links::simplify_links`] - fold multi-hop DC corridors into single
//!    equivalent links, relocating attached components and pricing their
//!    grid connection.
//! 3. [`stubs::remove_stubs`] - iteratively prune dead-end buses.
//!
//! The clustering stage then reduces the simplified network to a configured
//! number of buses:
//!
//! 4. [`cluster::distribute_clusters`] - split the target count across
//!    country/sub-network (or TSO) partitions with a small quadratic
//!    program.
//! 5. [`cluster::busmap_for_n_clusters`] - partition each group with
//!    weighted k-means, hierarchical agglomerative clustering, or greedy
//!    modularity.
//! 6. [`aggregate::aggregate_network`] - merge buses, corridors, and
//!    one-port components according to the busmap.
//! 7. [`regions::dissolve_regions`] - carry the bus coverage polygons along.
//!
//! All stages are deterministic: fixed seeds, ordered maps, and a
//! deterministic solver make re-runs reproduce identical artifacts.

pub mod aggregate;
pub mod cluster;
pub mod costs;
pub mod links;
pub mod regions;
pub mod stubs;
pub mod test_utils;
pub mod unify;

pub use aggregate::{
    aggregate_and_move, aggregate_network, aggregate_one_ports, update_p_nom_max,
    AggregationStrategies, ClusterOptions, Linemap, NetworkClustering, Strategy,
};
pub use cluster::{
    busmap_for_n_clusters, distribute_clusters, ClusteringAlgorithm, ClusteringRequest,
    FeatureSpec, KMeansParams, PartitionKey, QpBackend, SolverKind,
};
pub use costs::{
    annuity, apply_connection_costs, connection_costs_per_link, connection_costs_to_bus,
    ConnectionCostReport, ConnectionCosts, CostTable, TechCost,
};
pub use links::{simplify_links, LinkFoldParams};
pub use regions::{dissolve_regions, Region};
pub use stubs::{busmap_by_stubs, remove_stubs};
pub use unify::{unify_voltage, UnifyParams};
