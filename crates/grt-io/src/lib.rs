//! # grt-io: Persistence for the reduction pipeline
//!
//! Every stage boundary is a file:
//!
//! - [`network`] - the self-describing network-model JSON that round-trips
//!   losslessly between stages
//! - [`tables`] - two-column busmap/linemap CSVs, the connection-cost
//!   report, the technology cost table, and the bus-TSO assignment table
//! - [`regions`] - GeoJSON polygon collections keyed by bus/cluster name
//! - [`config`] - the configuration values consumed by the core (the
//!   loading mechanism is the caller's concern; the CLI reads JSON)

pub mod config;
pub mod network;
pub mod regions;
pub mod tables;

pub use config::{AggregationOverrides, ClusterTarget, KMeansOverrides, PipelineConfig};
pub use network::{load_network, save_network, NetworkFile};
pub use regions::{read_regions, write_regions};
pub use tables::{
    apply_tso_map, load_cost_table, load_tso_map, read_busmap, write_busmap,
    write_connection_costs, write_linemap,
};
