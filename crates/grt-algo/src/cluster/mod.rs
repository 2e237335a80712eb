//! Clustering subsystem: cluster-count allocation plus the partitioning
//! engine that turns the allocation into a busmap.

pub mod allocate;
pub mod features;
pub mod partition;
pub mod solver;

pub use allocate::{distribute_clusters, partition_buses, PartitionKey};
pub use features::{fix_country_assignment_for_hac, hac_features, FeatureMode, FeatureSpec};
pub use partition::{
    busmap_by_hac, busmap_by_kmeans, busmap_by_modularity, weighting_for_partition,
    ClusteringAlgorithm, KMeansParams,
};
pub use solver::{backend_for, ClarabelQp, QpBackend, SolverKind};

use grt_core::{determine_sub_networks, line_adjacency, Busmap, GrtResult, Network};
use std::collections::BTreeMap;
use tracing::debug;

/// Everything the partitioning engine needs for one target count.
#[derive(Debug, Clone)]
pub struct ClusteringRequest {
    pub n_clusters: usize,
    pub algorithm: ClusteringAlgorithm,
    pub country_weights: Option<BTreeMap<String, f64>>,
    pub tso_weights: Option<BTreeMap<String, BTreeMap<String, f64>>>,
    pub solver: SolverKind,
}

/// Compute the busmap assigning every bus to one of `n_clusters` clusters.
///
/// Cluster labels are namespaced by partition key (`"<country><sub> <i>"`),
/// so labels are globally unique. For HAC the country labels are repaired
/// first (see [`fix_country_assignment_for_hac`]); the sub-network labels are
/// recomputed before allocation in every case.
pub fn busmap_for_n_clusters(
    network: &mut Network,
    request: &ClusteringRequest,
) -> GrtResult<Busmap> {
    let hac_rows = if let ClusteringAlgorithm::Hac(spec) = &request.algorithm {
        let rows = hac_features(network, spec);
        fix_country_assignment_for_hac(network);
        Some(rows)
    } else {
        None
    };

    determine_sub_networks(network);

    let backend = backend_for(request.solver);
    let distribution = distribute_clusters(
        network,
        request.n_clusters,
        request.country_weights.as_ref(),
        request.tso_weights.as_ref(),
        backend.as_ref(),
    )?;

    let by_tso = request.tso_weights.is_some();
    let partitions = partition_buses(network, by_tso)?;

    let mut busmap = Busmap::new();
    for (key, count) in &distribution {
        let buses = &partitions[key];
        let prefix = format!("{key} ");
        debug!("determining busmap for partition {key} ({count} clusters)");

        if buses.len() == 1 {
            busmap.insert(buses[0].clone(), format!("{prefix}0"));
            continue;
        }

        let labels = match &request.algorithm {
            ClusteringAlgorithm::KMeans(params) => {
                let points: Vec<(f64, f64)> = buses
                    .iter()
                    .map(|b| {
                        let bus = network.bus(b).expect("partition bus exists");
                        (bus.x, bus.y)
                    })
                    .collect();
                let weights = weighting_for_partition(network, buses);
                busmap_by_kmeans(&points, &weights, *count, params)
            }
            ClusteringAlgorithm::Hac(_) => {
                let rows = hac_rows.as_ref().expect("features prepared for hac");
                let matrix: Vec<Vec<f64>> = buses
                    .iter()
                    .map(|b| rows.get(b).cloned().unwrap_or_default())
                    .collect();
                busmap_by_hac(&matrix, *count)
            }
            ClusteringAlgorithm::Modularity => {
                busmap_by_modularity(buses, &line_adjacency(network), *count)
            }
        };

        for (bus, label) in buses.iter().zip(labels) {
            busmap.insert(bus.clone(), format!("{prefix}{label}"));
        }
    }
    Ok(busmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assemble, bus, line, load};

    fn clustered_network() -> Network {
        assemble(
            vec![
                bus(0, "de0", 0.0, 0.0, "DE"),
                bus(1, "de1", 0.1, 0.0, "DE"),
                bus(2, "de2", 5.0, 0.0, "DE"),
                bus(3, "de3", 5.1, 0.0, "DE"),
                bus(4, "fr0", 0.0, 5.0, "FR"),
                bus(5, "fr1", 0.1, 5.0, "FR"),
            ],
            vec![
                line(0, "d01", "de0", "de1", 100.0, 1.0),
                line(1, "d12", "de1", "de2", 100.0, 1.0),
                line(2, "d23", "de2", "de3", 100.0, 1.0),
                line(3, "f01", "fr0", "fr1", 100.0, 1.0),
                line(4, "x", "de0", "fr0", 100.0, 1.0),
            ],
            vec![],
            vec![],
            vec![
                load(0, "l de0", "de0", 100.0),
                load(1, "l de2", "de2", 100.0),
                load(2, "l fr0", "fr0", 100.0),
            ],
        )
    }

    #[test]
    fn test_busmap_covers_every_bus_with_namespaced_labels() {
        let mut network = clustered_network();
        let request = ClusteringRequest {
            n_clusters: 3,
            algorithm: ClusteringAlgorithm::KMeans(KMeansParams {
                n_init: 20,
                max_iter: 200,
                tol: 1e-9,
                seed: 0,
            }),
            country_weights: None,
            tso_weights: None,
            solver: SolverKind::Clarabel,
        };
        let busmap = busmap_for_n_clusters(&mut network, &request).unwrap();

        assert_eq!(busmap.len(), 6);
        for (bus, label) in busmap.iter() {
            let country = &network.bus(bus).unwrap().country;
            assert!(
                label.starts_with(country.as_str()),
                "label {label} must be namespaced by country"
            );
        }
        // The geographically close DE pairs end up together.
        assert_eq!(busmap.apply("de0"), busmap.apply("de1"));
        assert_eq!(busmap.apply("de2"), busmap.apply("de3"));
        assert_ne!(busmap.apply("de0"), busmap.apply("de2"));
        assert_eq!(busmap.apply("fr0"), busmap.apply("fr1"));
    }
}
