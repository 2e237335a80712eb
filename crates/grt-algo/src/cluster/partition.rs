//! Partitioning algorithms: assign the buses of one partition to its
//! allocated number of clusters.
//!
//! All algorithms implement the same contract - partition a set of buses
//! into `k` labeled groups - and are dispatched over a closed enum:
//!
//! | Algorithm | Groups by | Input |
//! |-----------|-----------|-------|
//! | [`ClusteringAlgorithm::KMeans`] | electrical gravity | bus coordinates, weighted |
//! | [`ClusteringAlgorithm::Hac`] | renewable resource | capacity-factor features |
//! | [`ClusteringAlgorithm::Modularity`] | grid topology | intra-partition lines |
//!
//! Weighted k-means restarts from multiple deterministic seeds and keeps the
//! lowest-inertia run, so repeated executions reproduce identical busmaps.

use grt_core::{Adjacency, GrtError, GrtResult, Network};
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;
use tracing::warn;

use super::features::FeatureSpec;

/// Conventional carriers that anchor the k-means bus weighting.
const CONVENTIONAL_CARRIERS: [&str; 4] = ["OCGT", "CCGT", "PHS", "hydro"];

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansParams {
    /// Number of random restarts
    pub n_init: usize,
    /// Iteration cap per restart
    pub max_iter: usize,
    /// Centroid-shift convergence tolerance
    pub tol: f64,
    /// Base random seed; restart i uses `seed + i`
    pub seed: u64,
}

impl Default for KMeansParams {
    fn default() -> Self {
        Self {
            n_init: 1000,
            max_iter: 30000,
            tol: 1e-6,
            seed: 0,
        }
    }
}

/// Closed set of partitioning strategies.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusteringAlgorithm {
    KMeans(KMeansParams),
    Hac(FeatureSpec),
    Modularity,
}

impl ClusteringAlgorithm {
    /// Resolve the configured algorithm name and feature selector.
    pub fn from_config(
        name: &str,
        feature: Option<&str>,
        kmeans: KMeansParams,
    ) -> GrtResult<Self> {
        match name {
            "kmeans" => {
                if let Some(feature) = feature {
                    warn!(
                        "keyword `feature` is only valid for algorithm `hac`; \
                         given feature `{feature}` will be ignored"
                    );
                }
                Ok(ClusteringAlgorithm::KMeans(kmeans))
            }
            "hac" => {
                let spec = match feature {
                    Some(f) => f.parse()?,
                    None => FeatureSpec::default(),
                };
                Ok(ClusteringAlgorithm::Hac(spec))
            }
            "modularity" => {
                if let Some(feature) = feature {
                    warn!(
                        "keyword `feature` is only valid for algorithm `hac`; \
                         given feature `{feature}` will be ignored"
                    );
                }
                Ok(ClusteringAlgorithm::Modularity)
            }
            other => Err(GrtError::Config(format!(
                "`algorithm` must be one of 'kmeans', 'hac', or 'modularity'. Is {other}"
            ))),
        }
    }
}

/// Integer bus weights for k-means: each bus's share of conventional
/// generation plus load, normalized, scaled to 1..=100.
pub fn weighting_for_partition(network: &Network, buses: &[String]) -> Vec<u64> {
    let bus_set: BTreeSet<&str> = buses.iter().map(String::as_str).collect();

    let mut generation = vec![0.0; buses.len()];
    let index_of = |bus: &str| buses.iter().position(|b| b == bus);
    for gen in network.generators() {
        if CONVENTIONAL_CARRIERS.contains(&gen.carrier.as_str())
            && bus_set.contains(gen.bus.as_str())
        {
            if let Some(i) = index_of(&gen.bus) {
                generation[i] += gen.p_nom;
            }
        }
    }
    for unit in network.storage_units() {
        if CONVENTIONAL_CARRIERS.contains(&unit.carrier.as_str())
            && bus_set.contains(unit.bus.as_str())
        {
            if let Some(i) = index_of(&unit.bus) {
                generation[i] += unit.p_nom;
            }
        }
    }
    let mut demand = vec![0.0; buses.len()];
    for load in network.loads() {
        if bus_set.contains(load.bus.as_str()) {
            if let Some(i) = index_of(&load.bus) {
                demand[i] += load.mean_p_set();
            }
        }
    }

    let normed = |values: &[f64]| -> Vec<f64> {
        let total: f64 = values.iter().sum();
        if total > 0.0 {
            values.iter().map(|v| v / total).collect()
        } else {
            vec![0.0; values.len()]
        }
    };
    let g = normed(&generation);
    let l = normed(&demand);
    let combined: Vec<f64> = g.iter().zip(&l).map(|(a, b)| a + b).collect();

    let max = combined.iter().cloned().fold(0.0f64, f64::max);
    if max <= 0.0 {
        return vec![1; buses.len()];
    }
    combined
        .iter()
        .map(|w| ((w * 100.0 / max).floor() as u64).max(1))
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Weighted k-means on bus coordinates with deterministic restarts.
pub fn busmap_by_kmeans(
    points: &[(f64, f64)],
    weights: &[u64],
    k: usize,
    params: &KMeansParams,
) -> Vec<usize> {
    let n = points.len();
    assert!(k >= 1 && k <= n, "cluster count must lie in [1, n]");
    if k == 1 {
        return vec![0; n];
    }
    if k == n {
        return (0..n).collect();
    }

    let coords: Vec<[f64; 2]> = points.iter().map(|&(x, y)| [x, y]).collect();
    let fweights: Vec<f64> = weights.iter().map(|&w| w as f64).collect();

    let mut best: Option<(f64, Vec<usize>)> = None;
    for restart in 0..params.n_init.max(1) {
        let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(restart as u64));

        // Weighted sampling of k distinct seed points; after too many
        // duplicate draws fill up deterministically.
        let sampler = WeightedIndex::new(&fweights).expect("weights are positive");
        let mut seeds: Vec<usize> = Vec::with_capacity(k);
        let mut draws = 0;
        while seeds.len() < k && draws < 100 * k {
            let candidate = sampler.sample(&mut rng);
            draws += 1;
            if !seeds.contains(&candidate) {
                seeds.push(candidate);
            }
        }
        for i in 0..n {
            if seeds.len() == k {
                break;
            }
            if !seeds.contains(&i) {
                seeds.push(i);
            }
        }
        let mut centroids: Vec<[f64; 2]> = seeds.iter().map(|&i| coords[i]).collect();

        let mut assignment = vec![0usize; n];
        for _ in 0..params.max_iter {
            for (i, point) in coords.iter().enumerate() {
                let mut nearest = 0;
                let mut nearest_dist = f64::INFINITY;
                for (c, centroid) in centroids.iter().enumerate() {
                    let d = squared_distance(point, centroid);
                    if d < nearest_dist {
                        nearest_dist = d;
                        nearest = c;
                    }
                }
                assignment[i] = nearest;
            }

            let mut sums = vec![[0.0f64; 2]; k];
            let mut totals = vec![0.0f64; k];
            for (i, &cluster) in assignment.iter().enumerate() {
                sums[cluster][0] += fweights[i] * coords[i][0];
                sums[cluster][1] += fweights[i] * coords[i][1];
                totals[cluster] += fweights[i];
            }
            let mut shift = 0.0f64;
            for c in 0..k {
                if totals[c] > 0.0 {
                    let updated = [sums[c][0] / totals[c], sums[c][1] / totals[c]];
                    shift = shift.max(squared_distance(&centroids[c], &updated).sqrt());
                    centroids[c] = updated;
                } else {
                    // Re-seed an empty cluster on the point farthest from
                    // its current centroid.
                    let farthest = (0..n)
                        .max_by(|&a, &b| {
                            let da = fweights[a]
                                * squared_distance(&coords[a], &centroids[assignment[a]]);
                            let db = fweights[b]
                                * squared_distance(&coords[b], &centroids[assignment[b]]);
                            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                        })
                        .unwrap();
                    centroids[c] = coords[farthest];
                    shift = f64::INFINITY;
                }
            }
            if shift < params.tol {
                break;
            }
        }

        let inertia: f64 = coords
            .iter()
            .enumerate()
            .map(|(i, p)| fweights[i] * squared_distance(p, &centroids[assignment[i]]))
            .sum();
        if best.as_ref().map_or(true, |(b, _)| inertia < *b) {
            best = Some((inertia, assignment));
        }
    }

    relabel_compact(best.unwrap().1, k)
}

/// Hierarchical agglomerative clustering (average linkage) on feature rows.
pub fn busmap_by_hac(rows: &[Vec<f64>], k: usize) -> Vec<usize> {
    let n = rows.len();
    assert!(k >= 1 && k <= n, "cluster count must lie in [1, n]");
    if k == n {
        return (0..n).collect();
    }

    let mut distance = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = squared_distance(&rows[i], &rows[j]).sqrt();
            distance[i][j] = d;
            distance[j][i] = d;
        }
    }

    let mut active: Vec<bool> = vec![true; n];
    let mut size: Vec<usize> = vec![1; n];
    let mut member_of: Vec<usize> = (0..n).collect();
    let mut remaining = n;

    while remaining > k {
        // Closest active pair, ties broken by index order.
        let mut best: Option<(f64, usize, usize)> = None;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !active[j] {
                    continue;
                }
                if best.map_or(true, |(d, _, _)| distance[i][j] < d) {
                    best = Some((distance[i][j], i, j));
                }
            }
        }
        let (_, i, j) = best.expect("at least two active clusters");

        // Lance-Williams update for average linkage.
        for l in 0..n {
            if !active[l] || l == i || l == j {
                continue;
            }
            let d = (size[i] as f64 * distance[i][l] + size[j] as f64 * distance[j][l])
                / (size[i] + size[j]) as f64;
            distance[i][l] = d;
            distance[l][i] = d;
        }
        size[i] += size[j];
        active[j] = false;
        for m in member_of.iter_mut() {
            if *m == j {
                *m = i;
            }
        }
        remaining -= 1;
    }

    relabel_compact(member_of, k)
}

/// Greedy modularity maximization (CNM) on the intra-partition line graph,
/// merged down to exactly `k` communities.
pub fn busmap_by_modularity(buses: &[String], adjacency: &Adjacency, k: usize) -> Vec<usize> {
    let n = buses.len();
    assert!(k >= 1 && k <= n, "cluster count must lie in [1, n]");
    if k == n {
        return (0..n).collect();
    }

    let index_of = |bus: &str| buses.iter().position(|b| b == bus);

    // Community edge weights; every branch contributes weight 1.
    let mut community: Vec<usize> = (0..n).collect();
    let mut e: Vec<Vec<f64>> = vec![vec![0.0; n]; n];
    let mut degree: Vec<f64> = vec![0.0; n];
    let mut m2 = 0.0f64; // twice the edge count
    for (bus, neighbors) in adjacency {
        let Some(i) = index_of(bus) else { continue };
        for (neighbor, branches) in neighbors {
            let Some(j) = index_of(neighbor) else { continue };
            let w = branches.len() as f64;
            if i < j {
                e[i][j] += w;
                e[j][i] += w;
                m2 += 2.0 * w;
            }
            degree[i] += w;
        }
    }

    let mut active: Vec<bool> = vec![true; n];
    let mut remaining = n;
    while remaining > k {
        // Best merge by modularity gain; disconnected communities may still
        // be merged (negative gain) once nothing better is left.
        let mut best: Option<(f64, usize, usize)> = None;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !active[j] {
                    continue;
                }
                let gain = if m2 > 0.0 {
                    2.0 * (e[i][j] / m2 - (degree[i] / m2) * (degree[j] / m2))
                } else {
                    0.0
                };
                if best.map_or(true, |(g, _, _)| gain > g) {
                    best = Some((gain, i, j));
                }
            }
        }
        let (_, i, j) = best.expect("at least two active communities");

        for l in 0..n {
            if !active[l] || l == i || l == j {
                continue;
            }
            e[i][l] += e[j][l];
            e[l][i] = e[i][l];
        }
        degree[i] += degree[j];
        active[j] = false;
        for c in community.iter_mut() {
            if *c == j {
                *c = i;
            }
        }
        remaining -= 1;
    }

    relabel_compact(community, k)
}

/// Compact arbitrary representative labels to 0..k, ordered by first
/// occurrence.
fn relabel_compact(raw: Vec<usize>, k: usize) -> Vec<usize> {
    let mut mapping: Vec<(usize, usize)> = Vec::with_capacity(k);
    let mut labels = Vec::with_capacity(raw.len());
    for value in raw {
        let label = match mapping.iter().find(|(from, _)| *from == value) {
            Some((_, to)) => *to,
            None => {
                let to = mapping.len();
                mapping.push((value, to));
                to
            }
        };
        labels.push(label);
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assemble, bus, gen, line, load};
    use grt_core::line_adjacency;

    fn fast_kmeans() -> KMeansParams {
        KMeansParams {
            n_init: 10,
            max_iter: 300,
            tol: 1e-9,
            seed: 0,
        }
    }

    #[test]
    fn test_unknown_algorithm_is_fatal() {
        let result = ClusteringAlgorithm::from_config("voronoi", None, KMeansParams::default());
        assert!(matches!(result, Err(GrtError::Config(_))));
    }

    #[test]
    fn test_kmeans_k1_returns_single_label() {
        let points = vec![(0.0, 0.0), (1.0, 0.0), (5.0, 5.0)];
        let labels = busmap_by_kmeans(&points, &[1, 1, 1], 1, &fast_kmeans());
        assert_eq!(labels, vec![0, 0, 0]);
    }

    #[test]
    fn test_kmeans_separates_distant_groups() {
        let points = vec![
            (0.0, 0.0),
            (0.1, 0.0),
            (0.0, 0.1),
            (10.0, 10.0),
            (10.1, 10.0),
        ];
        let labels = busmap_by_kmeans(&points, &[1; 5], 2, &fast_kmeans());
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_kmeans_is_deterministic() {
        let points: Vec<(f64, f64)> = (0..12)
            .map(|i| ((i % 4) as f64, (i / 4) as f64 * 3.0))
            .collect();
        let weights: Vec<u64> = (0..12).map(|i| 1 + (i as u64 % 3)).collect();
        let a = busmap_by_kmeans(&points, &weights, 3, &fast_kmeans());
        let b = busmap_by_kmeans(&points, &weights, 3, &fast_kmeans());
        assert_eq!(a, b);
    }

    #[test]
    fn test_hac_groups_similar_profiles() {
        let rows = vec![
            vec![0.9, 0.8],
            vec![0.85, 0.82],
            vec![0.1, 0.05],
            vec![0.12, 0.08],
        ];
        let labels = busmap_by_hac(&rows, 2);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_modularity_respects_dense_blocks() {
        // Two triangles joined by a single bridge.
        let network = assemble(
            vec![
                bus(0, "a0", 0.0, 0.0, "DE"),
                bus(1, "a1", 1.0, 0.0, "DE"),
                bus(2, "a2", 0.0, 1.0, "DE"),
                bus(3, "b0", 5.0, 0.0, "DE"),
                bus(4, "b1", 6.0, 0.0, "DE"),
                bus(5, "b2", 5.0, 1.0, "DE"),
            ],
            vec![
                line(0, "a01", "a0", "a1", 1.0, 1.0),
                line(1, "a12", "a1", "a2", 1.0, 1.0),
                line(2, "a20", "a2", "a0", 1.0, 1.0),
                line(3, "b01", "b0", "b1", 1.0, 1.0),
                line(4, "b12", "b1", "b2", 1.0, 1.0),
                line(5, "b20", "b2", "b0", 1.0, 1.0),
                line(6, "bridge", "a0", "b0", 1.0, 1.0),
            ],
            vec![],
            vec![],
            vec![],
        );
        let buses: Vec<String> = ["a0", "a1", "a2", "b0", "b1", "b2"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let labels = busmap_by_modularity(&buses, &line_adjacency(&network), 2);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_eq!(labels[3], labels[5]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn test_weighting_floors_at_one() {
        let network = assemble(
            vec![
                bus(0, "a", 0.0, 0.0, "DE"),
                bus(1, "b", 1.0, 0.0, "DE"),
                bus(2, "c", 2.0, 0.0, "DE"),
            ],
            vec![
                line(0, "ab", "a", "b", 100.0, 1.0),
                line(1, "bc", "b", "c", 100.0, 1.0),
            ],
            vec![],
            vec![gen(0, "gas a", "a", "OCGT", 100.0, 0.0)],
            vec![load(0, "d a", "a", 50.0)],
        );
        let buses: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let weights = weighting_for_partition(&network, &buses);
        assert_eq!(weights[0], 100);
        assert_eq!(weights[1], 1);
        assert_eq!(weights[2], 1);
    }
}
