//! Distribute a target cluster count across country/sub-network (or TSO)
//! partitions.
//!
//! Each partition p with N_p buses receives an integer count n_p with
//! `sum n_p = K` and `1 <= n_p <= N_p`, minimizing `sum (n_p - L_p K)^2`
//! where L_p is the partition's share of the total mean load. Country
//! weights (optionally refined by per-TSO weights) pin the aggregate share
//! of named partitions; the residual share is spread over the unnamed ones
//! proportional to their load.
//!
//! The continuous relaxation is solved by a [`QpBackend`]; the relaxed
//! optimum is rounded and then repaired by greedy unit transfers, which is
//! exact for this separable convex objective.

use super::solver::QpBackend;
use grt_core::{GrtError, GrtResult, Network};
use std::collections::BTreeMap;
use tracing::warn;

/// Key of one allocation partition: country plus sub-network or TSO label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    pub country: String,
    pub sub: String,
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.country, self.sub)
    }
}

/// Group bus names by partition key. With `by_tso`, every bus must carry a
/// TSO assignment (merged beforehand from the external bus-TSO table).
pub fn partition_buses(
    network: &Network,
    by_tso: bool,
) -> GrtResult<BTreeMap<PartitionKey, Vec<String>>> {
    let mut partitions: BTreeMap<PartitionKey, Vec<String>> = BTreeMap::new();
    let mut buses = network.buses();
    buses.sort_by(|a, b| a.name.cmp(&b.name));
    for bus in buses {
        let sub = if by_tso {
            bus.tso.clone().ok_or_else(|| {
                GrtError::Config(format!(
                    "bus `{}` has no TSO assignment; TSO weighting needs a complete bus-TSO table",
                    bus.name
                ))
            })?
        } else {
            bus.sub_network.clone()
        };
        partitions
            .entry(PartitionKey {
                country: bus.country.clone(),
                sub,
            })
            .or_default()
            .push(bus.name.clone());
    }
    Ok(partitions)
}

fn renormalize(values: &mut BTreeMap<PartitionKey, f64>, keys: &[PartitionKey], scale: f64) {
    let subtotal: f64 = keys.iter().map(|k| values[k]).sum();
    for key in keys {
        let share = if subtotal > 0.0 {
            values[key] / subtotal
        } else {
            1.0 / keys.len() as f64
        };
        values.insert(key.clone(), share * scale);
    }
}

/// Solve the cluster-count allocation. See the module docs for the program.
pub fn distribute_clusters(
    network: &Network,
    n_clusters: usize,
    country_weights: Option<&BTreeMap<String, f64>>,
    tso_weights: Option<&BTreeMap<String, BTreeMap<String, f64>>>,
    backend: &dyn QpBackend,
) -> GrtResult<BTreeMap<PartitionKey, usize>> {
    if tso_weights.is_some() && country_weights.is_none() {
        return Err(GrtError::Config(
            "TSO weights can only be used in combination with country weights".into(),
        ));
    }
    let by_tso = tso_weights.is_some();
    let partitions = partition_buses(network, by_tso)?;
    let sizes: BTreeMap<&PartitionKey, usize> =
        partitions.iter().map(|(k, buses)| (k, buses.len())).collect();
    let total_buses: usize = sizes.values().sum();

    if n_clusters < partitions.len() || n_clusters > total_buses {
        return Err(GrtError::Config(format!(
            "number of clusters must be {} <= n_clusters <= {} for this selection of countries, \
             is {n_clusters}",
            partitions.len(),
            total_buses
        )));
    }

    // Load share per partition.
    let mut bus_load: BTreeMap<&str, f64> = BTreeMap::new();
    for load in network.loads() {
        *bus_load.entry(load.bus.as_str()).or_default() += load.mean_p_set();
    }
    let mut shares: BTreeMap<PartitionKey, f64> = partitions
        .iter()
        .map(|(key, buses)| {
            let load: f64 = buses
                .iter()
                .map(|b| bus_load.get(b.as_str()).copied().unwrap_or(0.0))
                .sum();
            (key.clone(), load)
        })
        .collect();
    let total_load: f64 = shares.values().sum();
    if total_load <= 0.0 {
        return Err(GrtError::Config(
            "network carries no load; cannot derive load-based cluster shares".into(),
        ));
    }
    for value in shares.values_mut() {
        *value /= total_load;
    }

    if let Some(weights) = country_weights {
        let total_country: f64 = weights.values().sum();
        if total_country > 1.0 + 1e-9 {
            return Err(GrtError::Config(format!(
                "the sum of country weights must be less than or equal to 1.0, is {total_country}"
            )));
        }

        for (country, weight) in weights {
            let keys: Vec<PartitionKey> = shares
                .keys()
                .filter(|k| &k.country == country)
                .cloned()
                .collect();
            if keys.is_empty() {
                return Err(GrtError::Config(format!(
                    "country weight given for `{country}`, which has no buses"
                )));
            }
            match tso_weights.and_then(|t| t.get(country)) {
                Some(per_tso) => {
                    let total_tso: f64 = per_tso.values().sum();
                    if total_tso > 1.0 + 1e-9 {
                        return Err(GrtError::Config(format!(
                            "the sum of TSO weights for {country} must be less than or equal to 1.0"
                        )));
                    }
                    for (tso, tso_weight) in per_tso {
                        let key = PartitionKey {
                            country: country.clone(),
                            sub: tso.clone(),
                        };
                        if !shares.contains_key(&key) {
                            return Err(GrtError::Config(format!(
                                "TSO weight given for `{country}/{tso}`, which has no buses"
                            )));
                        }
                        shares.insert(key, tso_weight * weight);
                    }
                    let remainder: Vec<PartitionKey> = keys
                        .iter()
                        .filter(|k| !per_tso.contains_key(&k.sub))
                        .cloned()
                        .collect();
                    if !remainder.is_empty() {
                        renormalize(&mut shares, &remainder, (1.0 - total_tso) * weight);
                    }
                }
                None => renormalize(&mut shares, &keys, *weight),
            }
        }

        let remainder: Vec<PartitionKey> = shares
            .keys()
            .filter(|k| !weights.contains_key(&k.country))
            .cloned()
            .collect();
        if !remainder.is_empty() {
            renormalize(&mut shares, &remainder, 1.0 - total_country);
        }
        warn!(
            "using custom {} weights for determining the cluster distribution",
            if by_tso { "country and TSO" } else { "country" }
        );
    }

    let share_sum: f64 = shares.values().sum();
    if (share_sum - 1.0).abs() > 1e-3 {
        return Err(GrtError::Validation(format!(
            "partition shares must sum up to 1.0 when distributing clusters, is {share_sum}"
        )));
    }

    let keys: Vec<PartitionKey> = shares.keys().cloned().collect();
    let targets: Vec<f64> = keys
        .iter()
        .map(|k| shares[k] * n_clusters as f64)
        .collect();
    let upper: Vec<f64> = keys.iter().map(|k| sizes[k] as f64).collect();

    let relaxed = backend.solve_box_sum_qp(&targets, &upper, n_clusters as f64)?;

    // Integer rounding plus greedy repair of the sum constraint.
    let mut counts: Vec<i64> = relaxed
        .iter()
        .zip(&upper)
        .map(|(x, n)| (x.round() as i64).clamp(1, *n as i64))
        .collect();
    let mut deficit = n_clusters as i64 - counts.iter().sum::<i64>();
    while deficit != 0 {
        let step = deficit.signum();
        let candidate = (0..counts.len())
            .filter(|&i| {
                let next = counts[i] + step;
                next >= 1 && next <= upper[i] as i64
            })
            .min_by(|&a, &b| {
                let penalty = |i: usize| {
                    let c = counts[i] as f64;
                    let t = targets[i];
                    (c + step as f64 - t).powi(2) - (c - t).powi(2)
                };
                penalty(a)
                    .partial_cmp(&penalty(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        let Some(i) = candidate else {
            return Err(GrtError::Solver(
                "cluster-count repair found no feasible adjustment".into(),
            ));
        };
        counts[i] += step;
        deficit -= step;
    }

    Ok(keys
        .into_iter()
        .zip(counts)
        .map(|(key, count)| (key, count as usize))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::solver::ClarabelQp;
    use crate::test_utils::{assemble, bus, line, load};
    use grt_core::determine_sub_networks;

    /// Two countries on one synchronous grid: DE with three buses carrying
    /// most of the load, FR with two buses.
    fn two_country_network() -> Network {
        let mut network = assemble(
            vec![
                bus(0, "de0", 0.0, 0.0, "DE"),
                bus(1, "de1", 1.0, 0.0, "DE"),
                bus(2, "de2", 2.0, 0.0, "DE"),
                bus(3, "fr0", 0.0, 2.0, "FR"),
                bus(4, "fr1", 1.0, 2.0, "FR"),
            ],
            vec![
                line(0, "d01", "de0", "de1", 100.0, 1.0),
                line(1, "d12", "de1", "de2", 100.0, 1.0),
                line(2, "f01", "fr0", "fr1", 100.0, 1.0),
                line(3, "x", "de0", "fr0", 100.0, 1.0),
            ],
            vec![],
            vec![],
            vec![
                load(0, "l de0", "de0", 100.0),
                load(1, "l de1", "de1", 100.0),
                load(2, "l de2", "de2", 100.0),
                load(3, "l fr0", "fr0", 50.0),
                load(4, "l fr1", "fr1", 50.0),
            ],
        );
        determine_sub_networks(&mut network);
        network
    }

    #[test]
    fn test_counts_sum_exactly_and_respect_bounds() {
        let network = two_country_network();
        let counts =
            distribute_clusters(&network, 4, None, None, &ClarabelQp).unwrap();

        assert_eq!(counts.values().sum::<usize>(), 4);
        let de: usize = counts
            .iter()
            .filter(|(k, _)| k.country == "DE")
            .map(|(_, c)| c)
            .sum();
        let fr: usize = counts
            .iter()
            .filter(|(k, _)| k.country == "FR")
            .map(|(_, c)| c)
            .sum();
        // DE carries 75% of the load.
        assert_eq!(de, 3);
        assert_eq!(fr, 1);
        for (key, count) in &counts {
            assert!(*count >= 1, "partition {key} got no cluster");
        }
    }

    #[test]
    fn test_country_weights_cap_at_partition_size() {
        let network = two_country_network();
        let mut weights = BTreeMap::new();
        weights.insert("FR".to_string(), 0.9);
        let counts =
            distribute_clusters(&network, 5, Some(&weights), None, &ClarabelQp).unwrap();

        // FR wants 90% of five clusters but only has two buses.
        let fr: usize = counts
            .iter()
            .filter(|(k, _)| k.country == "FR")
            .map(|(_, c)| c)
            .sum();
        assert_eq!(fr, 2);
        assert_eq!(counts.values().sum::<usize>(), 5);
    }

    #[test]
    fn test_excessive_weights_are_fatal() {
        let network = two_country_network();
        let mut weights = BTreeMap::new();
        weights.insert("DE".to_string(), 0.8);
        weights.insert("FR".to_string(), 0.5);
        let result = distribute_clusters(&network, 4, Some(&weights), None, &ClarabelQp);
        assert!(matches!(result, Err(GrtError::Config(_))));
    }

    #[test]
    fn test_tso_weights_require_country_weights() {
        let network = two_country_network();
        let tso = BTreeMap::new();
        let result = distribute_clusters(&network, 4, None, Some(&tso), &ClarabelQp);
        assert!(matches!(result, Err(GrtError::Config(_))));
    }

    #[test]
    fn test_infeasible_totals_are_fatal() {
        let network = two_country_network();
        // Fewer clusters than partitions.
        assert!(matches!(
            distribute_clusters(&network, 1, None, None, &ClarabelQp),
            Err(GrtError::Config(_))
        ));
        // More clusters than buses.
        assert!(matches!(
            distribute_clusters(&network, 9, None, None, &ClarabelQp),
            Err(GrtError::Config(_))
        ));
    }
}
