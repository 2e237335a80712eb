//! Feature extraction for HAC clustering, plus the country-label repair it
//! needs.
//!
//! HAC groups buses by the similarity of their renewable resource, read off
//! the capacity-factor profiles of the selected carriers. The feature
//! selector string has the form `"<carrier>[+<carrier>...]-<cap|time>"`:
//! `cap` yields one mean capacity factor per carrier and bus, `time` the
//! full concatenated profiles. `offwind` expands to every offwind-prefixed
//! carrier present in the network.

use grt_core::{adjacency_with, component_labels, Adjacency, Edge, GrtError, GrtResult, Network, Node};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureMode {
    /// Per-carrier mean capacity factor
    Cap,
    /// Full time series
    Time,
}

/// Parsed feature selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpec {
    pub carriers: Vec<String>,
    pub mode: FeatureMode,
}

impl Default for FeatureSpec {
    fn default() -> Self {
        Self {
            carriers: vec!["solar".to_string(), "onwind".to_string()],
            mode: FeatureMode::Time,
        }
    }
}

impl std::str::FromStr for FeatureSpec {
    type Err = GrtError;

    fn from_str(s: &str) -> GrtResult<Self> {
        let (carriers, mode) = s.rsplit_once('-').ok_or_else(|| {
            GrtError::Config(format!(
                "feature selector `{s}` must have the form `<carrier>[+<carrier>...]-<cap|time>`"
            ))
        })?;
        let mode = match mode {
            "cap" => FeatureMode::Cap,
            "time" => FeatureMode::Time,
            other => {
                return Err(GrtError::Config(format!(
                    "unknown feature mode `{other}`, expected `cap` or `time`"
                )))
            }
        };
        let carriers: Vec<String> = carriers
            .split('+')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        if carriers.is_empty() {
            return Err(GrtError::Config(format!(
                "feature selector `{s}` names no carriers"
            )));
        }
        Ok(Self { carriers, mode })
    }
}

fn expand_carriers(network: &Network, carriers: &[String]) -> Vec<String> {
    let mut expanded: Vec<String> = Vec::new();
    for carrier in carriers {
        if carrier == "offwind" {
            let mut offwind: Vec<String> = network
                .generators()
                .iter()
                .filter(|g| g.carrier.starts_with("offwind"))
                .map(|g| g.carrier.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();
            expanded.append(&mut offwind);
        } else {
            expanded.push(carrier.clone());
        }
    }
    expanded
}

/// Build the per-bus feature rows for HAC. Buses without matching generators
/// get zero-filled rows, so every bus has a row of equal width.
pub fn hac_features(network: &Network, spec: &FeatureSpec) -> BTreeMap<String, Vec<f64>> {
    let carriers = expand_carriers(network, &spec.carriers);
    let n_samples = network.snapshots.len();

    // carrier -> bus -> (profile sum, count) for averaging parallel units
    let mut per_carrier: BTreeMap<&str, BTreeMap<&str, (Vec<f64>, usize)>> = BTreeMap::new();
    for gen in network.generators() {
        if !carriers.iter().any(|c| c == &gen.carrier) {
            continue;
        }
        let profile = match &gen.p_max_pu {
            Some(p) => p.clone(),
            None => vec![1.0; n_samples],
        };
        let slot = per_carrier
            .entry(gen.carrier.as_str())
            .or_default()
            .entry(gen.bus.as_str())
            .or_insert_with(|| (vec![0.0; n_samples], 0));
        for (t, v) in profile.iter().enumerate() {
            if t < slot.0.len() {
                slot.0[t] += v;
            }
        }
        slot.1 += 1;
    }

    let mut features: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for bus in network.buses() {
        let mut row = Vec::new();
        for carrier in &carriers {
            let averaged: Vec<f64> = match per_carrier
                .get(carrier.as_str())
                .and_then(|buses| buses.get(bus.name.as_str()))
            {
                Some((sum, count)) => sum.iter().map(|v| v / *count as f64).collect(),
                None => vec![0.0; n_samples],
            };
            match spec.mode {
                FeatureMode::Cap => {
                    let mean = if averaged.is_empty() {
                        0.0
                    } else {
                        averaged.iter().sum::<f64>() / averaged.len() as f64
                    };
                    row.push(mean);
                }
                FeatureMode::Time => row.extend(averaged),
            }
        }
        features.insert(bus.name.clone(), row);
    }
    features
}

fn restricted_adjacency(lines: &Adjacency, members: &BTreeSet<String>) -> Adjacency {
    let mut adj: Adjacency = members
        .iter()
        .map(|b| (b.clone(), BTreeMap::new()))
        .collect();
    for bus in members {
        if let Some(neighbors) = lines.get(bus) {
            for (neighbor, branches) in neighbors {
                if members.contains(neighbor) {
                    adj.get_mut(bus)
                        .unwrap()
                        .insert(neighbor.clone(), branches.clone());
                }
            }
        }
    }
    adj
}

/// Re-home buses that are disconnected from their country's internal line
/// topology: every bus outside the largest intra-country component whose
/// lines reach another country is relabeled to that neighbor's country.
/// Logged, never fatal; HAC needs country groups that are internally
/// connected.
pub fn fix_country_assignment_for_hac(network: &mut Network) {
    let countries: BTreeSet<String> =
        network.buses().iter().map(|b| b.country.clone()).collect();
    let full_lines = adjacency_with(network, |e| matches!(e, Edge::Line(_)));

    let mut reassignments: Vec<(String, String, String)> = Vec::new();
    for country in &countries {
        let members: BTreeSet<String> = network
            .buses()
            .iter()
            .filter(|b| &b.country == country)
            .map(|b| b.name.clone())
            .collect();
        let labels = component_labels(&restricted_adjacency(&full_lines, &members));

        let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
        for label in labels.values() {
            *sizes.entry(*label).or_default() += 1;
        }
        if sizes.len() <= 1 {
            continue;
        }
        let largest = sizes
            .iter()
            .max_by_key(|(label, size)| (**size, usize::MAX - **label))
            .map(|(label, _)| *label)
            .unwrap();

        for (bus, label) in &labels {
            if *label == largest {
                continue;
            }
            let neighbor_country = full_lines.get(bus).and_then(|neighbors| {
                neighbors.keys().find_map(|n| {
                    network
                        .bus(n)
                        .map(|b| b.country.clone())
                        .filter(|c| c != country)
                })
            });
            if let Some(new_country) = neighbor_country {
                reassignments.push((bus.clone(), country.clone(), new_country));
            }
        }
    }

    for (bus_name, old_country, new_country) in reassignments {
        info!(
            "overwriting country `{old_country}` of bus `{bus_name}` to new country \
             `{new_country}`, because it is disconnected from its initial intra-country \
             transmission grid"
        );
        for node in network.graph.node_weights_mut() {
            if let Node::Bus(bus) = node {
                if bus.name == bus_name {
                    bus.country = new_country.clone();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assemble, bus, gen, line};
    use grt_core::Generator;

    #[test]
    fn test_feature_spec_parsing() {
        let spec: FeatureSpec = "solar+onwind-time".parse().unwrap();
        assert_eq!(spec.carriers, vec!["solar", "onwind"]);
        assert_eq!(spec.mode, FeatureMode::Time);

        let spec: FeatureSpec = "offwind-cap".parse().unwrap();
        assert_eq!(spec.mode, FeatureMode::Cap);

        assert!("solar".parse::<FeatureSpec>().is_err());
        assert!("solar-banana".parse::<FeatureSpec>().is_err());
    }

    fn profile_gen(id: usize, name: &str, bus: &str, carrier: &str, profile: Vec<f64>) -> Generator {
        Generator {
            p_max_pu: Some(profile),
            ..gen(id, name, bus, carrier, 10.0, 0.0)
        }
    }

    #[test]
    fn test_cap_features_are_mean_capacity_factors() {
        let network = assemble(
            vec![bus(0, "a", 0.0, 0.0, "DE"), bus(1, "b", 1.0, 0.0, "DE")],
            vec![line(0, "l", "a", "b", 100.0, 1.0)],
            vec![],
            vec![profile_gen(0, "solar a", "a", "solar", vec![0.2, 0.4])],
            vec![],
        );
        let spec: FeatureSpec = "solar-cap".parse().unwrap();
        let features = hac_features(&network, &spec);

        assert!((features["a"][0] - 0.3).abs() < 1e-12);
        assert_eq!(features["b"], vec![0.0]);
    }

    #[test]
    fn test_time_features_concatenate_profiles() {
        let network = assemble(
            vec![bus(0, "a", 0.0, 0.0, "DE")],
            vec![],
            vec![],
            vec![
                profile_gen(0, "solar a", "a", "solar", vec![0.1, 0.2]),
                profile_gen(1, "wind a", "a", "onwind", vec![0.5, 0.6]),
            ],
            vec![],
        );
        let spec: FeatureSpec = "solar+onwind-time".parse().unwrap();
        let features = hac_features(&network, &spec);
        assert_eq!(features["a"], vec![0.1, 0.2, 0.5, 0.6]);
    }

    #[test]
    fn test_disconnected_bus_changes_country() {
        // `de_far` has no line to the rest of DE, but one into FR.
        let mut network = assemble(
            vec![
                bus(0, "de0", 0.0, 0.0, "DE"),
                bus(1, "de1", 1.0, 0.0, "DE"),
                bus(2, "de_far", 5.0, 5.0, "DE"),
                bus(3, "fr0", 5.0, 6.0, "FR"),
            ],
            vec![
                line(0, "d01", "de0", "de1", 100.0, 1.0),
                line(1, "far", "de_far", "fr0", 100.0, 1.0),
            ],
            vec![],
            vec![],
            vec![],
        );
        fix_country_assignment_for_hac(&mut network);
        assert_eq!(network.bus("de_far").unwrap().country, "FR");
        assert_eq!(network.bus("de0").unwrap().country, "DE");
    }
}
