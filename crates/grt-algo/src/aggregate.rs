//! Generic network aggregation driven by a busmap.
//!
//! Two entry points share the one-port merging machinery:
//!
//! - [`aggregate_and_move`] is the simplify-stage path: buses outside the
//!   busmap image are deleted, branches touching them disappear, and one-port
//!   components are folded onto their surviving representative. Branch
//!   endpoints are not relabeled; folded branches were already replaced by
//!   the calling stage.
//! - [`aggregate_network`] is the cluster-stage path: one new bus is created
//!   per cluster label, branch endpoints are relabeled through the busmap,
//!   intra-cluster branches vanish, and parallel corridors between the same
//!   cluster pair are merged into equivalent branches. It also emits the
//!   branch identity map ("linemap") for traceability.
//!
//! Per-attribute merge behavior is controlled by an [`AggregationStrategies`]
//! table; the defaults sum capacities and capacity-weight costs and profiles.

use crate::costs::{apply_connection_costs, ConnectionCostReport, ConnectionCosts};
use grt_core::{
    Bus, BusId, Busmap, GenId, Generator, GrtError, GrtResult, Line, LineId, Link, LinkId,
    Load, LoadId, Network, StorageId, StorageUnit,
};
use std::collections::{BTreeMap, BTreeSet};

/// How to reduce one attribute across the members of a merge group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sum,
    Mean,
    /// Mean weighted by installed capacity (`p_nom`)
    WeightedMean,
    Max,
    Min,
    /// Value of the first member (members are sorted by name)
    First,
}

impl std::str::FromStr for Strategy {
    type Err = GrtError;

    fn from_str(s: &str) -> GrtResult<Self> {
        match s {
            "sum" => Ok(Strategy::Sum),
            "mean" => Ok(Strategy::Mean),
            "weighted_mean" | "capacity_weighted_average" => Ok(Strategy::WeightedMean),
            "max" => Ok(Strategy::Max),
            "min" => Ok(Strategy::Min),
            "first" => Ok(Strategy::First),
            other => Err(GrtError::Config(format!(
                "unknown aggregation strategy `{other}`"
            ))),
        }
    }
}

/// Attribute -> strategy tables for buses and generators, with optional
/// per-carrier generator overrides.
#[derive(Debug, Clone, Default)]
pub struct AggregationStrategies {
    pub bus: BTreeMap<String, Strategy>,
    pub generator: BTreeMap<String, Strategy>,
    pub generator_by_carrier: BTreeMap<String, BTreeMap<String, Strategy>>,
}

impl AggregationStrategies {
    fn bus_strategy(&self, attr: &str) -> Strategy {
        if let Some(s) = self.bus.get(attr) {
            return *s;
        }
        match attr {
            "x" | "y" => Strategy::Mean,
            _ => Strategy::First,
        }
    }

    fn generator_strategy(&self, carrier: &str, attr: &str) -> Strategy {
        if let Some(s) = self.generator_by_carrier.get(carrier).and_then(|t| t.get(attr)) {
            return *s;
        }
        if let Some(s) = self.generator.get(attr) {
            return *s;
        }
        match attr {
            "p_nom" | "p_nom_max" => Strategy::Sum,
            "capital_cost" | "marginal_cost" | "p_max_pu" => Strategy::WeightedMean,
            _ => Strategy::First,
        }
    }

    /// The `p_nom_max` policy must agree across every carrier that is merged
    /// in the same pass; a disagreement would silently mix expansion limits.
    fn consense_p_nom_max(&self, carriers: &BTreeSet<String>) -> GrtResult<Strategy> {
        let mut agreed: Option<(Strategy, String)> = None;
        for carrier in carriers {
            let strategy = self.generator_strategy(carrier, "p_nom_max");
            match &agreed {
                None => agreed = Some((strategy, carrier.clone())),
                Some((s, first)) if *s != strategy => {
                    return Err(GrtError::Validation(format!(
                        "the `p_nom_max` aggregation strategy must agree for all aggregated \
                         carriers; `{first}` and `{carrier}` differ"
                    )))
                }
                _ => {}
            }
        }
        Ok(agreed.map(|(s, _)| s).unwrap_or(Strategy::Sum))
    }
}

fn reduce(strategy: Strategy, values: &[f64], weights: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match strategy {
        Strategy::Sum => values.iter().sum(),
        Strategy::Mean => values.iter().sum::<f64>() / values.len() as f64,
        Strategy::WeightedMean => {
            let total: f64 = weights.iter().sum();
            if total <= 0.0 {
                values.iter().sum::<f64>() / values.len() as f64
            } else {
                values
                    .iter()
                    .zip(weights)
                    .map(|(v, w)| v * w)
                    .sum::<f64>()
                    / total
            }
        }
        Strategy::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        Strategy::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
        Strategy::First => values[0],
    }
}

/// Merge optional per-unit profiles; members without a profile contribute a
/// constant 1.0 (full availability). All-static groups stay static.
fn reduce_profiles(
    profiles: &[Option<&Vec<f64>>],
    weights: &[f64],
    n_samples: usize,
) -> Option<Vec<f64>> {
    if profiles.iter().all(Option::is_none) {
        return None;
    }
    let total: f64 = weights.iter().sum();
    let mut merged = vec![0.0; n_samples];
    for (member, weight) in profiles.iter().zip(weights) {
        let w = if total > 0.0 {
            weight / total
        } else {
            1.0 / profiles.len() as f64
        };
        for (t, slot) in merged.iter_mut().enumerate() {
            let value = member.map_or(1.0, |p| p.get(t).copied().unwrap_or(0.0));
            *slot += w * value;
        }
    }
    Some(merged)
}

/// Re-homed and merged one-port components.
#[derive(Debug, Default)]
pub struct OnePortAggregation {
    pub generators: Vec<Generator>,
    pub loads: Vec<Load>,
    pub storage_units: Vec<StorageUnit>,
}

/// Merge all one-port components according to the busmap.
///
/// Generators merge within `(target bus, carrier)` groups; when
/// `aggregate_carriers` is given, only those carriers merge and the rest are
/// re-homed untouched (the fixed-renewable-resolution variant).
pub fn aggregate_one_ports(
    network: &Network,
    busmap: &Busmap,
    strategies: &AggregationStrategies,
    aggregate_carriers: Option<&BTreeSet<String>>,
) -> GrtResult<OnePortAggregation> {
    let n_samples = network.snapshots.len();
    let mut out = OnePortAggregation::default();

    if let Some(carriers) = aggregate_carriers {
        strategies.consense_p_nom_max(carriers)?;
    }

    // Generators
    let mut merge_groups: BTreeMap<(String, String), Vec<&Generator>> = BTreeMap::new();
    let mut kept: Vec<Generator> = Vec::new();
    let mut gens = network.generators();
    gens.sort_by(|a, b| a.name.cmp(&b.name));
    for gen in gens {
        let target = busmap.apply(&gen.bus).to_string();
        let aggregatable = aggregate_carriers.map_or(true, |set| set.contains(&gen.carrier));
        if aggregatable {
            merge_groups
                .entry((target, gen.carrier.clone()))
                .or_default()
                .push(gen);
        } else {
            let mut moved = gen.clone();
            moved.bus = target;
            kept.push(moved);
        }
    }
    let mut next_gen = 0usize;
    for ((bus, carrier), members) in merge_groups {
        let p_noms: Vec<f64> = members.iter().map(|g| g.p_nom).collect();
        let take = |attr: &str, values: &[f64]| {
            reduce(strategies.generator_strategy(&carrier, attr), values, &p_noms)
        };
        let p_nom_maxes: Vec<f64> = members.iter().map(|g| g.p_nom_max).collect();
        let capital: Vec<f64> = members.iter().map(|g| g.capital_cost).collect();
        let marginal: Vec<f64> = members.iter().map(|g| g.marginal_cost).collect();
        let profiles: Vec<Option<&Vec<f64>>> =
            members.iter().map(|g| g.p_max_pu.as_ref()).collect();

        let merged = Generator {
            id: GenId::new(next_gen),
            name: if members.len() == 1 {
                members[0].name.clone()
            } else {
                format!("{bus} {carrier}")
            },
            bus,
            carrier: carrier.clone(),
            p_nom: reduce(Strategy::Sum, &p_noms, &p_noms),
            p_nom_max: take("p_nom_max", &p_nom_maxes),
            capital_cost: take("capital_cost", &capital),
            marginal_cost: take("marginal_cost", &marginal),
            p_max_pu: match strategies.generator_strategy(&carrier, "p_max_pu") {
                Strategy::First => members[0].p_max_pu.clone(),
                _ => reduce_profiles(&profiles, &p_noms, n_samples),
            },
        };
        next_gen += 1;
        out.generators.push(merged);
    }
    for mut gen in kept {
        gen.id = GenId::new(next_gen);
        next_gen += 1;
        out.generators.push(gen);
    }

    // Loads: demand profiles add up within each target bus.
    let mut load_groups: BTreeMap<String, Vec<&Load>> = BTreeMap::new();
    let mut loads = network.loads();
    loads.sort_by(|a, b| a.name.cmp(&b.name));
    for load in loads {
        load_groups
            .entry(busmap.apply(&load.bus).to_string())
            .or_default()
            .push(load);
    }
    for (i, (bus, members)) in load_groups.into_iter().enumerate() {
        let len = members
            .iter()
            .map(|l| l.p_set.len())
            .max()
            .unwrap_or(0)
            .max(n_samples);
        let mut p_set = vec![0.0; len];
        for member in &members {
            for (t, v) in member.p_set.iter().enumerate() {
                p_set[t] += v;
            }
        }
        out.loads.push(Load {
            id: LoadId::new(i),
            name: bus.clone(),
            bus,
            p_set,
        });
    }

    // Storage units merge within (target bus, carrier).
    let mut storage_groups: BTreeMap<(String, String), Vec<&StorageUnit>> = BTreeMap::new();
    let mut storage = network.storage_units();
    storage.sort_by(|a, b| a.name.cmp(&b.name));
    for unit in storage {
        storage_groups
            .entry((busmap.apply(&unit.bus).to_string(), unit.carrier.clone()))
            .or_default()
            .push(unit);
    }
    for (i, ((bus, carrier), members)) in storage_groups.into_iter().enumerate() {
        let p_noms: Vec<f64> = members.iter().map(|s| s.p_nom).collect();
        let hours: Vec<f64> = members.iter().map(|s| s.max_hours).collect();
        let capital: Vec<f64> = members.iter().map(|s| s.capital_cost).collect();
        out.storage_units.push(StorageUnit {
            id: StorageId::new(i),
            name: if members.len() == 1 {
                members[0].name.clone()
            } else {
                format!("{bus} {carrier}")
            },
            bus,
            carrier,
            p_nom: reduce(Strategy::Sum, &p_noms, &p_noms),
            max_hours: reduce(Strategy::WeightedMean, &hours, &p_noms),
            capital_cost: reduce(Strategy::WeightedMean, &capital, &p_noms),
        });
    }

    Ok(out)
}

/// Simplify-stage aggregation: apply connection costs, fold one-ports onto
/// their representatives, and drop merged buses plus any branch touching
/// them.
pub fn aggregate_and_move(
    network: Network,
    busmap: &Busmap,
    connection_costs: &ConnectionCosts,
    strategies: &AggregationStrategies,
) -> GrtResult<(Network, ConnectionCostReport)> {
    let mut network = network;
    let report = apply_connection_costs(&mut network, connection_costs);

    let one_ports = aggregate_one_ports(&network, busmap, strategies, None)?;

    let image: BTreeSet<String> = busmap.image().into_iter().map(str::to_string).collect();
    let keep = |name: &str| busmap.get(name).is_none() || image.contains(name);

    let buses: Vec<Bus> = network
        .buses()
        .into_iter()
        .filter(|b| keep(&b.name))
        .cloned()
        .collect();
    let branch_kept = |b0: &str, b1: &str| keep(b0) && keep(b1);
    let lines: Vec<Line> = network
        .lines()
        .into_iter()
        .filter(|l| branch_kept(&l.bus0, &l.bus1))
        .cloned()
        .collect();
    let links: Vec<Link> = network
        .links()
        .into_iter()
        .filter(|l| branch_kept(&l.bus0, &l.bus1))
        .cloned()
        .collect();
    let transformers = network
        .transformers()
        .into_iter()
        .filter(|t| branch_kept(&t.bus0, &t.bus1))
        .cloned()
        .collect();

    let reduced = Network::from_components(
        std::mem::take(&mut network.snapshots),
        std::mem::take(&mut network.line_types),
        buses,
        lines,
        transformers,
        links,
        one_ports.generators,
        one_ports.loads,
        one_ports.storage_units,
        std::mem::take(&mut network.meta),
    )?;
    Ok((reduced, report))
}

/// Branch identity map: original branch name -> merged corridor name.
pub type Linemap = BTreeMap<String, String>;

/// Options for the cluster-stage aggregation.
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    /// Multiplier turning straight-line distance into route length
    pub line_length_factor: f64,
    /// Cost per km added to link corridors that got longer than their parts
    pub extended_link_costs: f64,
    /// Restrict generator merging to these carriers (None merges all)
    pub aggregate_carriers: Option<BTreeSet<String>>,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            line_length_factor: 1.25,
            extended_link_costs: 0.0,
            aggregate_carriers: None,
        }
    }
}

/// Result of the cluster-stage aggregation.
#[derive(Debug)]
pub struct NetworkClustering {
    pub network: Network,
    pub busmap: Busmap,
    pub linemap: Linemap,
}

/// Cluster-stage aggregation: one bus per cluster label, corridor-merged
/// branches, merged one-ports, and the realized busmap/linemap pair.
pub fn aggregate_network(
    network: &Network,
    busmap: &Busmap,
    strategies: &AggregationStrategies,
    opts: &ClusterOptions,
) -> GrtResult<NetworkClustering> {
    // Cluster membership, deterministically ordered.
    let mut clusters: BTreeMap<String, Vec<&Bus>> = BTreeMap::new();
    let mut source_buses = network.buses();
    source_buses.sort_by(|a, b| a.name.cmp(&b.name));
    for bus in source_buses {
        clusters
            .entry(busmap.apply(&bus.name).to_string())
            .or_default()
            .push(bus);
    }

    let mut buses = Vec::with_capacity(clusters.len());
    let mut positions: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for (i, (label, members)) in clusters.iter().enumerate() {
        let ones = vec![1.0; members.len()];
        let xs: Vec<f64> = members.iter().map(|b| b.x).collect();
        let ys: Vec<f64> = members.iter().map(|b| b.y).collect();
        let x = reduce(strategies.bus_strategy("x"), &xs, &ones);
        let y = reduce(strategies.bus_strategy("y"), &ys, &ones);
        positions.insert(label.as_str(), (x, y));
        buses.push(Bus {
            id: BusId::new(i),
            name: label.clone(),
            x,
            y,
            v_nom: members[0].v_nom,
            country: members[0].country.clone(),
            sub_network: members[0].sub_network.clone(),
            tso: members[0].tso.clone(),
            substation_lv: false,
            substation_off: false,
        });
    }

    let one_ports = aggregate_one_ports(
        network,
        busmap,
        strategies,
        opts.aggregate_carriers.as_ref(),
    )?;

    let mut linemap = Linemap::new();
    let distance = |c0: &str, c1: &str| {
        let (x0, y0) = positions[c0];
        let (x1, y1) = positions[c1];
        ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt()
    };

    // AC corridors
    let mut line_groups: BTreeMap<(String, String), Vec<&Line>> = BTreeMap::new();
    let mut source_lines = network.lines();
    source_lines.sort_by(|a, b| a.name.cmp(&b.name));
    for line in source_lines {
        let c0 = busmap.apply(&line.bus0).to_string();
        let c1 = busmap.apply(&line.bus1).to_string();
        if c0 == c1 {
            continue;
        }
        let key = if c0 <= c1 { (c0, c1) } else { (c1, c0) };
        line_groups.entry(key).or_default().push(line);
    }
    let mut lines = Vec::with_capacity(line_groups.len());
    for (i, ((c0, c1), members)) in line_groups.into_iter().enumerate() {
        let name = i.to_string();
        let length = opts.line_length_factor * distance(&c0, &c1);
        // Series impedance per member rescaled to the corridor length, then
        // combined as parallel circuits.
        let parallel = |per: &dyn Fn(&Line) -> f64| -> f64 {
            let mut inverse = 0.0;
            for member in &members {
                let scaled = if member.length > 0.0 {
                    per(member) * length / member.length
                } else {
                    per(member)
                };
                if scaled <= 0.0 {
                    return 0.0;
                }
                inverse += 1.0 / scaled;
            }
            if inverse > 0.0 {
                1.0 / inverse
            } else {
                0.0
            }
        };
        for member in &members {
            linemap.insert(member.name.clone(), name.clone());
        }
        lines.push(Line {
            id: LineId::new(i),
            name,
            bus0: c0,
            bus1: c1,
            line_type: members[0].line_type.clone(),
            v_nom: members[0].v_nom,
            num_parallel: members.iter().map(|l| l.num_parallel).sum(),
            s_nom: members.iter().map(|l| l.s_nom).sum(),
            r: parallel(&|l| l.r),
            x: parallel(&|l| l.x),
            length,
        });
    }

    // DC corridors
    let mut link_groups: BTreeMap<(String, String), Vec<&Link>> = BTreeMap::new();
    let mut source_links = network.links();
    source_links.sort_by(|a, b| a.name.cmp(&b.name));
    for link in source_links {
        let c0 = busmap.apply(&link.bus0).to_string();
        let c1 = busmap.apply(&link.bus1).to_string();
        if c0 == c1 {
            continue;
        }
        let key = if c0 <= c1 { (c0, c1) } else { (c1, c0) };
        link_groups.entry(key).or_default().push(link);
    }
    let mut links = Vec::with_capacity(link_groups.len());
    for (i, ((c0, c1), members)) in link_groups.into_iter().enumerate() {
        let name = format!("DC{i}");
        let new_length = opts.line_length_factor * distance(&c0, &c1);
        let total_length: f64 = members.iter().map(|l| l.length).sum();
        let mean_length = total_length / members.len() as f64;
        let underwater_fraction = if total_length > 0.0 {
            members
                .iter()
                .map(|l| l.underwater_fraction * l.length)
                .sum::<f64>()
                / total_length
        } else {
            0.0
        };
        let capital_cost = members.iter().map(|l| l.capital_cost).sum::<f64>()
            + opts.extended_link_costs * (new_length - mean_length).max(0.0);
        for member in &members {
            linemap.insert(member.name.clone(), name.clone());
        }
        links.push(Link {
            id: LinkId::new(i),
            name,
            bus0: c0,
            bus1: c1,
            carrier: members[0].carrier.clone(),
            p_nom: members.iter().map(|l| l.p_nom).sum(),
            length: new_length,
            underwater_fraction: underwater_fraction.clamp(0.0, 1.0),
            p_max_pu: members[0].p_max_pu,
            p_min_pu: members[0].p_min_pu,
            underground: members.iter().all(|l| l.underground),
            under_construction: members.iter().any(|l| l.under_construction),
            capital_cost,
        });
    }

    let clustered = Network::from_components(
        network.snapshots.clone(),
        network.line_types.clone(),
        buses,
        lines,
        vec![],
        links,
        one_ports.generators,
        one_ports.loads,
        one_ports.storage_units,
        network.meta.clone(),
    )?;

    busmap.validate(network, &clustered)?;

    Ok(NetworkClustering {
        network: clustered,
        busmap: busmap.clone(),
        linemap,
    })
}

/// Keep expansion limits consistent after merging: a cluster can never hold
/// less than what is already installed.
pub fn update_p_nom_max(network: &mut Network) {
    for gen in network.generators_mut() {
        if gen.p_nom_max < gen.p_nom {
            gen.p_nom_max = gen.p_nom;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assemble, bus, gen, line, load};
    use grt_core::Busmap;

    fn triangle() -> Network {
        assemble(
            vec![
                bus(0, "a", 0.0, 0.0, "DE"),
                bus(1, "b", 1.0, 0.0, "DE"),
                bus(2, "c", 0.0, 1.0, "FR"),
            ],
            vec![
                line(0, "l0", "a", "b", 100.0, 1.0),
                line(1, "l1", "b", "c", 100.0, 1.0),
                line(2, "l2", "a", "c", 100.0, 1.0),
            ],
            vec![],
            vec![
                gen(0, "solar a", "a", "solar", 50.0, 900.0),
                gen(1, "solar b", "b", "solar", 150.0, 500.0),
                gen(2, "gas c", "c", "OCGT", 80.0, 300.0),
            ],
            vec![load(0, "d a", "a", 30.0), load(1, "d c", "c", 20.0)],
        )
    }

    #[test]
    fn test_identity_busmap_preserves_physical_content() {
        let network = triangle();
        let busmap = Busmap::identity(&network);
        let clustering = aggregate_network(
            &network,
            &busmap,
            &AggregationStrategies::default(),
            &ClusterOptions::default(),
        )
        .unwrap();

        let reduced = clustering.network;
        assert_eq!(reduced.buses().len(), network.buses().len());
        assert!(
            (reduced.total_gen_capacity_mw() - network.total_gen_capacity_mw()).abs() < 1e-9
        );
        assert!((reduced.total_load_mw() - network.total_load_mw()).abs() < 1e-9);
        assert_eq!(reduced.lines().len(), network.lines().len());
    }

    #[test]
    fn test_merge_to_two_clusters_sums_capacity() {
        let network = triangle();
        let busmap: Busmap = [
            ("a".to_string(), "DE0 0".to_string()),
            ("b".to_string(), "DE0 0".to_string()),
            ("c".to_string(), "FR0 0".to_string()),
        ]
        .into_iter()
        .collect();

        let clustering = aggregate_network(
            &network,
            &busmap,
            &AggregationStrategies::default(),
            &ClusterOptions::default(),
        )
        .unwrap();
        let reduced = clustering.network;

        assert_eq!(reduced.buses().len(), 2);
        // l1 and l2 become one corridor between the two clusters; l0 is internal.
        assert_eq!(reduced.lines().len(), 1);
        let corridor = reduced.lines()[0].clone();
        assert!((corridor.s_nom - 200.0).abs() < 1e-9);
        assert_eq!(clustering.linemap.get("l1"), clustering.linemap.get("l2"));
        assert!(!clustering.linemap.contains_key("l0"));

        // Solar generators merged with capacity-weighted capital cost.
        let solar = reduced
            .generators()
            .into_iter()
            .find(|g| g.carrier == "solar")
            .cloned()
            .unwrap();
        assert!((solar.p_nom - 200.0).abs() < 1e-9);
        let expected = (50.0 * 900.0 + 150.0 * 500.0) / 200.0;
        assert!((solar.capital_cost - expected).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_and_move_folds_stub_components() {
        let network = assemble(
            vec![bus(0, "a", 0.0, 0.0, "DE"), bus(1, "b", 1.0, 0.0, "DE")],
            vec![line(0, "l0", "a", "b", 100.0, 1.0)],
            vec![],
            vec![gen(0, "wind b", "b", "onwind", 10.0, 100.0)],
            vec![load(0, "d b", "b", 5.0)],
        );
        let mut busmap = Busmap::identity(&network);
        busmap.insert("b", "a");

        let (reduced, _) = aggregate_and_move(
            network,
            &busmap,
            &ConnectionCosts::default(),
            &AggregationStrategies::default(),
        )
        .unwrap();

        assert_eq!(reduced.buses().len(), 1);
        assert!(reduced.lines().is_empty());
        assert_eq!(reduced.generators()[0].bus, "a");
        assert_eq!(reduced.loads()[0].bus, "a");
        assert!((reduced.total_load_mw() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_restricted_carriers_keep_other_generators_apart() {
        let network = triangle();
        let busmap: Busmap = [
            ("a".to_string(), "DE0 0".to_string()),
            ("b".to_string(), "DE0 0".to_string()),
            ("c".to_string(), "DE0 0".to_string()),
        ]
        .into_iter()
        .collect();

        let carriers: BTreeSet<String> = ["OCGT".to_string()].into_iter().collect();
        let clustering = aggregate_network(
            &network,
            &busmap,
            &AggregationStrategies::default(),
            &ClusterOptions {
                aggregate_carriers: Some(carriers),
                ..ClusterOptions::default()
            },
        )
        .unwrap();

        // The two solar generators survive individually, OCGT is merged.
        let solar_count = clustering
            .network
            .generators()
            .iter()
            .filter(|g| g.carrier == "solar")
            .count();
        assert_eq!(solar_count, 2);
    }

    #[test]
    fn test_conflicting_p_nom_max_policy_is_fatal() {
        let network = triangle();
        let busmap = Busmap::identity(&network);
        let mut strategies = AggregationStrategies::default();
        strategies
            .generator_by_carrier
            .entry("solar".to_string())
            .or_default()
            .insert("p_nom_max".to_string(), Strategy::Min);
        let carriers: BTreeSet<String> =
            ["solar".to_string(), "OCGT".to_string()].into_iter().collect();

        let result = aggregate_one_ports(&network, &busmap, &strategies, Some(&carriers));
        assert!(matches!(result, Err(GrtError::Validation(_))));
    }

    #[test]
    fn test_update_p_nom_max_floors_at_installed() {
        let mut network = triangle();
        for g in network.generators_mut() {
            g.p_nom_max = 10.0;
        }
        update_p_nom_max(&mut network);
        assert!(network.generators().iter().all(|g| g.p_nom_max >= g.p_nom));
    }
}
