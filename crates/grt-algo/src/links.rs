//! Link folding: collapse multi-hop DC corridors into single equivalent
//! links.
//!
//! A DC sub-network that touches the AC grid at exactly two buses carries no
//! topological information between those buses; its interior chain is
//! replaced by one link with equivalent length, bottleneck capacity and
//! blended underwater fraction. Interior buses move to the geometrically
//! nearest boundary bus, and any offshore generator riding along pays the
//! cumulative link connection cost of the trip (added permanently to its
//! capital cost).
//!
//! Supernodes delimit the chains: buses with more than two neighbors, or
//! with any neighbor outside the DC component (an AC attachment point).
//! Components with at most two buses are already minimal and left alone.

use crate::aggregate::{aggregate_and_move, AggregationStrategies};
use crate::costs::{
    connection_costs_per_link, connection_costs_to_bus, ConnectionCostReport, ConnectionCosts,
    CostTable,
};
use grt_core::{
    all_branch_adjacency, component_labels, dc_link_adjacency, Adjacency, Busmap, GrtResult, Link,
    LinkId, Network,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LinkFoldParams {
    /// Per-unit dispatch magnitude of synthesized links
    pub p_max_pu: f64,
    /// Multiplier turning straight-line distance into route length
    pub length_factor: f64,
    /// Renewable technologies; the offshore ones get connection costs
    pub renewable_carriers: Vec<String>,
}

impl Default for LinkFoldParams {
    fn default() -> Self {
        Self {
            p_max_pu: 1.0,
            length_factor: 1.25,
            renewable_carriers: Vec::new(),
        }
    }
}

/// One boundary-to-boundary walk: the ordered bus sequence and, per hop, the
/// parallel links realizing that hop.
#[derive(Debug)]
struct Chain {
    buses: Vec<String>,
    links: Vec<Vec<String>>,
}

/// Walk every chain of a DC component, starting from its supernodes.
fn split_links(nodes: &BTreeSet<String>, full_adj: &Adjacency, dc_adj: &Adjacency) -> Vec<Chain> {
    let supernodes: BTreeSet<&String> = nodes
        .iter()
        .filter(|m| {
            full_adj
                .get(*m)
                .map(|neighbors| {
                    neighbors.len() > 2 || neighbors.keys().any(|n| !nodes.contains(n))
                })
                .unwrap_or(false)
        })
        .collect();

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut chains = Vec::new();

    for &u in &supernodes {
        let Some(first_hops) = dc_adj.get(u) else {
            continue;
        };
        for (m, hop_links) in first_hops {
            if !nodes.contains(m) || seen.contains(m) {
                continue;
            }
            let mut buses = vec![u.clone(), m.clone()];
            let mut links = vec![hop_links.clone()];
            let mut cur = m.clone();

            while !supernodes.contains(&cur) && !seen.contains(&cur) {
                seen.insert(cur.clone());
                let mut advanced = false;
                if let Some(neighbors) = dc_adj.get(&cur) {
                    for (m2, hop) in neighbors {
                        if seen.contains(m2) || m2 == u {
                            continue;
                        }
                        buses.push(m2.clone());
                        links.push(hop.clone());
                        cur = m2.clone();
                        advanced = true;
                        break;
                    }
                }
                if !advanced {
                    // Dead end: the chain terminates in a stub.
                    break;
                }
            }
            if &cur != u {
                chains.push(Chain { buses, links });
            }
        }
        seen.insert(u.clone());
    }
    chains
}

/// Fold every foldable DC chain, move the attached components, and price the
/// relocation. Returns the reduced network, the busmap, and the
/// connection-cost report for persistence.
pub fn simplify_links(
    network: Network,
    costs: &CostTable,
    strategies: &AggregationStrategies,
    params: &LinkFoldParams,
) -> GrtResult<(Network, Busmap, ConnectionCostReport)> {
    if network.links().is_empty() {
        let busmap = Busmap::identity(&network);
        return Ok((network, busmap, ConnectionCostReport::default()));
    }
    info!("simplifying connected link components");

    let dc_adj = dc_link_adjacency(&network);
    let full_adj = all_branch_adjacency(&network);
    let labels = component_labels(&dc_adj);

    let mut components: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();
    for (bus, label) in &labels {
        components.entry(*label).or_default().insert(bus.clone());
    }

    let coords: BTreeMap<&str, (f64, f64)> = network
        .buses()
        .iter()
        .map(|b| (b.name.as_str(), (b.x, b.y)))
        .collect();
    let link_table: BTreeMap<String, Link> = network
        .links()
        .into_iter()
        .map(|l| (l.name.clone(), l.clone()))
        .collect();
    let mut next_link_id = network
        .links()
        .iter()
        .map(|l| l.id.value() + 1)
        .max()
        .unwrap_or(0);

    let mut busmap = Busmap::identity(&network);
    let per_link = connection_costs_per_link(
        &network,
        costs,
        &params.renewable_carriers,
        params.length_factor,
    )?;
    let mut connection_costs = ConnectionCosts::default();
    let mut removed: BTreeSet<String> = BTreeSet::new();
    let mut synthesized: Vec<Link> = Vec::new();

    for nodes in components.values().filter(|nodes| nodes.len() > 2) {
        for chain in split_links(nodes, &full_adj, &dc_adj) {
            if chain.buses.len() <= 2 {
                continue;
            }
            debug!("chain buses = {:?}", chain.buses);

            let b0 = chain.buses.first().unwrap().clone();
            let b1 = chain.buses.last().unwrap().clone();
            let dist = |a: &str, b: &str| {
                let (x0, y0) = coords[a];
                let (x1, y1) = coords[b];
                ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt()
            };
            for interior in &chain.buses[1..chain.buses.len() - 1] {
                let target = if dist(interior, &b0) <= dist(interior, &b1) {
                    &b0
                } else {
                    &b1
                };
                busmap.insert(interior.clone(), target.clone());
            }
            connection_costs.merge(connection_costs_to_bus(
                &network,
                &busmap,
                &per_link,
                Some(&chain.buses),
            ));

            let hop_links: Vec<Vec<&Link>> = chain
                .links
                .iter()
                .map(|hop| hop.iter().filter_map(|name| link_table.get(name)).collect())
                .collect();
            if hop_links.iter().any(Vec::is_empty) {
                continue;
            }
            let all_links: Vec<&Link> = hop_links.iter().flatten().copied().collect();

            // Equivalent parameters: hop lengths average across parallel
            // paths and add up along the chain; capacity is the bottleneck
            // of the summed parallel capacities; the underwater share is the
            // length-weighted blend.
            let length: f64 = hop_links
                .iter()
                .map(|hop| hop.iter().map(|l| l.length).sum::<f64>() / hop.len() as f64)
                .sum();
            let p_nom = hop_links
                .iter()
                .map(|hop| hop.iter().map(|l| l.p_nom).sum::<f64>())
                .fold(f64::INFINITY, f64::min);
            let total_length: f64 = all_links.iter().map(|l| l.length).sum();
            let underwater_fraction = if total_length > 0.0 {
                all_links
                    .iter()
                    .map(|l| l.length * l.underwater_fraction)
                    .sum::<f64>()
                    / total_length
            } else {
                0.0
            };
            let longest = all_links
                .iter()
                .max_by(|a, b| {
                    a.length
                        .partial_cmp(&b.length)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap();
            let name = format!("{}+{}", longest.name, chain.links.len() - 1);

            info!(
                "joining the links {} connecting the buses {} to simple link {}",
                all_links
                    .iter()
                    .map(|l| l.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                chain.buses.join(", "),
                name
            );

            removed.extend(all_links.iter().map(|l| l.name.clone()));
            synthesized.push(Link {
                id: LinkId::new(next_link_id),
                name,
                bus0: b0,
                bus1: b1,
                carrier: "DC".to_string(),
                p_nom,
                length,
                underwater_fraction: underwater_fraction.clamp(0.0, 1.0),
                p_max_pu: params.p_max_pu,
                p_min_pu: -params.p_max_pu,
                underground: false,
                under_construction: false,
                capital_cost: 0.0,
            });
            next_link_id += 1;
        }
    }

    let mut links: Vec<Link> = network
        .links()
        .into_iter()
        .filter(|l| !removed.contains(&l.name))
        .cloned()
        .collect();
    links.extend(synthesized);

    let rebuilt = Network::from_components(
        network.snapshots.clone(),
        network.line_types.clone(),
        network.buses().into_iter().cloned().collect(),
        network.lines().into_iter().cloned().collect(),
        network.transformers().into_iter().cloned().collect(),
        links,
        network.generators().into_iter().cloned().collect(),
        network.loads().into_iter().cloned().collect(),
        network.storage_units().into_iter().cloned().collect(),
        network.meta.clone(),
    )?;

    let (reduced, report) = aggregate_and_move(rebuilt, &busmap, &connection_costs, strategies)?;
    Ok((reduced, busmap, report))
}
