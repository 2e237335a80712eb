//! Techno-economic cost data and grid-connection cost pricing.
//!
//! The cost table is an external input (technology -> capital/marginal cost,
//! lifetime, discount rate). The pipeline uses it for one purpose: pricing
//! the grid connection of offshore wind generators whose bus is relocated by
//! link folding or stub removal. The connection cost of a relocated bus is
//! the cheapest cumulative link cost from the bus to its new home, found with
//! Dijkstra over a cost-weighted view of the branch graph (AC lines cost
//! nothing to traverse).

use grt_core::{Busmap, Edge, GrtError, GrtResult, Network};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Cost assumptions for one technology.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TechCost {
    /// Overnight investment cost per MW
    pub investment: f64,
    /// Economic lifetime in years
    pub lifetime: f64,
    pub discount_rate: f64,
    /// Marginal cost per MWh
    pub marginal_cost: f64,
    /// Annualized capital cost per MW (investment spread by `annuity`)
    pub capital_cost: f64,
}

/// Technology name -> cost assumptions.
pub type CostTable = BTreeMap<String, TechCost>;

/// Capital recovery factor: annuity payment per unit of investment.
///
/// CRF = r(1+r)^n / ((1+r)^n - 1), with the zero-rate limit 1/n.
pub fn annuity(lifetime_years: f64, discount_rate: f64) -> f64 {
    let r = discount_rate;
    let n = lifetime_years;
    if r.abs() < 1e-10 {
        1.0 / n
    } else {
        r * (1.0 + r).powf(n) / ((1.0 + r).powf(n) - 1.0)
    }
}

/// Per-bus, per-technology connection costs accumulated by a stage.
#[derive(Debug, Clone, Default)]
pub struct ConnectionCosts(pub BTreeMap<String, BTreeMap<String, f64>>);

impl ConnectionCosts {
    pub fn add(&mut self, bus: &str, tech: &str, cost: f64) {
        *self
            .0
            .entry(bus.to_string())
            .or_default()
            .entry(tech.to_string())
            .or_default() += cost;
    }

    pub fn merge(&mut self, other: ConnectionCosts) {
        for (bus, techs) in other.0 {
            for (tech, cost) in techs {
                self.add(&bus, &tech, cost);
            }
        }
    }

    pub fn technologies(&self) -> Vec<&str> {
        let mut techs: Vec<&str> = self
            .0
            .values()
            .flat_map(|t| t.keys().map(String::as_str))
            .collect();
        techs.sort_unstable();
        techs.dedup();
        techs
    }
}

/// Connection-cost adjustments that were actually applied to generators,
/// persisted as the stage's connection-cost report.
pub type ConnectionCostReport = ConnectionCosts;

fn capital_cost_of(costs: &CostTable, tech: &str) -> GrtResult<f64> {
    costs
        .get(tech)
        .map(|c| c.capital_cost)
        .ok_or_else(|| GrtError::Config(format!("cost table has no entry for `{tech}`")))
}

/// Price every DC link for each offshore technology: submarine cost on the
/// underwater share of the route, underground cost on the rest.
pub fn connection_costs_per_link(
    network: &Network,
    costs: &CostTable,
    renewable_carriers: &[String],
    length_factor: f64,
) -> GrtResult<BTreeMap<String, BTreeMap<String, f64>>> {
    let mut per_tech = BTreeMap::new();
    let links = network.links();
    if links.is_empty() {
        return Ok(per_tech);
    }

    for tech in renewable_carriers.iter().filter(|t| t.starts_with("offwind")) {
        let submarine = capital_cost_of(costs, &format!("{tech}-connection-submarine"))?;
        let underground = capital_cost_of(costs, &format!("{tech}-connection-underground"))?;
        let per_link: BTreeMap<String, f64> = links
            .iter()
            .map(|l| {
                let cost = l.length
                    * length_factor
                    * (l.underwater_fraction * submarine
                        + (1.0 - l.underwater_fraction) * underground);
                (l.name.clone(), cost)
            })
            .collect();
        per_tech.insert(tech.clone(), per_link);
    }
    Ok(per_tech)
}

/// Cumulative connection cost from each relocated bus to its representative,
/// computed as a shortest path over the link-cost-weighted branch graph.
///
/// `buses` restricts the computation to the given buses; by default every
/// bus the busmap relocates is priced.
pub fn connection_costs_to_bus(
    network: &Network,
    busmap: &Busmap,
    per_link: &BTreeMap<String, BTreeMap<String, f64>>,
    buses: Option<&[String]>,
) -> ConnectionCosts {
    let mut result = ConnectionCosts::default();
    if per_link.is_empty() {
        return result;
    }

    let moved: Vec<String> = match buses {
        Some(buses) => buses.to_vec(),
        None => busmap
            .iter()
            .filter(|(from, to)| from != to)
            .map(|(from, _)| from.to_string())
            .collect(),
    };
    if moved.is_empty() {
        return result;
    }

    for (tech, link_costs) in per_link {
        // Weighted view: links carry their connection cost, lines are free.
        let mut graph: UnGraph<(), f64> = UnGraph::new_undirected();
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();
        for bus in network.buses() {
            index.insert(bus.name.as_str(), graph.add_node(()));
        }
        for edge in network.graph.edge_weights() {
            let (b0, b1) = edge.endpoints();
            let (Some(&a), Some(&b)) = (index.get(b0), index.get(b1)) else {
                continue;
            };
            let weight = match edge {
                Edge::Link(l) => link_costs.get(&l.name).copied().unwrap_or(0.0),
                _ => 0.0,
            };
            graph.add_edge(a, b, weight);
        }

        for bus in &moved {
            let target = busmap.apply(bus);
            if target == bus {
                continue;
            }
            let (Some(&start), Some(&goal)) = (index.get(bus.as_str()), index.get(target)) else {
                continue;
            };
            let distances =
                petgraph::algo::dijkstra(&graph, start, Some(goal), |e| *e.weight());
            if let Some(&cost) = distances.get(&goal) {
                if cost.is_finite() && cost > 0.0 {
                    result.add(bus, tech, cost);
                }
            }
        }
    }
    result
}

/// Add the accumulated connection costs to the capital cost of matching
/// generators (generator carrier == technology, at a priced bus). Returns
/// the adjustments actually applied.
pub fn apply_connection_costs(
    network: &mut Network,
    costs: &ConnectionCosts,
) -> ConnectionCostReport {
    let mut report = ConnectionCostReport::default();
    let mut applied: Vec<(String, f64)> = Vec::new();

    for gen in network.generators_mut() {
        let Some(cost) = costs.0.get(&gen.bus).and_then(|t| t.get(&gen.carrier)) else {
            continue;
        };
        if *cost <= 0.0 {
            continue;
        }
        gen.capital_cost += cost;
        report.add(&gen.bus.clone(), &gen.carrier.clone(), *cost);
        applied.push((gen.name.clone(), *cost));
    }

    if !applied.is_empty() {
        info!(
            "displacing {} generator(s), adding connection costs to capital cost: {}",
            applied.len(),
            applied
                .iter()
                .map(|(name, cost)| format!("{cost:.0} Eur/MW/a for `{name}`"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    report
}
