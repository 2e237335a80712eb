//! Stub removal: iteratively prune dead-end buses and branches.
//!
//! A stub is a degree-1 bus (counting parallel branches separately). Removing
//! one stub can expose another, so pruning iterates to a fixed point; chains
//! of stubs fold transitively onto the first bus with real connectivity. The
//! attached one-port components ride along via the generic aggregation path,
//! and relocated offshore generators are priced exactly like in link folding.

use crate::aggregate::{aggregate_and_move, AggregationStrategies};
use crate::costs::{
    connection_costs_per_link, connection_costs_to_bus, ConnectionCostReport, CostTable,
};
use crate::links::LinkFoldParams;
use grt_core::{Busmap, GrtResult, Network};
use std::collections::BTreeMap;
use tracing::info;

/// Compute the stub-elimination busmap without touching the network.
///
/// Repeatedly folds every degree-1 bus onto its sole neighbor until no such
/// bus remains; the returned map is fully resolved (no chained targets).
pub fn busmap_by_stubs(network: &Network) -> Busmap {
    // neighbor -> parallel branch count, per bus
    let mut adj: BTreeMap<String, BTreeMap<String, usize>> = network
        .buses()
        .iter()
        .map(|b| (b.name.clone(), BTreeMap::new()))
        .collect();
    for edge in network.graph.edge_weights() {
        let (b0, b1) = edge.endpoints();
        *adj.entry(b0.to_string())
            .or_default()
            .entry(b1.to_string())
            .or_default() += 1;
        *adj.entry(b1.to_string())
            .or_default()
            .entry(b0.to_string())
            .or_default() += 1;
    }

    let mut folded: BTreeMap<String, String> = BTreeMap::new();
    loop {
        let stubs: Vec<String> = adj
            .iter()
            .filter(|(_, neighbors)| neighbors.values().sum::<usize>() == 1)
            .map(|(bus, _)| bus.clone())
            .collect();
        if stubs.is_empty() {
            break;
        }
        for stub in stubs {
            let Some(neighbors) = adj.get(&stub) else {
                continue;
            };
            // A previous fold in this round may have changed the degree.
            if neighbors.values().sum::<usize>() != 1 {
                continue;
            }
            let neighbor = neighbors.keys().next().unwrap().clone();
            folded.insert(stub.clone(), neighbor.clone());
            adj.remove(&stub);
            if let Some(n) = adj.get_mut(&neighbor) {
                n.remove(&stub);
            }
        }
    }

    // Resolve chains: a stub may have folded onto a bus that folded later.
    let mut busmap = Busmap::identity(network);
    for from in folded.keys() {
        let mut target = &folded[from];
        while let Some(next) = folded.get(target) {
            target = next;
        }
        busmap.insert(from.clone(), target.clone());
    }
    busmap
}

/// Remove all stubs, folding components onto the retained neighbors and
/// pricing relocated offshore generators.
pub fn remove_stubs(
    network: Network,
    costs: &CostTable,
    strategies: &AggregationStrategies,
    params: &LinkFoldParams,
) -> GrtResult<(Network, Busmap, ConnectionCostReport)> {
    info!("removing stubs");

    let busmap = busmap_by_stubs(&network);
    let per_link = connection_costs_per_link(
        &network,
        costs,
        &params.renewable_carriers,
        params.length_factor,
    )?;
    let connection_costs = connection_costs_to_bus(&network, &busmap, &per_link, None);

    let (reduced, report) = aggregate_and_move(network, &busmap, &connection_costs, strategies)?;
    Ok((reduced, busmap, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assemble, bus, gen, line, load};

    /// A 4-bus ring with a 3-bus stub branch hanging off `r0`.
    fn ring_with_stub() -> Network {
        assemble(
            vec![
                bus(0, "r0", 0.0, 0.0, "DE"),
                bus(1, "r1", 1.0, 0.0, "DE"),
                bus(2, "r2", 1.0, 1.0, "DE"),
                bus(3, "r3", 0.0, 1.0, "DE"),
                bus(4, "s0", -1.0, 0.0, "DE"),
                bus(5, "s1", -2.0, 0.0, "DE"),
                bus(6, "s2", -3.0, 0.0, "DE"),
            ],
            vec![
                line(0, "ring01", "r0", "r1", 100.0, 1.0),
                line(1, "ring12", "r1", "r2", 100.0, 1.0),
                line(2, "ring23", "r2", "r3", 100.0, 1.0),
                line(3, "ring30", "r3", "r0", 100.0, 1.0),
                line(4, "stub a", "r0", "s0", 50.0, 1.0),
                line(5, "stub b", "s0", "s1", 50.0, 1.0),
                line(6, "stub c", "s1", "s2", 50.0, 1.0),
            ],
            vec![],
            vec![gen(0, "wind s2", "s2", "onwind", 10.0, 100.0)],
            vec![load(0, "d s1", "s1", 5.0)],
        )
    }

    #[test]
    fn test_stub_chain_folds_onto_the_ring() {
        let busmap = busmap_by_stubs(&ring_with_stub());
        assert_eq!(busmap.apply("s2"), "r0");
        assert_eq!(busmap.apply("s1"), "r0");
        assert_eq!(busmap.apply("s0"), "r0");
        assert_eq!(busmap.apply("r1"), "r1");
    }

    #[test]
    fn test_removal_reaches_fixed_point_with_ring_intact() {
        let (reduced, _, _) = remove_stubs(
            ring_with_stub(),
            &CostTable::new(),
            &AggregationStrategies::default(),
            &LinkFoldParams::default(),
        )
        .unwrap();

        assert_eq!(reduced.buses().len(), 4);
        assert_eq!(reduced.lines().len(), 4);
        let degrees = grt_core::branch_degrees(&reduced);
        assert!(degrees.values().all(|&d| d >= 2), "no stub may remain");

        // Components moved to the attachment bus.
        assert_eq!(reduced.generators()[0].bus, "r0");
        assert_eq!(reduced.loads()[0].bus, "r0");
        assert!((reduced.total_load_mw() - 5.0).abs() < 1e-9);
        assert!((reduced.total_gen_capacity_mw() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_branches_are_not_stubs() {
        let network = assemble(
            vec![
                bus(0, "a", 0.0, 0.0, "DE"),
                bus(1, "b", 1.0, 0.0, "DE"),
                bus(2, "c", 2.0, 0.0, "DE"),
            ],
            vec![
                line(0, "ab1", "a", "b", 100.0, 1.0),
                line(1, "ab2", "a", "b", 100.0, 1.0),
                line(2, "bc", "b", "c", 100.0, 1.0),
            ],
            vec![],
            vec![],
            vec![],
        );
        let busmap = busmap_by_stubs(&network);
        // `c` is a stub; `a` is held by two parallel circuits.
        assert_eq!(busmap.apply("c"), "b");
        assert_eq!(busmap.apply("a"), "a");
    }
}
