//! Topological helpers shared by the reduction stages.
//!
//! The reduction algorithms work on bus-level adjacency views rather than on
//! petgraph indices directly: a view is a map from bus name to neighbor bus
//! names, with the branch names realizing each neighbor relation (the graph
//! is a multigraph, so a neighbor can be reached through several parallel
//! branches). Views are `BTreeMap`-based so traversal order, and therefore
//! every derived artifact, is deterministic.

use crate::{Edge, Network, Node};
use std::collections::{BTreeMap, VecDeque};

/// Bus-level adjacency: bus -> neighbor -> names of connecting branches.
pub type Adjacency = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Build an adjacency view over the branches selected by `include`.
pub fn adjacency_with<F>(network: &Network, mut include: F) -> Adjacency
where
    F: FnMut(&Edge) -> bool,
{
    let mut adj: Adjacency = network
        .buses()
        .iter()
        .map(|b| (b.name.clone(), BTreeMap::new()))
        .collect();

    for edge in network.graph.edge_weights() {
        if !include(edge) {
            continue;
        }
        let (b0, b1) = edge.endpoints();
        let name = edge.label().to_string();
        adj.entry(b0.to_string())
            .or_default()
            .entry(b1.to_string())
            .or_default()
            .push(name.clone());
        adj.entry(b1.to_string())
            .or_default()
            .entry(b0.to_string())
            .or_default()
            .push(name);
    }
    adj
}

/// Adjacency over every branch type.
pub fn all_branch_adjacency(network: &Network) -> Adjacency {
    adjacency_with(network, |_| true)
}

/// Adjacency over AC lines only.
pub fn line_adjacency(network: &Network) -> Adjacency {
    adjacency_with(network, |e| matches!(e, Edge::Line(_)))
}

/// Adjacency over DC links only.
pub fn dc_link_adjacency(network: &Network) -> Adjacency {
    adjacency_with(network, |e| matches!(e, Edge::Link(l) if l.carrier == "DC"))
}

/// Number of incident branches per bus (parallel branches count separately).
pub fn branch_degrees(network: &Network) -> BTreeMap<String, usize> {
    let mut degrees: BTreeMap<String, usize> = network
        .buses()
        .iter()
        .map(|b| (b.name.clone(), 0))
        .collect();
    for edge in network.graph.edge_weights() {
        let (b0, b1) = edge.endpoints();
        *degrees.entry(b0.to_string()).or_default() += 1;
        *degrees.entry(b1.to_string()).or_default() += 1;
    }
    degrees
}

/// Label connected components of an adjacency view (breadth-first search).
///
/// Labels are assigned in order of the sorted bus names, so the bus that
/// sorts first in each component determines the component's label rank.
pub fn component_labels(adjacency: &Adjacency) -> BTreeMap<String, usize> {
    let mut labels: BTreeMap<String, usize> = BTreeMap::new();
    let mut next_label = 0;

    for start in adjacency.keys() {
        if labels.contains_key(start) {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start.clone());
        labels.insert(start.clone(), next_label);
        while let Some(bus) = queue.pop_front() {
            if let Some(neighbors) = adjacency.get(&bus) {
                for neighbor in neighbors.keys() {
                    if !labels.contains_key(neighbor) {
                        labels.insert(neighbor.clone(), next_label);
                        queue.push_back(neighbor.clone());
                    }
                }
            }
        }
        next_label += 1;
    }
    labels
}

/// Assign every bus its AC sub-network label (connected component over AC
/// lines). Buses without any AC line form singleton sub-networks.
pub fn determine_sub_networks(network: &mut Network) {
    let labels = component_labels(&line_adjacency(network));
    for node in network.graph.node_weights_mut() {
        if let Node::Bus(bus) = node {
            if let Some(label) = labels.get(&bus.name) {
                bus.sub_network = label.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Bus, BusId, Line, LineId, Link, LinkId};
    use std::collections::BTreeMap as Map;

    fn network_with(lines: Vec<Line>, links: Vec<Link>, n_buses: usize) -> Network {
        let buses = (0..n_buses)
            .map(|i| Bus::new(BusId::new(i), format!("b{i}")))
            .collect();
        Network::from_components(
            vec![],
            Map::new(),
            buses,
            lines,
            vec![],
            links,
            vec![],
            vec![],
            vec![],
            serde_json::Value::Null,
        )
        .unwrap()
    }

    #[test]
    fn test_branch_degrees_count_parallel_edges() {
        let network = network_with(
            vec![
                Line::new(LineId::new(0), "l0", "b0", "b1"),
                Line::new(LineId::new(1), "l1", "b0", "b1"),
            ],
            vec![],
            3,
        );
        let degrees = branch_degrees(&network);
        assert_eq!(degrees["b0"], 2);
        assert_eq!(degrees["b1"], 2);
        assert_eq!(degrees["b2"], 0);
    }

    #[test]
    fn test_component_labels_split_on_missing_edges() {
        let network = network_with(
            vec![
                Line::new(LineId::new(0), "l0", "b0", "b1"),
                Line::new(LineId::new(1), "l1", "b2", "b3"),
            ],
            vec![],
            4,
        );
        let labels = component_labels(&line_adjacency(&network));
        assert_eq!(labels["b0"], labels["b1"]);
        assert_eq!(labels["b2"], labels["b3"]);
        assert_ne!(labels["b0"], labels["b2"]);
    }

    #[test]
    fn test_dc_adjacency_ignores_lines() {
        let network = network_with(
            vec![Line::new(LineId::new(0), "l0", "b0", "b1")],
            vec![Link::new(LinkId::new(0), "k0", "b1", "b2")],
            3,
        );
        let adj = dc_link_adjacency(&network);
        assert!(adj["b0"].is_empty());
        assert_eq!(adj["b1"].len(), 1);
        assert!(adj["b1"].contains_key("b2"));
    }

    #[test]
    fn test_determine_sub_networks() {
        let mut network = network_with(
            vec![Line::new(LineId::new(0), "l0", "b0", "b1")],
            vec![Link::new(LinkId::new(0), "k0", "b1", "b2")],
            3,
        );
        determine_sub_networks(&mut network);
        let sub = |name: &str| network.bus(name).unwrap().sub_network.clone();
        assert_eq!(sub("b0"), sub("b1"));
        // DC links do not join AC sub-networks.
        assert_ne!(sub("b1"), sub("b2"));
    }
}
