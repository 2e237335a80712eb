//! # grt-core: Transmission Network Modeling Core
//!
//! Provides the data structures and graph-based network model for the
//! transmission-network reduction pipeline.
//!
//! ## Design Philosophy
//!
//! Networks are modeled as **undirected multigraphs** where:
//! - **Nodes**: Buses, Generators, Loads, StorageUnits
//! - **Edges**: Branches (AC lines, transformers, point-to-point DC links)
//!
//! One-port components (generators, loads, storage) are nodes that reference
//! their bus by name rather than by a graph edge; this keeps the branch
//! topology clean for the reduction algorithms while still allowing uniform
//! iteration over all components.
//!
//! Every reduction stage consumes a network, produces a new network plus a
//! [`Busmap`] describing where each original bus ended up. Busmaps compose,
//! so the full lineage of a bus through the pipeline is a single mapping.
//!
//! ## Core Data Structures
//!
//! - [`Network`] - The main network container (petgraph `Graph<Node, Edge>`)
//! - [`Node`] - Enum for Bus, Generator, Load, StorageUnit elements
//! - [`Edge`] - Enum for Line, Transformer, Link connections
//! - [`Busmap`] - Total mapping from bus names to representative bus names
//! - Type-safe IDs: [`BusId`], [`LineId`], [`LinkId`], [`GenId`], ...
//!
//! ## Modules
//!
//! - [`busmap`] - Busmap type with composition and validation
//! - [`diagnostics`] - Validation and diagnostic reporting
//! - [`graph_utils`] - Topological analysis (components, degrees, sub-networks)

use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod busmap;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;

pub use busmap::Busmap;
pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{GrtError, GrtResult};
pub use graph_utils::*;
pub use petgraph::graph::NodeIndex;

use std::collections::BTreeMap;

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformerId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageId(usize);

macro_rules! impl_id {
    ($($name:ident),*) => {
        $(impl $name {
            #[inline]
            pub fn new(value: usize) -> Self {
                $name(value)
            }
            #[inline]
            pub fn value(&self) -> usize {
                self.0
            }
        })*
    };
}

impl_id!(BusId, LineId, TransformerId, LinkId, GenId, LoadId, StorageId);

/// A bus (substation or aggregation point) in the transmission graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    /// Longitude-like coordinate
    pub x: f64,
    /// Latitude-like coordinate
    pub y: f64,
    /// Nominal voltage in kilovolts
    pub v_nom: f64,
    /// Two-letter country code
    pub country: String,
    /// AC sub-network label, assigned by `determine_sub_networks`
    pub sub_network: String,
    /// Transmission system operator, merged from an external table
    pub tso: Option<String>,
    /// Low-voltage substation flag (dropped after voltage unification)
    pub substation_lv: bool,
    /// Offshore substation flag (dropped after voltage unification)
    pub substation_off: bool,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            id: BusId(0),
            name: String::new(),
            x: 0.0,
            y: 0.0,
            v_nom: 380.0,
            country: String::new(),
            sub_network: String::new(),
            tso: None,
            substation_lv: false,
            substation_off: false,
        }
    }
}

impl Bus {
    pub fn new(id: BusId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }

    pub fn with_v_nom(mut self, v_nom: f64) -> Self {
        self.v_nom = v_nom;
        self
    }
}

/// An AC transmission line between two buses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    /// Standard line type, resolved against the network's line-type registry
    pub line_type: String,
    /// Operating voltage in kilovolts
    pub v_nom: f64,
    /// Parallel circuit count (fractional after voltage rescaling)
    pub num_parallel: f64,
    /// Thermal rating in MVA
    pub s_nom: f64,
    /// Series resistance (per-unit)
    pub r: f64,
    /// Series reactance (per-unit)
    pub x: f64,
    /// Route length in km
    pub length: f64,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            id: LineId(0),
            name: String::new(),
            bus0: String::new(),
            bus1: String::new(),
            line_type: String::new(),
            v_nom: 380.0,
            num_parallel: 1.0,
            s_nom: 0.0,
            r: 0.0,
            x: 0.0,
            length: 0.0,
        }
    }
}

impl Line {
    pub fn new(
        id: LineId,
        name: impl Into<String>,
        bus0: impl Into<String>,
        bus1: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            bus0: bus0.into(),
            bus1: bus1.into(),
            ..Self::default()
        }
    }
}

/// A transformer, treated by the pipeline as a zero-length connector from a
/// lower voltage level (`bus0`) to a higher one (`bus1`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transformer {
    pub id: TransformerId,
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    pub s_nom: f64,
}

/// A point-to-point (typically HVDC) link between two buses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    /// Carrier tag; the reduction algorithms act on "DC" links
    pub carrier: String,
    /// Transfer capacity in MW
    pub p_nom: f64,
    /// Route length in km
    pub length: f64,
    /// Fraction of the route under water
    pub underwater_fraction: f64,
    pub p_max_pu: f64,
    pub p_min_pu: f64,
    pub underground: bool,
    pub under_construction: bool,
    pub capital_cost: f64,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            id: LinkId(0),
            name: String::new(),
            bus0: String::new(),
            bus1: String::new(),
            carrier: "DC".to_string(),
            p_nom: 0.0,
            length: 0.0,
            underwater_fraction: 0.0,
            p_max_pu: 1.0,
            p_min_pu: -1.0,
            underground: false,
            under_construction: false,
            capital_cost: 0.0,
        }
    }
}

impl Link {
    pub fn new(
        id: LinkId,
        name: impl Into<String>,
        bus0: impl Into<String>,
        bus1: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            bus0: bus0.into(),
            bus1: bus1.into(),
            ..Self::default()
        }
    }

    pub fn with_p_nom(mut self, p_nom: f64) -> Self {
        self.p_nom = p_nom;
        self
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }
}

/// A generator attached to a single bus.
///
/// The optional `p_max_pu` profile is a per-unit availability time series on
/// the network's shared snapshot axis (renewables); dispatchable units leave
/// it unset, which is equivalent to a constant 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
    pub id: GenId,
    pub name: String,
    pub bus: String,
    pub carrier: String,
    /// Installed capacity in MW
    pub p_nom: f64,
    /// Expansion potential in MW
    pub p_nom_max: f64,
    /// Annualized capital cost per MW
    pub capital_cost: f64,
    /// Marginal cost per MWh
    pub marginal_cost: f64,
    pub p_max_pu: Option<Vec<f64>>,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            id: GenId(0),
            name: String::new(),
            bus: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_max: f64::INFINITY,
            capital_cost: 0.0,
            marginal_cost: 0.0,
            p_max_pu: None,
        }
    }
}

impl Generator {
    pub fn new(id: GenId, name: impl Into<String>, bus: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            bus: bus.into(),
            ..Self::default()
        }
    }

    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = carrier.into();
        self
    }

    pub fn with_p_nom(mut self, p_nom: f64) -> Self {
        self.p_nom = p_nom;
        self
    }

    /// Mean per-unit availability over the snapshot axis (1.0 if no profile).
    pub fn mean_p_max_pu(&self) -> f64 {
        match &self.p_max_pu {
            Some(profile) if !profile.is_empty() => {
                profile.iter().sum::<f64>() / profile.len() as f64
            }
            _ => 1.0,
        }
    }
}

/// A load attached to a single bus, with a demand time series in MW.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub id: LoadId,
    pub name: String,
    pub bus: String,
    pub p_set: Vec<f64>,
}

impl Load {
    pub fn new(id: LoadId, name: impl Into<String>, bus: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            bus: bus.into(),
            p_set: Vec::new(),
        }
    }

    pub fn with_p_set(mut self, p_set: Vec<f64>) -> Self {
        self.p_set = p_set;
        self
    }

    /// Mean demand over the snapshot axis.
    pub fn mean_p_set(&self) -> f64 {
        if self.p_set.is_empty() {
            0.0
        } else {
            self.p_set.iter().sum::<f64>() / self.p_set.len() as f64
        }
    }
}

/// A storage unit attached to a single bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageUnit {
    pub id: StorageId,
    pub name: String,
    pub bus: String,
    pub carrier: String,
    pub p_nom: f64,
    /// Energy capacity expressed as hours at full power
    pub max_hours: f64,
    pub capital_cost: f64,
}

impl StorageUnit {
    pub fn new(id: StorageId, name: impl Into<String>, bus: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            bus: bus.into(),
            carrier: String::new(),
            p_nom: 0.0,
            max_hours: 0.0,
            capital_cost: 0.0,
        }
    }
}

/// Standard line type: electrical parameters per circuit, keyed by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineType {
    pub name: String,
    /// Nominal current per circuit in kA
    pub i_nom: f64,
}

// Enum to represent different types of nodes in the graph
#[derive(Debug, Clone)]
pub enum Node {
    Bus(Bus),
    Generator(Generator),
    Load(Load),
    Storage(StorageUnit),
}

// Enum to represent different types of edges in the graph
#[derive(Debug, Clone)]
pub enum Edge {
    Line(Line),
    Transformer(Transformer),
    Link(Link),
}

impl Node {
    /// Returns a human-readable label for the node.
    pub fn label(&self) -> &str {
        match self {
            Node::Bus(bus) => &bus.name,
            Node::Generator(gen) => &gen.name,
            Node::Load(load) => &load.name,
            Node::Storage(storage) => &storage.name,
        }
    }
}

impl Edge {
    /// Returns a human-readable label for the edge.
    pub fn label(&self) -> &str {
        match self {
            Edge::Line(line) => &line.name,
            Edge::Transformer(tx) => &tx.name,
            Edge::Link(link) => &link.name,
        }
    }

    /// Endpoint bus names of the branch.
    pub fn endpoints(&self) -> (&str, &str) {
        match self {
            Edge::Line(line) => (&line.bus0, &line.bus1),
            Edge::Transformer(tx) => (&tx.bus0, &tx.bus1),
            Edge::Link(link) => (&link.bus0, &link.bus1),
        }
    }
}

/// The core transmission network graph.
#[derive(Debug, Clone, Default)]
pub struct Network {
    pub graph: Graph<Node, Edge, Undirected>,
    /// Shared time axis for all component profiles
    pub snapshots: Vec<String>,
    /// Registry of standard line types
    pub line_types: BTreeMap<String, LineType>,
    /// Free-form metadata carried through every stage
    pub meta: serde_json::Value,
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
            snapshots: Vec::new(),
            line_types: BTreeMap::new(),
            meta: serde_json::Value::Null,
        }
    }

    /// Assemble a network from component tables, wiring branches to their
    /// endpoint buses.
    ///
    /// This is the single place where the branch-endpoint invariant is
    /// enforced: every `bus0`/`bus1`/`bus` reference must name a bus in
    /// `buses`, and branches may not be self-loops.
    #[allow(clippy::too_many_arguments)]
    pub fn from_components(
        snapshots: Vec<String>,
        line_types: BTreeMap<String, LineType>,
        buses: Vec<Bus>,
        lines: Vec<Line>,
        transformers: Vec<Transformer>,
        links: Vec<Link>,
        generators: Vec<Generator>,
        loads: Vec<Load>,
        storage_units: Vec<StorageUnit>,
        meta: serde_json::Value,
    ) -> GrtResult<Self> {
        let mut network = Network {
            graph: Graph::new_undirected(),
            snapshots,
            line_types,
            meta,
        };

        let mut index: HashMap<String, NodeIndex> = HashMap::with_capacity(buses.len());
        for bus in buses {
            if index.contains_key(&bus.name) {
                return Err(GrtError::Network(format!("duplicate bus `{}`", bus.name)));
            }
            let name = bus.name.clone();
            let node = network.graph.add_node(Node::Bus(bus));
            index.insert(name, node);
        }

        let endpoint = |index: &HashMap<String, NodeIndex>,
                        kind: &str,
                        name: &str,
                        bus: &str|
         -> GrtResult<NodeIndex> {
            index.get(bus).copied().ok_or_else(|| {
                GrtError::Network(format!("{kind} `{name}` references missing bus `{bus}`"))
            })
        };

        for line in lines {
            let a = endpoint(&index, "line", &line.name, &line.bus0)?;
            let b = endpoint(&index, "line", &line.name, &line.bus1)?;
            if a == b {
                return Err(GrtError::Network(format!("line `{}` is a self-loop", line.name)));
            }
            network.graph.add_edge(a, b, Edge::Line(line));
        }
        for tx in transformers {
            let a = endpoint(&index, "transformer", &tx.name, &tx.bus0)?;
            let b = endpoint(&index, "transformer", &tx.name, &tx.bus1)?;
            if a == b {
                return Err(GrtError::Network(format!(
                    "transformer `{}` is a self-loop",
                    tx.name
                )));
            }
            network.graph.add_edge(a, b, Edge::Transformer(tx));
        }
        for link in links {
            let a = endpoint(&index, "link", &link.name, &link.bus0)?;
            let b = endpoint(&index, "link", &link.name, &link.bus1)?;
            if a == b {
                return Err(GrtError::Network(format!("link `{}` is a self-loop", link.name)));
            }
            network.graph.add_edge(a, b, Edge::Link(link));
        }

        for gen in generators {
            endpoint(&index, "generator", &gen.name, &gen.bus)?;
            network.graph.add_node(Node::Generator(gen));
        }
        for load in loads {
            endpoint(&index, "load", &load.name, &load.bus)?;
            network.graph.add_node(Node::Load(load));
        }
        for storage in storage_units {
            endpoint(&index, "storage unit", &storage.name, &storage.bus)?;
            network.graph.add_node(Node::Storage(storage));
        }

        Ok(network)
    }

    /// Map from bus name to its graph node index.
    pub fn bus_indices(&self) -> HashMap<&str, NodeIndex> {
        self.graph
            .node_indices()
            .filter_map(|i| match &self.graph[i] {
                Node::Bus(b) => Some((b.name.as_str(), i)),
                _ => None,
            })
            .collect()
    }

    pub fn buses(&self) -> Vec<&Bus> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Bus(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    pub fn buses_mut(&mut self) -> impl Iterator<Item = &mut Bus> {
        self.graph.node_weights_mut().filter_map(|n| match n {
            Node::Bus(b) => Some(b),
            _ => None,
        })
    }

    pub fn bus(&self, name: &str) -> Option<&Bus> {
        self.buses().into_iter().find(|b| b.name == name)
    }

    pub fn generators(&self) -> Vec<&Generator> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Generator(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    pub fn generators_mut(&mut self) -> impl Iterator<Item = &mut Generator> {
        self.graph.node_weights_mut().filter_map(|n| match n {
            Node::Generator(g) => Some(g),
            _ => None,
        })
    }

    pub fn loads(&self) -> Vec<&Load> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Load(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn storage_units(&self) -> Vec<&StorageUnit> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Storage(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<&Line> {
        self.graph
            .edge_weights()
            .filter_map(|e| match e {
                Edge::Line(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn lines_mut(&mut self) -> impl Iterator<Item = &mut Line> {
        self.graph.edge_weights_mut().filter_map(|e| match e {
            Edge::Line(l) => Some(l),
            _ => None,
        })
    }

    pub fn transformers(&self) -> Vec<&Transformer> {
        self.graph
            .edge_weights()
            .filter_map(|e| match e {
                Edge::Transformer(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn links(&self) -> Vec<&Link> {
        self.graph
            .edge_weights()
            .filter_map(|e| match e {
                Edge::Link(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn links_mut(&mut self) -> impl Iterator<Item = &mut Link> {
        self.graph.edge_weights_mut().filter_map(|e| match e {
            Edge::Link(l) => Some(l),
            _ => None,
        })
    }

    pub fn generators_at_bus(&self, bus: &str) -> Vec<&Generator> {
        self.generators().into_iter().filter(|g| g.bus == bus).collect()
    }

    pub fn loads_at_bus(&self, bus: &str) -> Vec<&Load> {
        self.loads().into_iter().filter(|l| l.bus == bus).collect()
    }

    /// Distinct bus voltage levels, ascending.
    pub fn voltage_levels(&self) -> Vec<f64> {
        let mut levels: Vec<f64> = self.buses().iter().map(|b| b.v_nom).collect();
        levels.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        levels.dedup_by(|a, b| (*a - *b).abs() < 1e-6);
        levels
    }

    /// Get total installed generation capacity (MW)
    pub fn total_gen_capacity_mw(&self) -> f64 {
        self.generators().iter().map(|g| g.p_nom).sum()
    }

    /// Get total mean load (MW)
    pub fn total_load_mw(&self) -> f64 {
        self.loads().iter().map(|l| l.mean_p_set()).sum()
    }

    /// Get total AC line thermal capacity (MVA)
    pub fn total_line_capacity_mva(&self) -> f64 {
        self.lines().iter().map(|l| l.s_nom).sum()
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats::default();

        for node in self.graph.node_weights() {
            match node {
                Node::Bus(_) => stats.num_buses += 1,
                Node::Generator(g) => {
                    stats.num_generators += 1;
                    stats.total_gen_capacity_mw += g.p_nom;
                }
                Node::Load(l) => {
                    stats.num_loads += 1;
                    stats.total_load_mw += l.mean_p_set();
                }
                Node::Storage(_) => stats.num_storage_units += 1,
            }
        }
        for edge in self.graph.edge_weights() {
            match edge {
                Edge::Line(l) => {
                    stats.num_lines += 1;
                    stats.total_line_capacity_mva += l.s_nom;
                }
                Edge::Transformer(_) => stats.num_transformers += 1,
                Edge::Link(_) => stats.num_links += 1,
            }
        }
        stats
    }

    /// Validate network data for issues that break the reduction stages.
    ///
    /// Populates the provided `Diagnostics` with any warnings/errors found.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let bus_names: HashMap<&str, ()> =
            self.buses().iter().map(|b| (b.name.as_str(), ())).collect();

        if bus_names.is_empty() {
            diag.add_error("structure", "Network has no buses");
            return;
        }
        if bus_names.len() != self.buses().len() {
            diag.add_error("structure", "Bus names are not unique");
        }

        for edge in self.graph.edge_weights() {
            let (b0, b1) = edge.endpoints();
            if !bus_names.contains_key(b0) || !bus_names.contains_key(b1) {
                diag.add_error(
                    "topology",
                    &format!("branch `{}` references a missing bus", edge.label()),
                );
            }
            if b0 == b1 {
                diag.add_error("topology", &format!("branch `{}` is a self-loop", edge.label()));
            }
        }

        let n_snapshots = self.snapshots.len();
        for gen in self.generators() {
            if let Some(profile) = &gen.p_max_pu {
                if profile.len() != n_snapshots {
                    diag.add_error(
                        "series",
                        &format!(
                            "generator `{}` profile has {} samples, expected {}",
                            gen.name,
                            profile.len(),
                            n_snapshots
                        ),
                    );
                }
            }
        }
        for load in self.loads() {
            if !load.p_set.is_empty() && load.p_set.len() != n_snapshots {
                diag.add_error(
                    "series",
                    &format!(
                        "load `{}` profile has {} samples, expected {}",
                        load.name,
                        load.p_set.len(),
                        n_snapshots
                    ),
                );
            }
        }

        for line in self.lines() {
            if !self.line_types.contains_key(&line.line_type) && !line.line_type.is_empty() {
                diag.add_warning(
                    "types",
                    &format!("line `{}` uses unregistered type `{}`", line.name, line.line_type),
                );
            }
        }
    }
}

/// Statistics about a network's size and capacity
#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_lines: usize,
    pub num_transformers: usize,
    pub num_links: usize,
    pub num_generators: usize,
    pub num_loads: usize,
    pub num_storage_units: usize,
    pub total_gen_capacity_mw: f64,
    pub total_load_mw: f64,
    pub total_line_capacity_mva: f64,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} buses, {} lines, {} links, {} transformers, {} gens ({:.0} MW), {} loads ({:.0} MW)",
            self.num_buses,
            self.num_lines,
            self.num_links,
            self.num_transformers,
            self.num_generators,
            self.total_gen_capacity_mw,
            self.num_loads,
            self.total_load_mw
        )
    }
}
