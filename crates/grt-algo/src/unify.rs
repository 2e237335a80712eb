//! Voltage unification: map every bus and line onto the reference voltage.
//!
//! Lines below the reference level keep their thermal capability by trading
//! voltage for parallel circuits: the circuit count scales with the square of
//! the voltage ratio, and the rating is recomputed from the reference line
//! type's nominal current. Transformers then carry no information anymore and
//! are eliminated: each transformer maps its low-voltage bus onto its
//! high-voltage bus, chains of transformers resolve to the ultimate target by
//! iterative path compression, and every component reference is rewritten
//! through the resolved map.

use grt_core::{Busmap, GrtError, GrtResult, Line, Link, Network};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

#[derive(Debug, Clone)]
pub struct UnifyParams {
    /// Reference voltage level in kV
    pub reference_v_nom: f64,
}

impl Default for UnifyParams {
    fn default() -> Self {
        Self {
            reference_v_nom: 380.0,
        }
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

/// Map all network lines onto the single reference voltage layer and replace
/// transformers by direct bus merges. Returns the unified network and the
/// busmap from original buses onto their post-merge representatives.
pub fn unify_voltage(network: Network, params: &UnifyParams) -> GrtResult<(Network, Busmap)> {
    let v_ref = params.reference_v_nom;
    info!("mapping all network lines onto a single {v_ref:.0} kV layer");

    // The line type at the reference voltage supplies the electrical
    // parameters for every rescaled line; it must be unambiguous.
    let reference_types: BTreeSet<&str> = network
        .lines()
        .iter()
        .filter(|l| close(l.v_nom, v_ref))
        .map(|l| l.line_type.as_str())
        .collect();
    let reference_type = match reference_types.len() {
        0 => {
            return Err(GrtError::Config(format!(
                "no line at the reference voltage {v_ref:.0} kV to source line parameters from"
            )))
        }
        1 => reference_types.into_iter().next().unwrap().to_string(),
        n => {
            return Err(GrtError::Config(format!(
                "{n} distinct line types at the reference voltage {v_ref:.0} kV, expected one"
            )))
        }
    };
    let i_nom = network
        .line_types
        .get(&reference_type)
        .map(|t| t.i_nom)
        .ok_or_else(|| {
            GrtError::Config(format!("line type `{reference_type}` is not registered"))
        })?;

    // Transformer elimination map: low side -> high side, first wins, chains
    // compressed to their final target.
    let mut trafo_map: BTreeMap<String, String> = BTreeMap::new();
    for tx in network.transformers() {
        trafo_map
            .entry(tx.bus0.clone())
            .or_insert_with(|| tx.bus1.clone());
    }
    let keys: Vec<String> = trafo_map.keys().cloned().collect();
    for key in &keys {
        let mut target = trafo_map[key].clone();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        while let Some(next) = trafo_map.get(&target) {
            if next == &target || !seen.insert(target.clone()) {
                break;
            }
            target = next.clone();
        }
        trafo_map.insert(key.clone(), target);
    }
    trafo_map.retain(|from, to| from != to);
    let resolve = |name: &str| -> String {
        trafo_map
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    };

    // Rescale lines and rewrite their endpoints; merged endpoints would form
    // self-loops and are dropped.
    let mut lines: Vec<Line> = Vec::new();
    for line in network.lines() {
        let mut line = line.clone();
        if !close(line.v_nom, v_ref) {
            line.num_parallel *= (line.v_nom / v_ref).powi(2);
            line.v_nom = v_ref;
            line.line_type = reference_type.clone();
            line.s_nom = 3f64.sqrt() * i_nom * v_ref * line.num_parallel;
        }
        line.bus0 = resolve(&line.bus0);
        line.bus1 = resolve(&line.bus1);
        if line.bus0 != line.bus1 {
            lines.push(line);
        }
    }
    let mut links: Vec<Link> = Vec::new();
    for link in network.links() {
        let mut link = link.clone();
        link.bus0 = resolve(&link.bus0);
        link.bus1 = resolve(&link.bus1);
        if link.bus0 != link.bus1 {
            links.push(link);
        }
    }

    let buses = network
        .buses()
        .into_iter()
        .filter(|b| !trafo_map.contains_key(&b.name))
        .map(|b| {
            let mut bus = b.clone();
            bus.v_nom = v_ref;
            // Substation bookkeeping is meaningless once levels are merged.
            bus.substation_lv = false;
            bus.substation_off = false;
            bus
        })
        .collect();

    let mut generators = Vec::new();
    for gen in network.generators() {
        let mut gen = gen.clone();
        gen.bus = resolve(&gen.bus);
        generators.push(gen);
    }
    let mut loads = Vec::new();
    for load in network.loads() {
        let mut load = load.clone();
        load.bus = resolve(&load.bus);
        loads.push(load);
    }
    let mut storage_units = Vec::new();
    for unit in network.storage_units() {
        let mut unit = unit.clone();
        unit.bus = resolve(&unit.bus);
        storage_units.push(unit);
    }

    let mut busmap = Busmap::identity(&network);
    for (from, to) in &trafo_map {
        busmap.insert(from.clone(), to.clone());
    }

    let unified = Network::from_components(
        network.snapshots.clone(),
        network.line_types.clone(),
        buses,
        lines,
        vec![],
        links,
        generators,
        loads,
        storage_units,
        network.meta.clone(),
    )?;

    Ok((unified, busmap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assemble_full, bus, gen, line, load, transformer};
    use grt_core::Bus;

    fn leveled_bus(id: usize, name: &str, v_nom: f64) -> Bus {
        let mut b = bus(id, name, id as f64, 0.0, "DE");
        b.v_nom = v_nom;
        b
    }

    fn mixed_network() -> Network {
        // 110 kV bus `a` steps up through `b` (220 kV) to `c` (380 kV), which
        // connects on to `d` at the reference level.
        let mut low_line = line(0, "l_low", "a", "b", 0.0, 10.0);
        low_line.v_nom = 110.0;
        low_line.s_nom = 100.0;
        assemble_full(
            vec![
                leveled_bus(0, "a", 110.0),
                leveled_bus(1, "b", 220.0),
                leveled_bus(2, "c", 380.0),
                leveled_bus(3, "d", 380.0),
            ],
            vec![low_line, line(1, "l_ref", "c", "d", 500.0, 50.0)],
            vec![transformer(0, "tx0", "a", "b"), transformer(1, "tx1", "b", "c")],
            vec![],
            vec![gen(0, "g a", "a", "solar", 10.0, 100.0)],
            vec![load(0, "d a", "a", 5.0)],
            vec![],
        )
    }

    #[test]
    fn test_transformer_chains_resolve_to_final_target() {
        let (unified, busmap) = unify_voltage(mixed_network(), &UnifyParams::default()).unwrap();

        assert_eq!(busmap.apply("a"), "c");
        assert_eq!(busmap.apply("b"), "c");
        assert_eq!(busmap.apply("c"), "c");
        assert!(unified.bus("a").is_none());
        assert!(unified.bus("b").is_none());
        assert!(unified.transformers().is_empty());

        // Components that referenced removed buses follow the map.
        assert_eq!(unified.generators()[0].bus, "c");
        assert_eq!(unified.loads()[0].bus, "c");
    }

    #[test]
    fn test_single_voltage_level_and_rescaled_rating() {
        let (unified, _) = unify_voltage(mixed_network(), &UnifyParams::default()).unwrap();

        assert_eq!(unified.voltage_levels(), vec![380.0]);

        // The low-voltage line now hangs as a self-loop on `c` and is gone;
        // the reference line is untouched.
        let lines = unified.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "l_ref");
        assert!((lines[0].s_nom - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_rescaling_scales_circuits_by_squared_voltage_ratio() {
        // A 220 kV line between two retained buses.
        let mut mid_line = line(0, "l_mid", "a", "b", 300.0, 10.0);
        mid_line.v_nom = 220.0;
        let network = assemble_full(
            vec![leveled_bus(0, "a", 220.0), leveled_bus(1, "b", 380.0)],
            vec![mid_line, line(1, "l_ref", "a", "b", 500.0, 50.0)],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        );
        let (unified, _) = unify_voltage(network, &UnifyParams::default()).unwrap();

        let rescaled = unified
            .lines()
            .into_iter()
            .find(|l| l.name == "l_mid")
            .cloned()
            .unwrap();
        let expected_parallel = (220.0f64 / 380.0).powi(2);
        assert!((rescaled.num_parallel - expected_parallel).abs() < 1e-9);
        let expected_s_nom = 3f64.sqrt() * 3.86 * 380.0 * expected_parallel;
        assert!((rescaled.s_nom - expected_s_nom).abs() < 1e-6);
    }

    #[test]
    fn test_missing_reference_line_is_fatal() {
        let mut low_line = line(0, "l_low", "a", "b", 100.0, 10.0);
        low_line.v_nom = 110.0;
        let network = assemble_full(
            vec![leveled_bus(0, "a", 110.0), leveled_bus(1, "b", 110.0)],
            vec![low_line],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        );
        let result = unify_voltage(network, &UnifyParams::default());
        assert!(matches!(result, Err(GrtError::Config(_))));
    }
}
