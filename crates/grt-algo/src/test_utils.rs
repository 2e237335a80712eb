//! Small network builders shared by the unit and integration tests.

use grt_core::{
    Bus, BusId, GenId, Generator, Line, LineId, LineType, Link, LinkId, Load, LoadId, Network,
    StorageId, StorageUnit, Transformer, TransformerId,
};
use std::collections::BTreeMap;

pub fn bus(id: usize, name: &str, x: f64, y: f64, country: &str) -> Bus {
    Bus::new(BusId::new(id), name)
        .with_position(x, y)
        .with_country(country)
}

pub fn line(id: usize, name: &str, bus0: &str, bus1: &str, s_nom: f64, length: f64) -> Line {
    Line {
        s_nom,
        length,
        x: 0.1,
        line_type: "Al/St 240/40 4-bundle 380.0".to_string(),
        ..Line::new(LineId::new(id), name, bus0, bus1)
    }
}

pub fn link(
    id: usize,
    name: &str,
    bus0: &str,
    bus1: &str,
    p_nom: f64,
    length: f64,
    underwater_fraction: f64,
) -> Link {
    Link {
        underwater_fraction,
        ..Link::new(LinkId::new(id), name, bus0, bus1)
            .with_p_nom(p_nom)
            .with_length(length)
    }
}

pub fn transformer(id: usize, name: &str, bus0: &str, bus1: &str) -> Transformer {
    Transformer {
        id: TransformerId::new(id),
        name: name.to_string(),
        bus0: bus0.to_string(),
        bus1: bus1.to_string(),
        s_nom: 0.0,
    }
}

pub fn gen(
    id: usize,
    name: &str,
    bus: &str,
    carrier: &str,
    p_nom: f64,
    capital_cost: f64,
) -> Generator {
    Generator {
        capital_cost,
        ..Generator::new(GenId::new(id), name, bus)
            .with_carrier(carrier)
            .with_p_nom(p_nom)
    }
}

/// A load with a flat two-sample profile averaging to `p_mean`.
pub fn load(id: usize, name: &str, bus: &str, p_mean: f64) -> Load {
    Load::new(LoadId::new(id), name, bus).with_p_set(vec![p_mean, p_mean])
}

pub fn storage(id: usize, name: &str, bus: &str, carrier: &str, p_nom: f64) -> StorageUnit {
    StorageUnit {
        carrier: carrier.to_string(),
        p_nom,
        max_hours: 6.0,
        ..StorageUnit::new(StorageId::new(id), name, bus)
    }
}

/// The line-type registry the builders above reference.
pub fn default_line_types() -> BTreeMap<String, LineType> {
    let name = "Al/St 240/40 4-bundle 380.0".to_string();
    let mut types = BTreeMap::new();
    types.insert(
        name.clone(),
        LineType {
            name,
            i_nom: 3.86,
        },
    );
    types
}

#[allow(clippy::too_many_arguments)]
pub fn assemble(
    buses: Vec<Bus>,
    lines: Vec<Line>,
    links: Vec<Link>,
    generators: Vec<Generator>,
    loads: Vec<Load>,
) -> Network {
    assemble_full(buses, lines, vec![], links, generators, loads, vec![])
}

#[allow(clippy::too_many_arguments)]
pub fn assemble_full(
    buses: Vec<Bus>,
    lines: Vec<Line>,
    transformers: Vec<Transformer>,
    links: Vec<Link>,
    generators: Vec<Generator>,
    loads: Vec<Load>,
    storage_units: Vec<StorageUnit>,
) -> Network {
    Network::from_components(
        vec!["t0".to_string(), "t1".to_string()],
        default_line_types(),
        buses,
        lines,
        transformers,
        links,
        generators,
        loads,
        storage_units,
        serde_json::Value::Null,
    )
    .expect("test network must assemble")
}
