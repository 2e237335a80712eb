//! Network-model persistence: one JSON document per stage boundary.
//!
//! The file mirrors the in-memory model one table per component class, plus
//! the snapshot axis, the line-type registry, and free-form metadata, so a
//! stage's output reloads bit-identically as the next stage's input.

use anyhow::{Context, Result};
use grt_core::{
    Bus, Generator, GrtError, GrtResult, Line, LineType, Link, Load, Network, StorageUnit,
    Transformer,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const FORMAT: &str = "grt-network/1";

/// Serde mirror of [`Network`].
#[derive(Debug, Serialize, Deserialize)]
pub struct NetworkFile {
    pub format: String,
    pub snapshots: Vec<String>,
    pub line_types: BTreeMap<String, LineType>,
    pub buses: Vec<Bus>,
    pub lines: Vec<Line>,
    pub transformers: Vec<Transformer>,
    pub links: Vec<Link>,
    pub generators: Vec<Generator>,
    pub loads: Vec<Load>,
    pub storage_units: Vec<StorageUnit>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

impl From<&Network> for NetworkFile {
    fn from(network: &Network) -> Self {
        let mut buses: Vec<Bus> = network.buses().into_iter().cloned().collect();
        buses.sort_by(|a, b| a.name.cmp(&b.name));
        let mut lines: Vec<Line> = network.lines().into_iter().cloned().collect();
        lines.sort_by(|a, b| a.name.cmp(&b.name));
        let mut transformers: Vec<Transformer> =
            network.transformers().into_iter().cloned().collect();
        transformers.sort_by(|a, b| a.name.cmp(&b.name));
        let mut links: Vec<Link> = network.links().into_iter().cloned().collect();
        links.sort_by(|a, b| a.name.cmp(&b.name));
        let mut generators: Vec<Generator> = network.generators().into_iter().cloned().collect();
        generators.sort_by(|a, b| a.name.cmp(&b.name));
        let mut loads: Vec<Load> = network.loads().into_iter().cloned().collect();
        loads.sort_by(|a, b| a.name.cmp(&b.name));
        let mut storage_units: Vec<StorageUnit> =
            network.storage_units().into_iter().cloned().collect();
        storage_units.sort_by(|a, b| a.name.cmp(&b.name));

        NetworkFile {
            format: FORMAT.to_string(),
            snapshots: network.snapshots.clone(),
            line_types: network.line_types.clone(),
            buses,
            lines,
            transformers,
            links,
            generators,
            loads,
            storage_units,
            meta: network.meta.clone(),
        }
    }
}

impl NetworkFile {
    pub fn into_network(self) -> GrtResult<Network> {
        if self.format != FORMAT {
            return Err(GrtError::Parse(format!(
                "unsupported network format `{}`, expected `{FORMAT}`",
                self.format
            )));
        }
        Network::from_components(
            self.snapshots,
            self.line_types,
            self.buses,
            self.lines,
            self.transformers,
            self.links,
            self.generators,
            self.loads,
            self.storage_units,
            self.meta,
        )
    }
}

/// Write a network-model file.
pub fn save_network(network: &Network, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory '{}'", parent.display()))?;
    }
    let file = NetworkFile::from(network);
    let body = serde_json::to_string_pretty(&file).context("serializing network model")?;
    fs::write(path, body)
        .with_context(|| format!("writing network model '{}'", path.display()))?;
    Ok(())
}

/// Read a network-model file.
pub fn load_network(path: &Path) -> Result<Network> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("reading network model '{}'", path.display()))?;
    let file: NetworkFile = serde_json::from_str(&body)
        .with_context(|| format!("parsing network model '{}'", path.display()))?;
    let network = file
        .into_network()
        .with_context(|| format!("assembling network from '{}'", path.display()))?;
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grt_algo::test_utils::{assemble, bus, gen, line, link, load};

    #[test]
    fn test_round_trip_is_lossless() {
        let mut network = assemble(
            vec![bus(0, "a", 0.5, 1.5, "DE"), bus(1, "b", 2.5, 3.5, "FR")],
            vec![line(0, "l", "a", "b", 123.0, 45.0)],
            vec![link(0, "k", "a", "b", 500.0, 80.0, 0.25)],
            vec![gen(0, "g", "a", "solar", 10.0, 600.0)],
            vec![load(0, "d", "b", 42.0)],
        );
        network.meta = serde_json::json!({"run": "test", "clusters": [4, "all"]});

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("elec.json");
        save_network(&network, &path).unwrap();
        let reloaded = load_network(&path).unwrap();

        assert_eq!(reloaded.snapshots, network.snapshots);
        assert_eq!(reloaded.buses().len(), 2);
        assert_eq!(reloaded.lines()[0].s_nom, 123.0);
        assert_eq!(reloaded.links()[0].underwater_fraction, 0.25);
        assert_eq!(reloaded.meta, network.meta);

        // A second round trip produces byte-identical output.
        let path2 = dir.path().join("elec2.json");
        save_network(&reloaded, &path2).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            fs::read_to_string(&path2).unwrap()
        );
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let file = NetworkFile {
            format: "grt-network/99".to_string(),
            snapshots: vec![],
            line_types: BTreeMap::new(),
            buses: vec![],
            lines: vec![],
            transformers: vec![],
            links: vec![],
            generators: vec![],
            loads: vec![],
            storage_units: vec![],
            meta: serde_json::Value::Null,
        };
        assert!(file.into_network().is_err());
    }
}
