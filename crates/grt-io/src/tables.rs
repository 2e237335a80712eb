//! Tabular artifacts: busmaps, linemaps, connection costs, the technology
//! cost table, and the bus-TSO assignment table.

use anyhow::{Context, Result};
use grt_algo::{annuity, ConnectionCostReport, CostTable, Linemap, TechCost};
use grt_core::{Busmap, Network, Node};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Write a busmap as a two-column CSV, one row per original bus.
pub fn write_busmap(busmap: &Busmap, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating busmap '{}'", path.display()))?;
    writer.write_record(["bus", "busmap"])?;
    for (from, to) in busmap.iter() {
        writer.write_record([from, to])?;
    }
    writer.flush().context("writing busmap")?;
    Ok(())
}

/// Read a (possibly externally prepared) busmap CSV.
pub fn read_busmap(path: &Path) -> Result<Busmap> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("reading busmap '{}'", path.display()))?;
    let mut busmap = Busmap::new();
    for record in reader.records() {
        let record = record.context("parsing busmap row")?;
        let from = record
            .get(0)
            .context("busmap row is missing the bus column")?;
        let to = record
            .get(1)
            .context("busmap row is missing the target column")?;
        busmap.insert(from, to);
    }
    Ok(busmap)
}

/// Write a linemap as a two-column CSV, one row per surviving branch.
pub fn write_linemap(linemap: &Linemap, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating linemap '{}'", path.display()))?;
    writer.write_record(["branch", "linemap"])?;
    for (from, to) in linemap {
        writer.write_record([from, to])?;
    }
    writer.flush().context("writing linemap")?;
    Ok(())
}

/// Write the connection-cost report: one column per technology, one row per
/// bus that received an adjustment.
pub fn write_connection_costs(report: &ConnectionCostReport, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let technologies: Vec<String> = report
        .technologies()
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating connection-cost report '{}'", path.display()))?;

    let mut header = vec!["bus".to_string()];
    header.extend(technologies.iter().cloned());
    writer.write_record(&header)?;
    for (bus, costs) in &report.0 {
        let mut row = vec![bus.clone()];
        for tech in &technologies {
            row.push(
                costs
                    .get(tech)
                    .map(|c| format!("{c}"))
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&row)?;
    }
    writer.flush().context("writing connection-cost report")?;
    Ok(())
}

#[derive(Debug, serde::Deserialize)]
struct CostRow {
    technology: String,
    #[serde(default)]
    investment: f64,
    #[serde(default)]
    lifetime: f64,
    #[serde(default)]
    discount_rate: f64,
    #[serde(default)]
    marginal_cost: f64,
}

/// Load the technology cost table, annualizing the overnight investment over
/// the lifetime at the discount rate, scaled to the model horizon.
pub fn load_cost_table(path: &Path, n_years: f64) -> Result<CostTable> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("reading cost table '{}'", path.display()))?;
    let mut table = CostTable::new();
    for row in reader.deserialize() {
        let row: CostRow = row.context("parsing cost table row")?;
        let capital_cost = if row.lifetime > 0.0 {
            annuity(row.lifetime, row.discount_rate) * row.investment * n_years
        } else {
            row.investment
        };
        table.insert(
            row.technology.clone(),
            TechCost {
                investment: row.investment,
                lifetime: row.lifetime,
                discount_rate: row.discount_rate,
                marginal_cost: row.marginal_cost,
                capital_cost,
            },
        );
    }
    Ok(table)
}

/// Load the externally prepared bus-TSO assignment table (`bus,tso`).
pub fn load_tso_map(path: &Path) -> Result<BTreeMap<String, String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("reading TSO table '{}'", path.display()))?;
    let mut map = BTreeMap::new();
    for record in reader.records() {
        let record = record.context("parsing TSO row")?;
        let bus = record.get(0).context("TSO row is missing the bus column")?;
        let tso = record.get(1).context("TSO row is missing the tso column")?;
        map.insert(bus.to_string(), tso.to_string());
    }
    Ok(map)
}

/// Merge a bus-TSO assignment onto the network's buses.
pub fn apply_tso_map(network: &mut Network, tso_map: &BTreeMap<String, String>) {
    for node in network.graph.node_weights_mut() {
        if let Node::Bus(bus) = node {
            bus.tso = tso_map.get(&bus.name).cloned();
        }
    }
}
