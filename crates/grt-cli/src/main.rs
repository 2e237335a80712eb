//! Batch pipeline driver.
//!
//! `grt simplify` lifts the network onto one voltage level, folds DC
//! corridors, and removes stubs. `grt cluster` reduces the simplified
//! network to every configured target count. Each stage persists its outputs
//! only on full success; any failure aborts the run with the error chain.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use grt_algo::cluster::{ClusteringAlgorithm, ClusteringRequest, SolverKind};
use grt_algo::{
    aggregate_network, busmap_for_n_clusters, dissolve_regions, remove_stubs, simplify_links,
    unify_voltage, update_p_nom_max, AggregationStrategies, ClusterOptions, CostTable,
    LinkFoldParams, Linemap, NetworkClustering, UnifyParams,
};
use grt_core::{Busmap, Diagnostics, Network};
use grt_io::{
    apply_tso_map, load_cost_table, load_network, load_tso_map, read_busmap, read_regions,
    save_network, write_busmap, write_connection_costs, write_linemap, write_regions,
    ClusterTarget, PipelineConfig,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "grt",
    version,
    about = "Transmission network reduction and clustering pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Lift to one voltage level, fold DC corridors, remove stubs
    Simplify {
        /// Input network-model file
        #[arg(long)]
        network: PathBuf,
        /// Technology cost table (CSV)
        #[arg(long)]
        costs: PathBuf,
        /// Pipeline configuration (JSON)
        #[arg(long)]
        config: PathBuf,
        /// Onshore bus-region polygons (GeoJSON)
        #[arg(long)]
        regions_onshore: Option<PathBuf>,
        /// Offshore bus-region polygons (GeoJSON)
        #[arg(long)]
        regions_offshore: Option<PathBuf>,
        /// Output directory
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Cluster the simplified network to the configured target counts
    Cluster {
        /// Simplified network-model file
        #[arg(long)]
        network: PathBuf,
        /// Technology cost table (CSV)
        #[arg(long)]
        costs: PathBuf,
        /// Pipeline configuration (JSON)
        #[arg(long)]
        config: PathBuf,
        /// Onshore bus-region polygons (GeoJSON)
        #[arg(long)]
        regions_onshore: Option<PathBuf>,
        /// Offshore bus-region polygons (GeoJSON)
        #[arg(long)]
        regions_offshore: Option<PathBuf>,
        /// Externally prepared busmap bypassing the partitioning engine
        #[arg(long)]
        custom_busmap: Option<PathBuf>,
        /// Bus-TSO assignment table for two-level weighting (CSV)
        #[arg(long)]
        tso_busmap: Option<PathBuf>,
        /// Output directory
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    match cli.command {
        Commands::Simplify {
            network,
            costs,
            config,
            regions_onshore,
            regions_offshore,
            out,
        } => run_simplify(
            &network,
            &costs,
            &config,
            regions_onshore.as_deref(),
            regions_offshore.as_deref(),
            &out,
        ),
        Commands::Cluster {
            network,
            costs,
            config,
            regions_onshore,
            regions_offshore,
            custom_busmap,
            tso_busmap,
            out,
        } => run_cluster(
            &network,
            &costs,
            &config,
            regions_onshore.as_deref(),
            regions_offshore.as_deref(),
            custom_busmap.as_deref(),
            tso_busmap.as_deref(),
            &out,
        ),
    }
}

fn load_config(path: &Path) -> Result<PipelineConfig> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("reading configuration '{}'", path.display()))?;
    Ok(PipelineConfig::from_json(&body)?)
}

fn validated(network: Network) -> Result<Network> {
    let mut diag = Diagnostics::new();
    network.validate_into(&mut diag);
    for warning in diag.warnings() {
        warn!("[{}] {}", warning.category, warning.message);
    }
    if diag.has_errors() {
        bail!("input network failed validation: {}", diag.summary());
    }
    Ok(network)
}

fn dissolve_region_files(
    busmap: &Busmap,
    onshore: Option<&Path>,
    offshore: Option<&Path>,
    out: &Path,
    suffix: &str,
) -> Result<()> {
    for (input, stem) in [(onshore, "regions_onshore"), (offshore, "regions_offshore")] {
        let Some(input) = input else { continue };
        let regions = read_regions(input)?;
        let dissolved = dissolve_regions(&regions, busmap);
        write_regions(&dissolved, &out.join(format!("{stem}_elec_s{suffix}.geojson")))?;
    }
    Ok(())
}

fn run_simplify(
    network_path: &Path,
    costs_path: &Path,
    config_path: &Path,
    regions_onshore: Option<&Path>,
    regions_offshore: Option<&Path>,
    out: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    let network = validated(load_network(network_path)?)?;
    info!("loaded network: {}", network.stats());

    let costs: CostTable = load_cost_table(costs_path, config.cost_years)?;
    let strategies: AggregationStrategies = config.aggregation_strategies.to_strategies()?;
    let params = LinkFoldParams {
        p_max_pu: config.p_max_pu,
        length_factor: config.length_factor,
        renewable_carriers: config.renewable_carriers.clone(),
    };

    let (network, trafo_map) = unify_voltage(
        network,
        &UnifyParams {
            reference_v_nom: config.reference_v_nom,
        },
    )?;
    let (network, link_map, mut report) =
        simplify_links(network, &costs, &strategies, &params)?;
    let (mut network, stub_map, stub_report) =
        remove_stubs(network, &costs, &strategies, &params)?;
    report.merge(stub_report);

    update_p_nom_max(&mut network);
    network.meta = serde_json::to_value(&config).context("recording configuration")?;
    info!("simplified network: {}", network.stats());

    let busmap = Busmap::compose_chain(&[trafo_map, link_map, stub_map]);
    busmap.validate(&load_network(network_path)?, &network)?;

    save_network(&network, &out.join("elec_s.json"))?;
    write_busmap(&busmap, &out.join("busmap_elec_s.csv"))?;
    write_connection_costs(&report, &out.join("connection_costs_s.csv"))?;
    dissolve_region_files(&busmap, regions_onshore, regions_offshore, out, "")?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_cluster(
    network_path: &Path,
    costs_path: &Path,
    config_path: &Path,
    regions_onshore: Option<&Path>,
    regions_offshore: Option<&Path>,
    custom_busmap: Option<&Path>,
    tso_busmap: Option<&Path>,
    out: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    if config.clusters.is_empty() {
        bail!("configuration lists no cluster targets");
    }
    let mut base = validated(load_network(network_path)?)?;
    if let Some(tso_path) = tso_busmap {
        let tso_map = load_tso_map(tso_path)?;
        apply_tso_map(&mut base, &tso_map);
    }

    let costs = load_cost_table(costs_path, config.cost_years)?;
    let strategies = config.aggregation_strategies.to_strategies()?;
    let solver: SolverKind = config.solver_name.parse()?;
    let algorithm = ClusteringAlgorithm::from_config(
        &config.algorithm,
        config.feature.as_deref(),
        config.kmeans.to_params(),
    )?;
    // Corridors that stretch beyond their constituents pay overhead-line
    // costs when the cost table prices them.
    let extended_link_costs = costs
        .get("HVAC overhead")
        .map(|c| c.capital_cost)
        .unwrap_or(config.extended_link_costs);
    let custom = custom_busmap.map(read_busmap).transpose()?;

    for target in &config.clusters {
        let suffix = format!("_{target}");
        info!("clustering to target `{target}`");

        let mut clustering = cluster_one_target(
            &base,
            *target,
            &config,
            &strategies,
            &algorithm,
            solver,
            custom.as_ref(),
            extended_link_costs,
        )?;

        update_p_nom_max(&mut clustering.network);
        clustering.network.meta =
            serde_json::to_value(&config).context("recording configuration")?;
        info!("clustered network: {}", clustering.network.stats());

        save_network(&clustering.network, &out.join(format!("elec_s{suffix}.json")))?;
        write_busmap(&clustering.busmap, &out.join(format!("busmap_elec_s{suffix}.csv")))?;
        write_linemap(&clustering.linemap, &out.join(format!("linemap_elec_s{suffix}.csv")))?;
        dissolve_region_files(
            &clustering.busmap,
            regions_onshore,
            regions_offshore,
            out,
            &suffix,
        )?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cluster_one_target(
    base: &Network,
    target: ClusterTarget,
    config: &PipelineConfig,
    strategies: &AggregationStrategies,
    algorithm: &ClusteringAlgorithm,
    solver: SolverKind,
    custom_busmap: Option<&Busmap>,
    extended_link_costs: f64,
) -> Result<NetworkClustering> {
    let (n_clusters, aggregate_carriers) = match target {
        ClusterTarget::KeepAll => {
            // Fast path: nothing to cluster.
            let busmap = Busmap::identity(base);
            let mut linemap = Linemap::new();
            for line in base.lines() {
                linemap.insert(line.name.clone(), line.name.clone());
            }
            for link in base.links() {
                linemap.insert(link.name.clone(), link.name.clone());
            }
            return Ok(NetworkClustering {
                network: base.clone(),
                busmap,
                linemap,
            });
        }
        ClusterTarget::Count(n) => (n, None),
        ClusterTarget::CountFixedRenewables(n) => {
            let conventional: BTreeSet<String> =
                config.conventional_carriers.iter().cloned().collect();
            (n, Some(conventional))
        }
    };

    let mut network = base.clone();
    let busmap = match custom_busmap {
        Some(busmap) => {
            info!("using the externally supplied busmap");
            busmap.clone()
        }
        None => busmap_for_n_clusters(
            &mut network,
            &ClusteringRequest {
                n_clusters,
                algorithm: algorithm.clone(),
                country_weights: config.country_weights.clone(),
                tso_weights: config.tso_weights.clone(),
                solver,
            },
        )?,
    };

    let options = ClusterOptions {
        line_length_factor: config.length_factor,
        extended_link_costs,
        aggregate_carriers,
    };
    Ok(aggregate_network(&network, &busmap, strategies, &options)?)
}
