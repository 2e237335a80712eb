//! Configuration values consumed by the pipeline.
//!
//! Only the values live here; how they reach the process (file, env,
//! embedding application) is the caller's concern. The CLI reads them from a
//! JSON document with the same shape.

use grt_algo::{AggregationStrategies, KMeansParams, Strategy};
use grt_core::{GrtError, GrtResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One entry of the cluster-target list: a bare count, a count with frozen
/// renewable resolution (`"37m"`), or the literal `"all"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTarget", into = "String")]
pub enum ClusterTarget {
    Count(usize),
    /// Cluster the grid but keep one generator per original bus for
    /// non-conventional carriers.
    CountFixedRenewables(usize),
    KeepAll,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Int(usize),
    Str(String),
}

impl TryFrom<RawTarget> for ClusterTarget {
    type Error = GrtError;

    fn try_from(raw: RawTarget) -> GrtResult<Self> {
        match raw {
            RawTarget::Int(n) => Ok(ClusterTarget::Count(n)),
            RawTarget::Str(s) => s.parse(),
        }
    }
}

impl std::str::FromStr for ClusterTarget {
    type Err = GrtError;

    fn from_str(s: &str) -> GrtResult<Self> {
        if s == "all" {
            return Ok(ClusterTarget::KeepAll);
        }
        let (digits, fixed) = match s.strip_suffix('m') {
            Some(digits) => (digits, true),
            None => (s, false),
        };
        let count: usize = digits.parse().map_err(|_| {
            GrtError::Config(format!(
                "cluster target `{s}` is neither an integer, `<n>m`, nor `all`"
            ))
        })?;
        if count == 0 {
            return Err(GrtError::Config("cluster target must be positive".into()));
        }
        Ok(if fixed {
            ClusterTarget::CountFixedRenewables(count)
        } else {
            ClusterTarget::Count(count)
        })
    }
}

impl std::fmt::Display for ClusterTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterTarget::Count(n) => write!(f, "{n}"),
            ClusterTarget::CountFixedRenewables(n) => write!(f, "{n}m"),
            ClusterTarget::KeepAll => write!(f, "all"),
        }
    }
}

impl From<ClusterTarget> for String {
    fn from(target: ClusterTarget) -> String {
        target.to_string()
    }
}

/// String-valued aggregation-strategy overrides, resolved into
/// [`AggregationStrategies`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationOverrides {
    pub bus: BTreeMap<String, String>,
    pub generator: BTreeMap<String, String>,
    pub generator_by_carrier: BTreeMap<String, BTreeMap<String, String>>,
}

impl AggregationOverrides {
    pub fn to_strategies(&self) -> GrtResult<AggregationStrategies> {
        let parse_table = |table: &BTreeMap<String, String>| -> GrtResult<BTreeMap<String, Strategy>> {
            table
                .iter()
                .map(|(attr, name)| Ok((attr.clone(), name.parse::<Strategy>()?)))
                .collect()
        };
        let mut strategies = AggregationStrategies {
            bus: parse_table(&self.bus)?,
            generator: parse_table(&self.generator)?,
            generator_by_carrier: BTreeMap::new(),
        };
        for (carrier, table) in &self.generator_by_carrier {
            strategies
                .generator_by_carrier
                .insert(carrier.clone(), parse_table(table)?);
        }
        Ok(strategies)
    }
}

/// K-means parameter overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansOverrides {
    pub n_init: usize,
    pub max_iter: usize,
    pub tol: f64,
    pub seed: u64,
}

impl Default for KMeansOverrides {
    fn default() -> Self {
        let defaults = KMeansParams::default();
        Self {
            n_init: defaults.n_init,
            max_iter: defaults.max_iter,
            tol: defaults.tol,
            seed: defaults.seed,
        }
    }
}

impl KMeansOverrides {
    pub fn to_params(&self) -> KMeansParams {
        KMeansParams {
            n_init: self.n_init,
            max_iter: self.max_iter,
            tol: self.tol,
            seed: self.seed,
        }
    }
}

/// All configuration values the pipeline consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Cluster-target list for the clustering stage
    pub clusters: Vec<ClusterTarget>,
    /// Partitioning algorithm: "kmeans", "hac", or "modularity"
    pub algorithm: String,
    /// Feature selector for HAC, e.g. "solar+onwind-time"
    pub feature: Option<String>,
    /// Solver for the cluster-count allocation
    pub solver_name: String,
    /// Multiplier turning straight-line distance into route length
    pub length_factor: f64,
    /// Dispatch magnitude of synthesized links
    pub p_max_pu: f64,
    /// Cost per km for corridors longer than their parts
    pub extended_link_costs: f64,
    /// Voltage level everything is mapped onto
    pub reference_v_nom: f64,
    /// Renewable technologies (offshore ones receive connection costs)
    pub renewable_carriers: Vec<String>,
    /// Conventional technologies, aggregated even for `<n>m` targets
    pub conventional_carriers: Vec<String>,
    /// Horizon scale for annualized costs
    pub cost_years: f64,
    pub country_weights: Option<BTreeMap<String, f64>>,
    pub tso_weights: Option<BTreeMap<String, BTreeMap<String, f64>>>,
    pub aggregation_strategies: AggregationOverrides,
    pub kmeans: KMeansOverrides,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clusters: vec![],
            algorithm: "kmeans".to_string(),
            feature: None,
            solver_name: "clarabel".to_string(),
            length_factor: 1.25,
            p_max_pu: 1.0,
            extended_link_costs: 0.0,
            reference_v_nom: 380.0,
            renewable_carriers: vec![
                "solar".to_string(),
                "onwind".to_string(),
                "offwind".to_string(),
            ],
            conventional_carriers: vec![
                "OCGT".to_string(),
                "CCGT".to_string(),
                "PHS".to_string(),
                "hydro".to_string(),
            ],
            cost_years: 1.0,
            country_weights: None,
            tso_weights: None,
            aggregation_strategies: AggregationOverrides::default(),
            kmeans: KMeansOverrides::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON document.
    pub fn from_json(body: &str) -> GrtResult<Self> {
        serde_json::from_str(body).map_err(|e| GrtError::Parse(format!("configuration: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_target_grammar() {
        assert_eq!("37".parse::<ClusterTarget>().unwrap(), ClusterTarget::Count(37));
        assert_eq!(
            "37m".parse::<ClusterTarget>().unwrap(),
            ClusterTarget::CountFixedRenewables(37)
        );
        assert_eq!("all".parse::<ClusterTarget>().unwrap(), ClusterTarget::KeepAll);
        assert!("37x".parse::<ClusterTarget>().is_err());
        assert!("0".parse::<ClusterTarget>().is_err());
    }

    #[test]
    fn test_config_parses_mixed_target_list() {
        let config = PipelineConfig::from_json(
            r#"{
                "clusters": [64, "37m", "all"],
                "algorithm": "hac",
                "feature": "solar+onwind-cap",
                "country_weights": {"DE": 0.5}
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.clusters,
            vec![
                ClusterTarget::Count(64),
                ClusterTarget::CountFixedRenewables(37),
                ClusterTarget::KeepAll
            ]
        );
        assert_eq!(config.algorithm, "hac");
        assert_eq!(config.country_weights.unwrap()["DE"], 0.5);
        // Untouched values keep their defaults.
        assert_eq!(config.length_factor, 1.25);
        assert_eq!(config.solver_name, "clarabel");
    }

    #[test]
    fn test_strategy_overrides_resolve() {
        let overrides = AggregationOverrides {
            generator: [("p_nom_max".to_string(), "min".to_string())]
                .into_iter()
                .collect(),
            ..AggregationOverrides::default()
        };
        let strategies = overrides.to_strategies().unwrap();
        assert_eq!(strategies.generator["p_nom_max"], Strategy::Min);

        let broken = AggregationOverrides {
            generator: [("p_nom".to_string(), "median".to_string())]
                .into_iter()
                .collect(),
            ..AggregationOverrides::default()
        };
        assert!(broken.to_strategies().is_err());
    }
}
