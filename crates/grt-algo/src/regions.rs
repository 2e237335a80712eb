//! Region reconciliation: dissolve per-bus coverage polygons into per-cluster
//! polygons.
//!
//! The onshore/offshore region collections are keyed by original bus name.
//! After the reduction pipeline, the composed busmap tells which cluster each
//! original bus belongs to; the polygons of all buses sharing a cluster are
//! unioned into one geometry per cluster.

use geo::{BooleanOps, MultiPolygon};
use grt_core::Busmap;
use std::collections::BTreeMap;
use tracing::warn;

/// A named coverage polygon, keyed by bus (input) or cluster (output).
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// Dissolve regions under the composed busmap: one output region per cluster,
/// geometry unioned over all member buses. Regions whose bus the busmap does
/// not know are skipped with a warning (they fell out of the model upstream).
pub fn dissolve_regions(regions: &[Region], busmap: &Busmap) -> Vec<Region> {
    let mut grouped: BTreeMap<String, Vec<&MultiPolygon<f64>>> = BTreeMap::new();
    for region in regions {
        match busmap.get(&region.name) {
            Some(cluster) => grouped
                .entry(cluster.to_string())
                .or_default()
                .push(&region.geometry),
            None => {
                warn!(
                    "region `{}` has no busmap entry and is dropped from the dissolve",
                    region.name
                );
            }
        }
    }

    grouped
        .into_iter()
        .map(|(name, members)| {
            let mut geometry = members[0].clone();
            for polygon in &members[1..] {
                geometry = geometry.union(polygon);
            }
            Region { name, geometry }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};
    use grt_core::Busmap;

    fn unit_square(x0: f64, y0: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0),
            (x: x0 + 1.0, y: y0),
            (x: x0 + 1.0, y: y0 + 1.0),
            (x: x0, y: y0 + 1.0),
            (x: x0, y: y0),
        ]])
    }

    #[test]
    fn test_dissolving_everything_yields_one_region_with_total_area() {
        let regions = vec![
            Region {
                name: "a".to_string(),
                geometry: unit_square(0.0, 0.0),
            },
            Region {
                name: "b".to_string(),
                geometry: unit_square(1.0, 0.0),
            },
            Region {
                name: "c".to_string(),
                geometry: unit_square(2.0, 0.0),
            },
        ];
        let busmap: Busmap = ["a", "b", "c"]
            .iter()
            .map(|b| (b.to_string(), "DE0 0".to_string()))
            .collect();

        let dissolved = dissolve_regions(&regions, &busmap);
        assert_eq!(dissolved.len(), 1);
        assert_eq!(dissolved[0].name, "DE0 0");
        let total: f64 = regions.iter().map(|r| r.geometry.unsigned_area()).sum();
        assert!((dissolved[0].geometry.unsigned_area() - total).abs() < 1e-9);
    }

    #[test]
    fn test_distinct_clusters_stay_apart() {
        let regions = vec![
            Region {
                name: "a".to_string(),
                geometry: unit_square(0.0, 0.0),
            },
            Region {
                name: "b".to_string(),
                geometry: unit_square(5.0, 0.0),
            },
        ];
        let busmap: Busmap = [
            ("a".to_string(), "c0".to_string()),
            ("b".to_string(), "c1".to_string()),
        ]
        .into_iter()
        .collect();

        let dissolved = dissolve_regions(&regions, &busmap);
        assert_eq!(dissolved.len(), 2);
    }

    #[test]
    fn test_unmapped_regions_are_skipped() {
        let regions = vec![Region {
            name: "orphan".to_string(),
            geometry: unit_square(0.0, 0.0),
        }];
        let dissolved = dissolve_regions(&regions, &Busmap::new());
        assert!(dissolved.is_empty());
    }
}
