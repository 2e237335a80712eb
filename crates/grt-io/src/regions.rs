//! Region file exchange: GeoJSON FeatureCollections keyed by a `name`
//! property, with Polygon or MultiPolygon geometry.

use anyhow::{anyhow, Context, Result};
use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue};
use grt_algo::Region;
use std::fs;
use std::path::Path;

/// Read a region collection. Every feature must carry a `name` property and
/// polygonal geometry.
pub fn read_regions(path: &Path) -> Result<Vec<Region>> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("reading regions '{}'", path.display()))?;
    let geojson: GeoJson = body
        .parse()
        .with_context(|| format!("parsing regions '{}'", path.display()))?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(anyhow!(
            "regions file '{}' is not a FeatureCollection",
            path.display()
        ));
    };

    let mut regions = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let name = feature
            .properties
            .as_ref()
            .and_then(|p| p.get("name"))
            .and_then(JsonValue::as_str)
            .ok_or_else(|| anyhow!("region feature without a `name` property"))?
            .to_string();
        let geometry = feature
            .geometry
            .ok_or_else(|| anyhow!("region `{name}` has no geometry"))?;
        let geometry = match geometry.value {
            value @ geojson::Value::MultiPolygon(_) => MultiPolygon::try_from(value)
                .with_context(|| format!("region `{name}` geometry"))?,
            value @ geojson::Value::Polygon(_) => {
                let polygon = geo::Polygon::try_from(value)
                    .with_context(|| format!("region `{name}` geometry"))?;
                MultiPolygon(vec![polygon])
            }
            _ => return Err(anyhow!("region `{name}` has non-polygonal geometry")),
        };
        regions.push(Region { name, geometry });
    }
    Ok(regions)
}

/// Write a region collection.
pub fn write_regions(regions: &[Region], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory '{}'", parent.display()))?;
    }
    let features: Vec<Feature> = regions
        .iter()
        .map(|region| {
            let mut properties = JsonObject::new();
            properties.insert("name".to_string(), JsonValue::from(region.name.clone()));
            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&region.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    fs::write(path, collection.to_string())
        .with_context(|| format!("writing regions '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    #[test]
    fn test_geojson_round_trip() {
        let regions = vec![Region {
            name: "de0".to_string(),
            geometry: MultiPolygon(vec![polygon![
                (x: 0.0, y: 0.0),
                (x: 2.0, y: 0.0),
                (x: 2.0, y: 1.0),
                (x: 0.0, y: 1.0),
                (x: 0.0, y: 0.0),
            ]]),
        }];

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.geojson");
        write_regions(&regions, &path).unwrap();
        let reloaded = read_regions(&path).unwrap();

        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0].name, "de0");
        assert!(
            (reloaded[0].geometry.unsigned_area() - regions[0].geometry.unsigned_area()).abs()
                < 1e-9
        );
    }

    #[test]
    fn test_non_collection_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("regions.geojson");
        fs::write(&path, r#"{"type": "Point", "coordinates": [0.0, 0.0]}"#).unwrap();
        assert!(read_regions(&path).is_err());
    }
}
