use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use std::path::Path;

use crate::domain::{FacilityKind, GeoPoint};
use crate::map::state::MapStateCoordinator;

/// Snapshot the map as one GeoJSON FeatureCollection.
///
/// Every feature has a `layer` property: one of the facility layer names,
/// `user-location` or `route`.
pub fn to_geojson(state: &MapStateCoordinator) -> GeoJson {
    let mut features = Vec::new();
    let selected = state.selection().facility_ref();

    for shelter in state.shelters() {
        let mut props = layer_props(FacilityKind::Shelter.layer_name());
        props.insert("id".into(), shelter.id.into());
        props.insert("address".into(), shelter.address.clone().into());
        props.insert("capacity".into(), shelter.capacity.into());
        props.insert("population".into(), shelter.population_served.into());
        props.insert("coverage_ratio".into(), shelter.coverage_ratio.into());
        props.insert(
            "under_provisioned".into(),
            shelter.is_under_provisioned().into(),
        );
        props.insert(
            "selected".into(),
            (selected.map(|f| (f.kind, f.id)) == Some((FacilityKind::Shelter, shelter.id))).into(),
        );
        features.push(point_feature(shelter.location, props));
    }

    for (kind, id, name, phone, location) in state
        .police_stations()
        .iter()
        .map(|p| (FacilityKind::PoliceStation, p.id, &p.name, &p.phone, p.location))
        .chain(
            state
                .hospitals()
                .iter()
                .map(|h| (FacilityKind::Hospital, h.id, &h.name, &h.phone, h.location)),
        )
    {
        let mut props = layer_props(kind.layer_name());
        props.insert("id".into(), id.into());
        props.insert("name".into(), name.clone().into());
        props.insert("phone".into(), phone.clone().into());
        props.insert(
            "selected".into(),
            (selected.map(|f| (f.kind, f.id)) == Some((kind, id))).into(),
        );
        features.push(point_feature(location, props));
    }

    if let Some(user) = state.user_location() {
        features.push(point_feature(user, layer_props("user-location")));
    }

    if let Some(route) = state.route() {
        let mut props = layer_props("route");
        if let Some(travel) = state.travel() {
            props.insert("distance_km".into(), travel.distance_km.into());
            props.insert("walk_minutes".into(), travel.rounded_minutes().into());
        }
        features.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(Value::from(&route.to_line_string()))),
            id: None,
            properties: Some(props),
            foreign_members: None,
        });
    }

    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Write [`to_geojson`] to `path`
pub fn write_geojson(state: &MapStateCoordinator, path: &Path) -> anyhow::Result<()> {
    std::fs::write(path, to_geojson(state).to_string())?;
    log::info!("Map snapshot written to {}", path.display());
    Ok(())
}

fn layer_props(layer: &str) -> JsonObject {
    let mut props = JsonObject::new();
    props.insert("layer".into(), JsonValue::from(layer));
    props
}

fn point_feature(location: GeoPoint, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![location.lon(), location.lat()]))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FacilityRef, Hospital, RouteGeometry, Shelter};
    use crate::map::state::MapEvent;

    fn pt(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::from_lat_lon(lat, lon).unwrap()
    }

    fn features_in(geojson: &GeoJson, layer: &str) -> Vec<Feature> {
        match geojson {
            GeoJson::FeatureCollection(fc) => fc
                .features
                .iter()
                .filter(|f| f.property("layer").and_then(|v| v.as_str()) == Some(layer))
                .cloned()
                .collect(),
            _ => panic!("expected a FeatureCollection"),
        }
    }

    #[test]
    fn test_export_layers() {
        let mut state = MapStateCoordinator::new();
        state.handle(MapEvent::SheltersLoaded(
            vec![Shelter {
                id: 3,
                location: pt(59.92, 10.76),
                address: "Storgata 1".to_string(),
                capacity: 150,
                population_served: Some(300),
                coverage_ratio: Some(50.0),
            }]
            .into_iter()
            .collect(),
        ));
        state.handle(MapEvent::HospitalsLoaded(vec![Hospital {
            id: 8,
            name: "Ullevål".to_string(),
            phone: None,
            location: pt(59.936, 10.738),
        }]));
        let user = pt(59.91, 10.75);
        let commands = state.handle(MapEvent::LocationFixed(user));
        let ticket = commands
            .iter()
            .find_map(|c| match c {
                crate::map::MapCommand::RequestRoute(r) => Some(r.ticket),
                _ => None,
            })
            .unwrap();
        state.handle(MapEvent::RouteArrived {
            ticket,
            route: RouteGeometry::new(vec![user, pt(59.92, 10.76)]),
        });

        let geojson = to_geojson(&state);

        let shelters = features_in(&geojson, "shelters");
        assert_eq!(shelters.len(), 1);
        assert_eq!(
            shelters[0].property("under_provisioned"),
            Some(&JsonValue::Bool(true))
        );
        assert_eq!(shelters[0].property("selected"), Some(&JsonValue::Bool(true)));

        let hospitals = features_in(&geojson, "hospitals");
        assert_eq!(hospitals.len(), 1);
        assert_eq!(hospitals[0].property("phone"), Some(&JsonValue::Null));

        assert_eq!(features_in(&geojson, "user-location").len(), 1);
        let route = features_in(&geojson, "route");
        assert_eq!(route.len(), 1);
        assert_eq!(route[0].property("walk_minutes"), Some(&JsonValue::from(15u64)));
    }

    #[test]
    fn test_export_without_location() {
        let mut state = MapStateCoordinator::new();
        state.handle(MapEvent::FacilityClicked(FacilityRef::new(FacilityKind::Shelter, 1)));
        let geojson = to_geojson(&state);

        assert!(features_in(&geojson, "user-location").is_empty());
        assert!(features_in(&geojson, "route").is_empty());
    }

    #[test]
    fn test_write_geojson() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.geojson");
        write_geojson(&MapStateCoordinator::new(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: GeoJson = text.parse().unwrap();
        assert!(matches!(parsed, GeoJson::FeatureCollection(fc) if fc.features.is_empty()));
    }
}
