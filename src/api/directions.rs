use reqwest::blocking::{Client, Request};
use serde::Deserialize;
use std::time::Duration;

use crate::config::DirectionsConfig;
use crate::domain::{GeoPoint, RouteGeometry};
use crate::error::{LocatorError, Result};

/// Something that can produce a walking path between two points.
///
/// Implementations are called from worker threads, one call per request.
pub trait RouteSource: Send + Sync {
    /// `None` on failure or when the service finds no route
    fn fetch_walking_route(&self, start: GeoPoint, end: GeoPoint) -> Option<RouteGeometry>;
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    geometry: LineGeometry,
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Walking directions from a Mapbox-style directions API
pub struct RouteGateway {
    client: Client,
    base_url: String,
    access_token: String,
}

impl RouteGateway {
    pub fn new(config: &DirectionsConfig) -> Result<Self> {
        let access_token = config
            .access_token
            .clone()
            .ok_or(LocatorError::Config {
                section: "directions",
                key: "access_token",
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    /// `GET {base}/{startLon},{startLat};{endLon},{endLat}` with GeoJSON geometry
    fn route_request(&self, start: GeoPoint, end: GeoPoint) -> reqwest::Result<Request> {
        let url = format!(
            "{}/{},{};{},{}",
            self.base_url,
            start.lon(),
            start.lat(),
            end.lon(),
            end.lat()
        );

        self.client
            .get(url)
            .query(&[
                ("steps", "true"),
                ("geometries", "geojson"),
                ("access_token", self.access_token.as_str()),
            ])
            .build()
    }

    /// Single request, no retry. Returns the first route the service offers.
    pub fn try_fetch_walking_route(
        &self,
        start: GeoPoint,
        end: GeoPoint,
    ) -> Result<RouteGeometry> {
        let response = self
            .route_request(start, end)
            .and_then(|request| self.client.execute(request))
            .map_err(|e| LocatorError::RouteFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocatorError::RouteFetch(format!(
                "directions service returned status {}",
                response.status()
            )));
        }

        let body: DirectionsResponse = response
            .json()
            .map_err(|e| LocatorError::RouteFetch(e.to_string()))?;
        first_route(body)
    }
}

impl RouteSource for RouteGateway {
    fn fetch_walking_route(&self, start: GeoPoint, end: GeoPoint) -> Option<RouteGeometry> {
        match self.try_fetch_walking_route(start, end) {
            Ok(route) => Some(route),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }
}

fn first_route(body: DirectionsResponse) -> Result<RouteGeometry> {
    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or(LocatorError::EmptyRouteResult)?;

    let points: Vec<GeoPoint> = route
        .geometry
        .coordinates
        .into_iter()
        .filter_map(|[lon, lat]| GeoPoint::new(lon, lat).ok())
        .collect();

    RouteGeometry::new(points).ok_or(LocatorError::EmptyRouteResult)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_route_is_used() {
        let json = r#"{
            "code": "Ok",
            "routes": [
                {"distance": 1320.5, "duration": 950.1,
                 "geometry": {"type": "LineString", "coordinates": [[10.75, 59.91], [10.755, 59.915], [10.76, 59.92]]}},
                {"distance": 1500.0, "duration": 1100.0,
                 "geometry": {"type": "LineString", "coordinates": [[10.75, 59.91], [10.76, 59.92]]}}
            ]
        }"#;
        let body: DirectionsResponse = serde_json::from_str(json).unwrap();
        let route = first_route(body).unwrap();

        assert_eq!(route.points().len(), 3);
        assert_eq!(route.start(), GeoPoint::new(10.75, 59.91).unwrap());
        assert_eq!(route.end(), GeoPoint::new(10.76, 59.92).unwrap());
    }

    #[test]
    fn test_empty_routes() {
        let body: DirectionsResponse =
            serde_json::from_str(r#"{"code": "NoRoute", "routes": []}"#).unwrap();
        assert!(matches!(first_route(body), Err(LocatorError::EmptyRouteResult)));

        let body: DirectionsResponse = serde_json::from_str(r#"{"code": "NoSegment"}"#).unwrap();
        assert!(matches!(first_route(body), Err(LocatorError::EmptyRouteResult)));
    }

    #[test]
    fn test_degenerate_geometry_is_empty() {
        let json =
            r#"{"routes": [{"geometry": {"type": "LineString", "coordinates": [[10.75, 59.91]]}}]}"#;
        let body: DirectionsResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(first_route(body), Err(LocatorError::EmptyRouteResult)));
    }

    #[test]
    fn test_gateway_requires_token() {
        let config = DirectionsConfig::default();
        assert!(matches!(
            RouteGateway::new(&config),
            Err(LocatorError::Config {
                key: "access_token",
                ..
            })
        ));
    }

    #[test]
    fn test_route_request_orders_lon_before_lat() {
        let config = DirectionsConfig {
            access_token: Some("pk.test".to_string()),
            ..DirectionsConfig::default()
        };
        let gateway = RouteGateway::new(&config).unwrap();
        let start = GeoPoint::from_lat_lon(59.91, 10.75).unwrap();
        let end = GeoPoint::from_lat_lon(59.92, 10.76).unwrap();

        let request = gateway.route_request(start, end).unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(
            request.url().path(),
            "/directions/v5/mapbox/walking/10.75,59.91;10.76,59.92"
        );
        let query: Vec<(String, String)> = request.url().query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("steps".to_string(), "true".to_string()),
                ("geometries".to_string(), "geojson".to_string()),
                ("access_token".to_string(), "pk.test".to_string()),
            ]
        );
    }
}
