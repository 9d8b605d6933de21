use reqwest::blocking::{Client, Request};
use serde::Deserialize;
use std::time::Duration;

use crate::config::GeocoderConfig;
use crate::domain::GeoPoint;
use crate::error::{LocatorError, Result};

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Deserialize)]
struct Address {
    #[serde(default)]
    county: Option<String>,
    #[serde(default)]
    municipality: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

/// Administrative region around a position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseGeocode {
    pub county: Option<String>,
    pub municipality: Option<String>,
}

/// Reverse geocoding against a Nominatim instance
pub struct Geocoder {
    client: Client,
    url: String,
    zoom: u8,
}

impl Geocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        // Nominatim's usage policy requires an identifying User-Agent
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
            zoom: config.zoom,
        })
    }

    /// `GET {url}?lat=..&lon=..&format=json&zoom=..&addressdetails=1`
    fn reverse_request(&self, point: GeoPoint) -> reqwest::Result<Request> {
        let lat = point.lat().to_string();
        let lon = point.lon().to_string();
        let zoom = self.zoom.to_string();

        self.client
            .get(&self.url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("format", "json"),
                ("zoom", zoom.as_str()),
                ("addressdetails", "1"),
            ])
            .build()
    }

    /// Look up the county and municipality containing `point`.
    pub fn try_reverse(&self, point: GeoPoint) -> Result<ReverseGeocode> {
        let response = self
            .reverse_request(point)
            .and_then(|request| self.client.execute(request))
            .map_err(|e| LocatorError::Geocoding(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocatorError::Geocoding(format!(
                "Nominatim returned status {}",
                response.status()
            )));
        }

        let body: ReverseResponse = response
            .json()
            .map_err(|e| LocatorError::Geocoding(e.to_string()))?;
        let result = region_from_response(body);
        log::debug!("Reverse geocoded {:?} -> {:?}", point, result);
        Ok(result)
    }

    /// Like [`Geocoder::try_reverse`], but failures yield an empty result
    pub fn reverse(&self, point: GeoPoint) -> ReverseGeocode {
        self.try_reverse(point).unwrap_or_else(|e| {
            log::warn!("{}", e);
            ReverseGeocode::default()
        })
    }
}

fn region_from_response(body: ReverseResponse) -> ReverseGeocode {
    let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());

    match body.address {
        Some(address) => ReverseGeocode {
            county: non_empty(address.county),
            municipality: non_empty(address.municipality).or_else(|| non_empty(address.city)),
        },
        None => ReverseGeocode::default(),
    }
}
