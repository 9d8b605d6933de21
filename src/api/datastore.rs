use reqwest::blocking::{Client, Request, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::DataStoreConfig;
use crate::domain::{GeoPoint, Hospital, PoliceStation, ProjectedPoint, Shelter, ShelterCollection};
use crate::error::{LocatorError, Result};
use crate::geometry::CoordinateTransform;

const SHELTERS: &str = "shelters";
const POLICE_STATIONS: &str = "police stations";
const HOSPITALS: &str = "hospitals";

/// Row returned by the shelters-with-population function
#[derive(Debug, Deserialize)]
pub struct ShelterRow {
    pub shelter_id: i64,
    pub geom: PointGeometry,
    #[serde(rename = "adresse")]
    pub address: String,
    #[serde(rename = "plasser")]
    pub capacity: i64,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default)]
    pub coverage_ratio: Option<f64>,
}

/// GeoJSON point as stored in the data store, in EPSG:25833 meters
#[derive(Debug, Deserialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub type_: String,
    pub coordinates: Vec<f64>,
}

/// Row of the police-station and hospital tables, already in lon/lat
#[derive(Debug, Deserialize)]
pub struct StationRow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub lon: f64,
    pub lat: f64,
}

/// Everything the map needs at startup
#[derive(Debug, Default)]
pub struct FacilityData {
    pub shelters: ShelterCollection,
    pub police_stations: Vec<PoliceStation>,
    pub hospitals: Vec<Hospital>,
}

/// Reads shelters, police stations and hospitals from a PostgREST data store.
///
/// Load failures are logged and turn into empty collections; an empty result
/// means "unavailable", not "none exist".
pub struct FacilityDataGateway {
    store: StoreClient,
    transform: CoordinateTransform,
}

/// The HTTP half of the gateway, shared by the concurrent fetch workers
struct StoreClient {
    client: Client,
    config: DataStoreConfig,
    base_url: String,
    api_key: String,
}

impl FacilityDataGateway {
    pub fn new(config: &DataStoreConfig, transform: CoordinateTransform) -> Result<Self> {
        let base_url = config
            .url
            .as_deref()
            .ok_or(LocatorError::Config {
                section: "data_store",
                key: "url",
            })?
            .trim_end_matches('/')
            .to_string();
        let api_key = config.api_key.clone().ok_or(LocatorError::Config {
            section: "data_store",
            key: "api_key",
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            store: StoreClient {
                client,
                config: config.clone(),
                base_url,
                api_key,
            },
            transform,
        })
    }

    pub fn load_shelters(&self) -> ShelterCollection {
        match self.store.fetch_shelter_rows() {
            Ok(rows) => assemble_shelters(rows, &self.transform),
            Err(e) => {
                log::error!("{}", e);
                ShelterCollection::new()
            }
        }
    }

    pub fn load_police_stations(&self) -> Vec<PoliceStation> {
        match self.store.fetch_police_rows() {
            Ok(rows) => stations_from_rows(rows, POLICE_STATIONS, police_station_from_row),
            Err(e) => {
                log::error!("{}", e);
                Vec::new()
            }
        }
    }

    pub fn load_hospitals(&self) -> Vec<Hospital> {
        match self.store.fetch_hospital_rows() {
            Ok(rows) => stations_from_rows(rows, HOSPITALS, hospital_from_row),
            Err(e) => {
                log::error!("{}", e);
                Vec::new()
            }
        }
    }

    /// Issue the three independent fetches concurrently.
    ///
    /// Only the HTTP round-trips run on worker threads; coordinate transformation
    /// happens afterwards on the calling thread.
    pub fn load_all(&self) -> FacilityData {
        let store = &self.store;
        let (shelter_rows, police_rows, hospital_rows) = std::thread::scope(|scope| {
            let shelters = scope.spawn(|| store.fetch_shelter_rows());
            let police = scope.spawn(|| store.fetch_police_rows());
            let hospitals = scope.spawn(|| store.fetch_hospital_rows());
            (
                join_fetch(shelters.join(), SHELTERS),
                join_fetch(police.join(), POLICE_STATIONS),
                join_fetch(hospitals.join(), HOSPITALS),
            )
        });

        FacilityData {
            shelters: assemble_shelters(shelter_rows, &self.transform),
            police_stations: stations_from_rows(
                police_rows,
                POLICE_STATIONS,
                police_station_from_row,
            ),
            hospitals: stations_from_rows(hospital_rows, HOSPITALS, hospital_from_row),
        }
    }
}

impl StoreClient {
    fn fetch_shelter_rows(&self) -> Result<Vec<ShelterRow>> {
        self.send(self.shelter_request(), SHELTERS)
    }

    fn fetch_police_rows(&self) -> Result<Vec<StationRow>> {
        self.send(self.table_request(&self.config.police_table), POLICE_STATIONS)
    }

    fn fetch_hospital_rows(&self) -> Result<Vec<StationRow>> {
        self.send(self.table_request(&self.config.hospital_table), HOSPITALS)
    }

    /// `POST {base}/rest/v1/rpc/{function}` with an empty JSON object
    fn shelter_request(&self) -> reqwest::Result<Request> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, self.config.shelters_rpc);
        self.authorized(self.client.post(url).json(&serde_json::json!({})))
            .build()
    }

    /// `GET {base}/rest/v1/{table}?select=*`
    fn table_request(&self, table: &str) -> reqwest::Result<Request> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.authorized(self.client.get(url).query(&[("select", "*")]))
            .build()
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::Result<Request>,
        dataset: &'static str,
    ) -> Result<Vec<T>> {
        let load_error = |reason: String| LocatorError::DataLoad { dataset, reason };

        let response = request
            .and_then(|request| self.client.execute(request))
            .map_err(|e| load_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(load_error(format!(
                "data store returned status {}",
                response.status()
            )));
        }

        let rows: Vec<T> = response.json().map_err(|e| load_error(e.to_string()))?;
        log::debug!("Fetched {} {} rows", rows.len(), dataset);
        Ok(rows)
    }
}

fn join_fetch<T>(joined: std::thread::Result<Result<Vec<T>>>, dataset: &'static str) -> Vec<T> {
    match joined {
        Ok(Ok(rows)) => rows,
        Ok(Err(e)) => {
            log::error!("{}", e);
            Vec::new()
        }
        Err(_) => {
            log::error!("Fetch worker for {} panicked", dataset);
            Vec::new()
        }
    }
}

/// Turn raw shelter rows into a collection with geographic positions.
///
/// Rows with malformed geometry or coordinates outside zone 33 are dropped
/// with an error log.
pub fn assemble_shelters(
    rows: Vec<ShelterRow>,
    transform: &CoordinateTransform,
) -> ShelterCollection {
    let total = rows.len();
    let mut collection = ShelterCollection::new();

    for row in rows {
        let [easting, northing] = match row.geom.coordinates.as_slice() {
            [e, n, ..] => [*e, *n],
            _ => {
                log::error!(
                    "Shelter {} has malformed {} geometry, skipping",
                    row.shelter_id,
                    row.geom.type_
                );
                continue;
            }
        };

        let location = match transform.to_geographic(ProjectedPoint::new(easting, northing)) {
            Ok(p) => p,
            Err(e) => {
                log::error!("Shelter {}: {}", row.shelter_id, e);
                continue;
            }
        };

        let shelter = Shelter {
            id: row.shelter_id,
            location,
            address: row.address,
            capacity: row.capacity,
            population_served: row.population,
            coverage_ratio: row.coverage_ratio,
        };
        if !collection.insert(shelter) {
            log::warn!("Duplicate shelter id {}, keeping first row", row.shelter_id);
        }
    }

    if collection.len() < total {
        log::warn!("Kept {} of {} shelter rows", collection.len(), total);
    }
    collection
}

fn stations_from_rows<T>(
    rows: Vec<StationRow>,
    dataset: &'static str,
    build: fn(StationRow, GeoPoint) -> T,
) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match GeoPoint::new(row.lon, row.lat) {
            Ok(location) => Some(build(row, location)),
            Err(e) => {
                log::error!("Skipping {} row {}: {}", dataset, row.id, e);
                None
            }
        })
        .collect()
}

fn police_station_from_row(row: StationRow, location: GeoPoint) -> PoliceStation {
    PoliceStation {
        id: row.id,
        name: row.name,
        phone: row.phone.filter(|p| !p.trim().is_empty()),
        location,
    }
}

fn hospital_from_row(row: StationRow, location: GeoPoint) -> Hospital {
    Hospital {
        id: row.id,
        name: row.name,
        phone: row.phone.filter(|p| !p.trim().is_empty()),
        location,
    }
}
