use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::region::DistrictCode;

const CONFIG_NAME: &str = "shelter-locator";

fn default_shelters_rpc() -> String {
    "get_shelters_with_population".to_string()
}
fn default_police_table() -> String {
    "politi_stasjoner".to_string()
}
fn default_hospital_table() -> String {
    "hospitals".to_string()
}
fn default_data_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataStoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_shelters_rpc")]
    pub shelters_rpc: String,
    #[serde(default = "default_police_table")]
    pub police_table: String,
    #[serde(default = "default_hospital_table")]
    pub hospital_table: String,
    #[serde(default = "default_data_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DataStoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            shelters_rpc: default_shelters_rpc(),
            police_table: default_police_table(),
            hospital_table: default_hospital_table(),
            timeout_secs: default_data_timeout_secs(),
        }
    }
}

fn default_directions_url() -> String {
    "https://api.mapbox.com/directions/v5/mapbox/walking".to_string()
}
fn default_directions_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct DirectionsConfig {
    #[serde(default = "default_directions_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_directions_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DirectionsConfig {
    fn default() -> Self {
        Self {
            base_url: default_directions_url(),
            access_token: None,
            timeout_secs: default_directions_timeout_secs(),
        }
    }
}

fn default_geocoder_url() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}
fn default_user_agent() -> String {
    format!("{}/{}", CONFIG_NAME, env!("CARGO_PKG_VERSION"))
}
fn default_geocoder_zoom() -> u8 {
    10
}
fn default_geocoder_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocoderConfig {
    #[serde(default = "default_geocoder_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocoder_zoom")]
    pub zoom: u8,
    #[serde(default = "default_geocoder_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            url: default_geocoder_url(),
            user_agent: default_user_agent(),
            zoom: default_geocoder_zoom(),
            timeout_secs: default_geocoder_timeout_secs(),
        }
    }
}

fn default_incidents_url() -> String {
    "https://api.politiet.no/politiloggen/v1/messages".to_string()
}
fn default_incidents_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct IncidentsConfig {
    #[serde(default = "default_incidents_url")]
    pub url: String,
    #[serde(default = "default_incidents_timeout_secs")]
    pub timeout_secs: u64,
    /// Leave the district out of the query when the county could not be mapped
    #[serde(default)]
    pub strict_districts: bool,
}

impl Default for IncidentsConfig {
    fn default() -> Self {
        Self {
            url: default_incidents_url(),
            timeout_secs: default_incidents_timeout_secs(),
            strict_districts: false,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct FileConfig {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub export: Option<PathBuf>,
    #[serde(default)]
    pub data_store: DataStoreConfig,
    #[serde(default)]
    pub directions: DirectionsConfig,
    #[serde(default)]
    pub geocoder: GeocoderConfig,
    #[serde(default)]
    pub incidents: IncidentsConfig,
    /// County name → district code, consulted before the built-in table
    #[serde(default)]
    pub districts: BTreeMap<String, DistrictCode>,
}

impl FileConfig {
    /// Search the standard locations and return the first config that parses
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => {
                        log::debug!("Loaded config from {}", path.display());
                        return Some(config);
                    }
                    Err(e) => {
                        log::warn!("Failed to parse config file {}: {}", path.display(), e);
                    }
                }
            }
        }
        None
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Fill secrets from the environment where the file left them out
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.data_store.url.is_none() {
            self.data_store.url = lookup("SUPABASE_URL");
        }
        if self.data_store.api_key.is_none() {
            self.data_store.api_key = lookup("SUPABASE_KEY");
        }
        if self.directions.access_token.is_none() {
            self.directions.access_token = lookup("MAPBOX_TOKEN");
        }
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from(format!("{}.toml", CONFIG_NAME)));
    paths.push(PathBuf::from(format!(".{}.toml", CONFIG_NAME)));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(CONFIG_NAME).join("config.toml"));
        paths.push(config_dir.join(format!("{}.toml", CONFIG_NAME)));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{}.toml", CONFIG_NAME)));
        paths.push(home.join(".config").join(CONFIG_NAME).join("config.toml"));
    }

    paths
}
