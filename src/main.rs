use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use shelter_locator::api::{
    FacilityData, FacilityDataGateway, Geocoder, IncidentClient, RouteGateway, RouteSource,
};
use shelter_locator::config::FileConfig;
use shelter_locator::domain::{FacilityRef, GeoPoint, RouteGeometry};
use shelter_locator::error::LocatorError;
use shelter_locator::geometry::CoordinateTransform;
use shelter_locator::map::{LogSurface, MapEvent, Selection, Session, write_geojson};
use shelter_locator::region::{IncidentFilter, RegionMapper};

/// Find the nearest emergency shelter and the walking route to it
///
/// Examples:
///   # Nearest shelter from a position in central Oslo
///   shelter-locator --lat 59.91 --lon 10.75
///
///   # Follow a moving position, then pick the nearest police station instead
///   shelter-locator --track 59.91,10.75 --track 59.915,10.755 --select police:12
///
///   # Show local police incidents and save the map as GeoJSON
///   shelter-locator --lat 63.43 --lon 10.39 --incidents --export map.geojson
#[derive(Parser, Debug)]
#[command(name = "shelter-locator")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches shelter-locator.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Latitude of the user position (use with --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the user position (use with --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Additional position fix as LAT,LON; repeat to simulate movement
    #[arg(long, value_parser = parse_lat_lon, allow_hyphen_values = true)]
    track: Vec<GeoPoint>,

    /// Click a facility, e.g. shelter:42, police:3, hospital:7; repeatable
    #[arg(long)]
    select: Vec<FacilityRef>,

    /// Stop location tracking after all fixes and clicks
    #[arg(long)]
    end_tracking: bool,

    /// Fetch police incident messages for the user's district
    #[arg(long)]
    incidents: bool,

    /// Write the final map state as a GeoJSON FeatureCollection
    #[arg(long)]
    export: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn parse_lat_lon(s: &str) -> std::result::Result<GeoPoint, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{}'", s))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude '{}'", lat))?;
    let lon: f64 = lon.trim().parse().map_err(|_| format!("invalid longitude '{}'", lon))?;
    GeoPoint::from_lat_lon(lat, lon).map_err(|e| e.to_string())
}

/// Stand-in route source when no directions token is configured
struct NoRoutes;

impl RouteSource for NoRoutes {
    fn fetch_walking_route(&self, _start: GeoPoint, _end: GeoPoint) -> Option<RouteGeometry> {
        None
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    let mut config = match args.config {
        Some(ref path) => {
            if !path.exists() {
                bail!("Config file not found: {:?}", path);
            }
            FileConfig::from_path(path)?
        }
        None => FileConfig::load().unwrap_or_default(),
    };
    config.apply_env();

    let verbose = args.verbose || config.verbose;
    init_logging(verbose);

    let mut fixes = Vec::new();
    let lat = args.lat.or(config.lat);
    let lon = args.lon.or(config.lon);
    if let (Some(lat), Some(lon)) = (lat, lon) {
        fixes.push(GeoPoint::from_lat_lon(lat, lon).context("Invalid --lat/--lon")?);
    }
    fixes.extend(args.track.iter().copied());
    let export = args.export.clone().or_else(|| config.export.clone());

    println!("shelter-locator");
    println!("===============");
    println!();

    let transform = CoordinateTransform::new().context("Failed to set up coordinate transform")?;

    let spinner = create_spinner("Loading shelters, police stations and hospitals...");
    let start = Instant::now();
    let data = match FacilityDataGateway::new(&config.data_store, transform) {
        Ok(gateway) => gateway.load_all(),
        Err(e) => {
            log::warn!("{}", e);
            FacilityData::default()
        }
    };
    spinner.finish_with_message(format!(
        "Loaded {} shelters, {} police stations, {} hospitals [{:.1}s]",
        data.shelters.len(),
        data.police_stations.len(),
        data.hospitals.len(),
        start.elapsed().as_secs_f32()
    ));

    let routes: Arc<dyn RouteSource> = match RouteGateway::new(&config.directions) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            log::warn!("{}; routes will not be drawn", e);
            Arc::new(NoRoutes)
        }
    };

    let mut session = Session::new(routes, LogSurface);
    session.load(data);

    if fixes.is_empty() {
        log::warn!("{}", LocatorError::GeolocationUnavailable);
    }
    for fix in &fixes {
        session.submit(MapEvent::LocationFixed(*fix));
        session.process_pending();
    }

    for facility in &args.select {
        session.click(*facility);
        session.process_pending();
    }

    let spinner = create_spinner("Waiting for walking route...");
    let start = Instant::now();
    let settled = session.run_until_idle();
    let route_points = session.state().route().map(|r| r.points().len());
    spinner.finish_with_message(match (settled, route_points) {
        (_, Some(n)) => format!(
            "Route with {} points [{:.1}s]",
            n,
            start.elapsed().as_secs_f32()
        ),
        (true, None) => "No route".to_string(),
        (false, None) => "Route timed out".to_string(),
    });

    let last_position = session.state().user_location();

    if args.end_tracking {
        session.submit(MapEvent::TrackingEnded);
        session.process_pending();
    }

    println!();
    print_selection(&session);

    if args.incidents {
        match last_position {
            Some(position) => print_incidents(&config, position)?,
            None => log::warn!(
                "Incidents need a position: {}",
                LocatorError::GeolocationUnavailable
            ),
        }
    }

    if let Some(ref path) = export {
        write_geojson(session.state(), path).context("Failed to write GeoJSON export")?;
        println!("Map exported to {}", path.display());
    }

    println!();
    println!("Done in {:.1}s", total_start.elapsed().as_secs_f32());

    Ok(())
}

fn print_selection(session: &Session<LogSurface>) {
    let state = session.state();
    println!("Phase: {:?}", state.phase());

    match state.selection() {
        Selection::None => println!("Nothing selected"),
        Selection::Shelter(s) => {
            println!("Shelter #{}: {}", s.id, s.address);
            println!("  Capacity: {} places", s.capacity);
            if let Some(population) = s.population_served {
                println!("  Population in area: {}", population);
            }
            if let Some(ratio) = s.coverage_ratio {
                let note = if s.is_under_provisioned() { " (under capacity)" } else { "" };
                println!("  Coverage: {:.0}%{}", ratio, note);
            }
        }
        Selection::PoliceStation(p) => {
            println!("Police station #{}: {}", p.id, p.name);
            if let Some(ref phone) = p.phone {
                println!("  Phone: {}", phone);
            }
        }
        Selection::Hospital(h) => {
            println!("Hospital #{}: {}", h.id, h.name);
            if let Some(ref phone) = h.phone {
                println!("  Phone: {}", phone);
            }
        }
    }

    if let Some(travel) = state.travel() {
        println!(
            "  Distance: {:.2} km, about {} min on foot",
            travel.distance_km,
            travel.rounded_minutes()
        );
    }
}

fn print_incidents(config: &FileConfig, position: GeoPoint) -> Result<()> {
    let spinner = create_spinner("Resolving police district...");
    let geocoder = Geocoder::new(&config.geocoder)?;
    let region = geocoder.reverse(position);

    let mapper = RegionMapper::with_overrides(&config.districts);
    let district = region
        .county
        .as_deref()
        .map(|county| mapper.map_county_to_district(county));
    let filter = IncidentFilter::new(
        district.as_ref(),
        region.municipality.as_deref(),
        config.incidents.strict_districts,
    );
    spinner.finish_with_message(format!(
        "District: {}, municipality: {}",
        filter.district.as_deref().unwrap_or("-"),
        filter.municipality.as_deref().unwrap_or("-")
    ));

    if filter.is_empty() {
        log::warn!("No district or municipality for this position, showing all incidents");
    }

    let client = IncidentClient::new(&config.incidents)?;
    let messages = match client.fetch(&filter) {
        Ok(messages) => messages,
        Err(e) => {
            log::warn!("{}", e);
            return Ok(());
        }
    };

    println!();
    println!("Police log ({} messages)", messages.len());
    for message in messages.iter().take(10) {
        let marker = if message.is_active { "*" } else { " " };
        println!(
            "{} [{}] {} {}: {}",
            marker, message.created_on, message.category, message.municipality, message.text
        );
    }

    Ok(())
}

/// Level used when `RUST_LOG` does not say otherwise
fn default_log_level(verbose: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

fn init_logging(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(default_log_level(verbose));
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
