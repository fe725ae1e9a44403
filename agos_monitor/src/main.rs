use agos_monitor::config::{AppConfig, StoreBackend};
use agos_monitor::gauges::RefreshOutcome;
use agos_monitor::location::{CenterSource, LocationProvider, StaticLocation};
use agos_monitor::logging::{self, Component};
use agos_monitor::model::Coordinate;
use agos_monitor::screens::{APP_NAME, App, TAGLINE};
use agos_monitor::store::{self, GaugeStore};
use agos_monitor::verify;
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "agos")]
#[command(about = "Agos water level monitoring client")]
struct Cli {
    /// Config file (defaults to ./agos.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Use the built-in demo gauges instead of the configured store
    #[arg(long, global = true, default_value_t = false)]
    demo: bool,
    /// Device latitude reported to the app
    #[arg(long, global = true, allow_hyphen_values = true, requires = "fix_lon")]
    fix_lat: Option<f64>,
    /// Device longitude reported to the app
    #[arg(long, global = true, allow_hyphen_values = true, requires = "fix_lat")]
    fix_lon: Option<f64>,
    /// Refuse location permission
    #[arg(long, global = true, default_value_t = false)]
    deny_location: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the landing screen
    Landing,
    /// Show the map: centre, gauge markers and status bar
    Map {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Register a new gauge device
    Add {
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, allow_hyphen_values = true, default_value = "")]
        lat: String,
        #[arg(long, allow_hyphen_values = true, default_value = "")]
        lon: String,
        /// Fill coordinates from the device position
        #[arg(long, default_value_t = false)]
        here: bool,
    },
    /// Check the store is reachable and audit its rows
    Verify {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn location_provider(cli: &Cli) -> Box<dyn LocationProvider> {
    if cli.deny_location {
        return Box::new(StaticLocation::denied());
    }
    match (cli.fix_lat, cli.fix_lon) {
        (Some(lat), Some(lon)) => Box::new(StaticLocation::granted(Coordinate::new(lat, lon))),
        _ => Box::new(StaticLocation::unavailable()),
    }
}

fn flush_notices(app: &mut App) {
    for notice in app.take_notices() {
        println!("[{}] {}", notice.title, notice.message);
    }
}

fn print_map(app: &App) {
    let map = app.map();
    if let Some(region) = map.region() {
        let source = match region.center.source {
            CenterSource::Device => "device",
            CenterSource::Fallback => "fallback",
        };
        println!(
            "🌊 {} - Water Monitoring   centre {} ({}), span {}°",
            APP_NAME, region.center.coordinate, source, region.latitude_delta
        );
    }
    println!();

    for marker in map.markers() {
        let fill = map
            .gauges()
            .iter()
            .find(|g| g.id == marker.id)
            .and_then(|g| g.fill_ratio())
            .map(|r| format!("{:>4.0}%", r * 100.0))
            .unwrap_or_else(|| "   -".to_string());
        println!(
            "  ● {:<6} {:<28} {:<16} {}  @ {}",
            marker.color.to_string(),
            marker.title,
            marker.subtitle,
            fill,
            marker.coordinate
        );
    }

    let summary = map.summary();
    println!();
    println!("  {}  |  💧 {}", summary.headline(), summary.sensors_label());
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    if cli.demo {
        config.store.backend = StoreBackend::Demo;
    }

    logging::init_logger(
        config.logging.min_level(),
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );

    let store: Box<dyn GaugeStore> = store::open_store(&config.store)?;
    logging::debug(Component::System, None, &format!("Using store: {}", store.describe()));

    match cli.command {
        Command::Landing => {
            let count = store.select_all().map(|rows| rows.len());
            println!("🌊 {}", APP_NAME);
            println!("{}", TAGLINE);
            println!();
            match count {
                Ok(n) => {
                    println!("{} Active Sensors", n);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    println!("Sensor count unavailable: {}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Command::Map { json } => {
            let mut app = App::new(&config, store, location_provider(&cli));
            let outcome = app.open_map();
            flush_notices(&mut app);
            // Nothing was read, so there is no map to show.
            if let RefreshOutcome::Failed(_) = outcome {
                return Ok(ExitCode::FAILURE);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&app.map().markers())?);
            } else {
                print_map(&app);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Add {
            ref name,
            ref location,
            ref lat,
            ref lon,
            here,
        } => {
            let mut app = App::new(&config, store, location_provider(&cli));
            app.open_map();
            app.open_add_device();
            if let Some(form) = app.add_device_mut() {
                form.draft.name = name.clone();
                form.draft.location = location.clone();
                form.draft.latitude = lat.clone();
                form.draft.longitude = lon.clone();
            }
            if here && app.capture_location().is_err() {
                flush_notices(&mut app);
                return Ok(ExitCode::FAILURE);
            }

            let result = app.submit_device();
            flush_notices(&mut app);
            match result {
                Ok(record) => {
                    println!("Added {} (id {})", record.name, record.id);
                    println!();
                    print_map(&app);
                    Ok(ExitCode::SUCCESS)
                }
                Err(_) => Ok(ExitCode::FAILURE),
            }
        }
        Command::Verify { json } => {
            let report = verify::verify_store(store.as_ref());
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                verify::print_summary(&report);
            }
            Ok(if report.reachable {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("agos: {}", e);
            ExitCode::FAILURE
        }
    }
}
