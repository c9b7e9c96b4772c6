use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossbeam_channel::Receiver;
use haulplan_app::{AppController, AppSettings, Dispatcher};
use haulplan_client::{HttpBackend, TripBackend};
use haulplan_core::{Coord, GeoPoint, LocationRole, TripId};
use haulplan_events::Event;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "haulplan", author, version, about = "Plan and inspect truck trips")]
struct Cli {
    /// Backend base URL, overrides the settings file
    #[arg(long, global = true)]
    api: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Plan a trip and print each leg as it is revealed
    Plan {
        /// `lat,lon[,label]`; without a label the place is reverse geocoded
        #[arg(long, value_parser = parse_location)]
        current: LocationArg,
        #[arg(long, value_parser = parse_location)]
        pickup: LocationArg,
        #[arg(long, value_parser = parse_location)]
        dropoff: LocationArg,
        /// Hours already used in the current 70-hour cycle
        #[arg(long, default_value_t = 0.0)]
        cycle_hours: f64,
    },
    /// Search for places by name
    Search { query: String },
    /// Look up the label for a coordinate
    Reverse {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },
    /// Generate log sheets for a planned trip
    Logs {
        trip_id: i64,
        /// Also download the PDF into this directory
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Print the effective settings
    Config {
        /// Write them to the settings file so later runs pick them up
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Clone)]
struct LocationArg {
    coord: Coord,
    label: Option<String>,
}

fn parse_location(raw: &str) -> Result<LocationArg, String> {
    let mut parts = raw.splitn(3, ',');
    let mut number = |name: &str| -> Result<f64, String> {
        parts
            .next()
            .map(str::trim)
            .ok_or_else(|| format!("missing {name}"))?
            .parse::<f64>()
            .map_err(|e| format!("invalid {name}: {e}"))
    };
    let lat = number("latitude")?;
    let lon = number("longitude")?;
    let coord = Coord::new(lat, lon);
    if !coord.is_finite() {
        return Err("coordinates must be finite".to_string());
    }
    let label = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    Ok(LocationArg { coord, label })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = AppSettings::load();
    if let Some(api) = cli.api {
        settings.api_base_url = api;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        settings.request_timeout_ms = timeout_ms;
    }

    let runtime = Runtime::new().context("Failed to start async runtime")?;

    match cli.command {
        Commands::Plan {
            current,
            pickup,
            dropoff,
            cycle_hours,
        } => plan(
            &runtime,
            backend(&settings)?,
            settings,
            [
                (LocationRole::Current, current),
                (LocationRole::Pickup, pickup),
                (LocationRole::Dropoff, dropoff),
            ],
            cycle_hours,
        ),
        Commands::Search { query } => {
            let results = runtime
                .block_on(backend(&settings)?.search(&query))
                .context("Search failed")?;
            if results.is_empty() {
                println!("No matches for {query:?}");
            }
            for result in results {
                match result.coord() {
                    Some(coord) => println!("{}  ({coord})", result.display_name),
                    None => println!("{}  (no coordinates)", result.display_name),
                }
            }
            Ok(())
        }
        Commands::Reverse { lat, lon } => {
            let found = runtime
                .block_on(backend(&settings)?.reverse(Coord::new(lat, lon)))
                .context("Reverse geocode failed")?;
            println!("{}", found.label());
            Ok(())
        }
        Commands::Logs { trip_id, pdf } => logs(
            &runtime,
            backend(&settings)?,
            settings,
            TripId(trip_id),
            pdf,
        ),
        Commands::Config { save } => {
            let json = serde_json::to_string_pretty(&settings)
                .context("Failed to serialize settings")?;
            println!("{json}");
            if save {
                let path = settings.save().context("Failed to save settings")?;
                println!("Saved to {}", path.display());
            }
            Ok(())
        }
    }
}

fn backend(settings: &AppSettings) -> Result<Arc<HttpBackend>> {
    let backend = HttpBackend::new(settings.api_base_url.clone(), settings.request_timeout())
        .with_context(|| format!("Invalid API URL {}", settings.api_base_url))?;
    Ok(Arc::new(backend))
}

fn controller(
    runtime: &Runtime,
    backend: Arc<HttpBackend>,
    settings: AppSettings,
) -> (AppController<Dispatcher>, Receiver<Event>) {
    let dispatcher = Dispatcher::new(runtime.handle().clone(), backend);
    let completions = dispatcher.completions();
    let app = AppController::new(settings, dispatcher, completions);
    let events = app.events();
    (app, events)
}

/// Pumps until nothing is pending, handing every event to `on_event`.
fn settle(
    app: &mut AppController<Dispatcher>,
    events: &Receiver<Event>,
    mut on_event: impl FnMut(&AppController<Dispatcher>, &Event),
) {
    loop {
        app.pump(Instant::now());
        for event in events.try_iter() {
            report(&event);
            on_event(&*app, &event);
        }
        if !app.is_busy() {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn report(event: &Event) {
    match event {
        Event::ShowError { message } => eprintln!("error: {message}"),
        Event::ShowWarning { message } => eprintln!("warning: {message}"),
        Event::ShowInfo { message } | Event::ShowSuccess { message } => println!("{message}"),
        _ => tracing::debug!(?event, "event"),
    }
}

fn plan(
    runtime: &Runtime,
    backend: Arc<HttpBackend>,
    settings: AppSettings,
    locations: [(LocationRole, LocationArg); 3],
    cycle_hours: f64,
) -> Result<()> {
    let (mut app, events) = controller(runtime, backend, settings);

    for (role, location) in locations {
        match location.label {
            Some(label) => {
                app.set_location(role, GeoPoint::at(label, location.coord));
            }
            None => {
                app.open_picker(role);
                app.picker_moved(location.coord);
                app.confirm_location();
                settle(&mut app, &events, |_, _| {});
            }
        }
        if let Some(point) = app.planner().locations().get(role) {
            println!("{:<8} {} ({})", role.as_str(), point.label, point.coord());
        }
    }

    app.set_cycle_hours(cycle_hours)?;
    app.submit_trip(Utc::now())?;
    settle(&mut app, &events, |app, event| {
        if let Event::LegRevealed { visible, .. } = event {
            if let Some(leg) = app.view().visible_legs().get(visible - 1) {
                println!(
                    "{:>3}. {:<8} {:>10} {:>10}  {}",
                    leg.id.0 + 1,
                    leg.leg_type.as_str(),
                    leg.duration_label(),
                    leg.distance_label(),
                    leg.popup_text()
                );
            }
        }
    });

    let Some(trip) = app.planner().planned() else {
        bail!("Trip planning failed");
    };
    if let Some(summary) = app.view().summary() {
        println!("Trip {trip}: {}", summary.headline());
    }
    Ok(())
}

fn logs(
    runtime: &Runtime,
    backend: Arc<HttpBackend>,
    settings: AppSettings,
    trip: TripId,
    pdf_dir: Option<PathBuf>,
) -> Result<()> {
    let (mut app, events) = controller(runtime, backend, settings);
    app.request_logs(trip);
    if pdf_dir.is_some() {
        app.download_logs(trip);
    }
    settle(&mut app, &events, |_, _| {});

    if app.logs().trip() != Some(trip) {
        bail!("Could not load log sheets for trip {trip}");
    }
    for url in app.logs().svg_urls() {
        println!("{url}");
    }

    if let Some(dir) = pdf_dir {
        let Some(pdf) = app.take_pdf() else {
            bail!("Could not download logs for trip {trip}");
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(&pdf.file_name);
        std::fs::write(&path, &pdf.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Saved {}", path.display());
    }
    Ok(())
}
