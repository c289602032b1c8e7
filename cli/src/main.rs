mod config;
#[cfg(feature = "os-hotkeys")]
mod hook;
mod logging;
mod sound;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use shinycount_core::{
    Count, DataPaths, DetachedHook, Engine, EngineOptions, HotkeyBinding, HttpSource, HuntMode,
    KeyHook, KeySymbol, LaneId, LaneUpdate,
};
use shinycount_core::hotkeys::UNBOUND;
use shinycount_types::AppConfig;

use crate::sound::ClickSound;

#[derive(Parser)]
#[command(version, about = "Encounter counter with global hotkeys")]
struct Cli {
    /// Data directory (catalog, progress, lane state, hotkeys, logs)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count with global hotkeys until Ctrl+C
    Run {
        /// Two lanes: main key counts lane 2, secondary key lane 1
        #[arg(long)]
        dual: bool,
    },
    /// Show the lanes and the hotkey binding
    Status,
    /// Bind an entry to a lane and list its variants
    Select {
        entry: String,
        #[arg(long, default_value = "1", value_parser = parse_lane)]
        lane: LaneId,
    },
    /// List the variants of the lane's entry
    Variants {
        #[arg(long, default_value = "1", value_parser = parse_lane)]
        lane: LaneId,
    },
    /// Pick a variant by label ("<game>: <name>")
    Variant {
        label: String,
        #[arg(long, default_value = "1", value_parser = parse_lane)]
        lane: LaneId,
    },
    Inc {
        #[arg(long, default_value = "1", value_parser = parse_lane)]
        lane: LaneId,
    },
    Dec {
        #[arg(long, default_value = "1", value_parser = parse_lane)]
        lane: LaneId,
    },
    /// Set the counter (0 - 999999)
    Set {
        value: Count,
        #[arg(long, default_value = "1", value_parser = parse_lane)]
        lane: LaneId,
    },
    /// Show or change the hotkeys
    Hotkeys {
        #[arg(long)]
        primary: Option<KeySymbol>,
        /// Key name, or "None" to unbind
        #[arg(long)]
        secondary: Option<String>,
    },
    /// List key names usable as hotkeys
    Keys,
    /// Download the catalog from the generation API
    RefreshCatalog,
    /// Catalog entries starting with a prefix
    Search { prefix: String },
}

fn parse_lane(s: &str) -> Result<LaneId, String> {
    s.parse::<u8>()
        .ok()
        .and_then(LaneId::from_number)
        .ok_or_else(|| format!("lane must be 1 or 2, got '{s}'"))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();
    let config = config::load_config();
    let paths = DataPaths::new(config::resolve_data_dir(cli.data_dir.as_deref(), &config));
    let _guard = logging::init_logging(&paths.logs());

    tracing::debug!(config = ?config::config_path(), data_dir = ?paths.root(), "Starting");

    if let Commands::Keys = cli.command {
        for key in KeySymbol::ALL {
            println!("{key}");
        }
        return Ok(());
    }

    let source = Arc::new(HttpSource::new(&config.remote).map_err(|e| e.to_string())?);

    match cli.command {
        Commands::Run { dual } => {
            #[cfg(feature = "os-hotkeys")]
            let hook = hook::GlobalKeyHook::new();
            #[cfg(not(feature = "os-hotkeys"))]
            let hook = DetachedHook;
            run(paths, source, hook, &config, dual).await
        }
        command => {
            let (mut engine, _rx) =
                Engine::open(paths, source.clone(), DetachedHook, EngineOptions::from(&config));
            let result = respond(command, &mut engine, &source).await;
            print_notices(&mut engine);
            engine.shutdown();
            result
        }
    }
}

async fn run<H: KeyHook>(
    paths: DataPaths,
    source: Arc<HttpSource>,
    hook: H,
    config: &AppConfig,
    dual: bool,
) -> Result<(), String> {
    let click = ClickSound::new(&config.sound, paths.root());
    let (mut engine, mut rx) = Engine::open(paths, source, hook, EngineOptions::from(config));
    if dual {
        engine.set_mode(HuntMode::Dual);
    }

    print_notices(&mut engine);
    print_status(&engine);
    println!("Counting. Press Ctrl+C to stop.");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };
    engine
        .run_hotkeys(&mut rx, shutdown, |update| {
            if update.feedback {
                click.play();
            }
            print_update(update);
        })
        .await;

    engine.shutdown();
    Ok(())
}

async fn respond<H: KeyHook>(
    command: Commands,
    engine: &mut Engine<HttpSource, H>,
    source: &HttpSource,
) -> Result<(), String> {
    match command {
        Commands::Run { .. } | Commands::Keys => Ok(()),
        Commands::Status => {
            print_status(engine);
            Ok(())
        }
        Commands::Select { entry, lane } => {
            activate(engine, lane);
            let (update, listing) = engine.select_entry(lane, &entry).await.map_err(|e| e.to_string())?;
            print_update(&update);
            for variant in &listing.variants {
                println!("  {}", variant.label);
            }
            Ok(())
        }
        Commands::Variants { lane } => {
            activate(engine, lane);
            let listing = engine.refresh_variants(lane).await.map_err(|e| e.to_string())?;
            for variant in &listing.variants {
                println!("{}", variant.label);
            }
            Ok(())
        }
        Commands::Variant { label, lane } => {
            activate(engine, lane);
            let image = engine
                .select_variant(lane, &label)
                .await
                .map_err(|e| e.to_string())?;
            println!("{lane}: {} ({}x{})", image.label, image.width, image.height);
            Ok(())
        }
        Commands::Inc { lane } => {
            activate(engine, lane);
            print_update(&engine.increment(lane).map_err(|e| e.to_string())?);
            Ok(())
        }
        Commands::Dec { lane } => {
            activate(engine, lane);
            print_update(&engine.decrement(lane).map_err(|e| e.to_string())?);
            Ok(())
        }
        Commands::Set { value, lane } => {
            activate(engine, lane);
            print_update(&engine.set_value(lane, value).map_err(|e| e.to_string())?);
            Ok(())
        }
        Commands::Hotkeys { primary, secondary } => {
            if primary.is_none() && secondary.is_none() {
                print_binding(engine.binding());
                return Ok(());
            }

            let current = *engine.binding();
            let secondary = match secondary.as_deref().map(str::trim) {
                None => current.secondary,
                Some(UNBOUND) => None,
                Some(name) => Some(name.parse::<KeySymbol>().map_err(|e| e.to_string())?),
            };
            let binding = HotkeyBinding::new(primary.unwrap_or(current.primary), secondary);
            engine.rebind(binding).map_err(|e| e.to_string())?;
            print_binding(&binding);
            Ok(())
        }
        Commands::RefreshCatalog => {
            let entries = engine
                .refresh_catalog(source)
                .await
                .map_err(|e| e.to_string())?;
            println!("Catalog refreshed: {entries} entries");
            Ok(())
        }
        Commands::Search { prefix } => {
            for name in engine.catalog().search(&prefix) {
                println!("{name}");
            }
            Ok(())
        }
    }
}

/// Lane 2 only exists in dual mode; bring it up for one-off commands.
fn activate<H: KeyHook>(engine: &mut Engine<HttpSource, H>, lane: LaneId) {
    if lane == LaneId::Secondary && engine.lane(lane).is_none() {
        engine.set_mode(HuntMode::Dual);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_update(update: &LaneUpdate) {
    let entry = update.entry.as_deref().unwrap_or("-");
    match update.bound {
        Some(bound) if !update.changed() => {
            println!("{} {entry}: {} (at {bound:?})", update.lane, update.value)
        }
        _ => println!("{} {entry}: {} -> {}", update.lane, update.previous, update.value),
    }
}

fn print_status<H: KeyHook>(engine: &Engine<HttpSource, H>) {
    println!("mode: {:?}, catalog: {} entries", engine.mode(), engine.catalog().len());
    for lane in engine.lanes() {
        println!(
            "{}: {} [{}] {}",
            lane.id(),
            lane.entry().unwrap_or("-"),
            lane.variant().unwrap_or("-"),
            lane.value()
        );
    }
    print_binding(engine.binding());
}

fn print_binding(binding: &HotkeyBinding) {
    println!(
        "hotkeys: main {}, secondary {}",
        binding.primary,
        binding.secondary.map_or(UNBOUND, KeySymbol::name)
    );
}

fn print_notices<H: KeyHook>(engine: &mut Engine<HttpSource, H>) {
    for notice in engine.take_notices() {
        eprintln!("{notice}");
    }
}
