use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use glam::Vec2;
use mekanix_common::View;
use mekanix_input::PointerEvent;
use mekanix_kernel::{Level, presets};
use mekanix_persist::{LevelDocument, Snapshot};
use mekanix_render::{DebugTextRenderer, Renderer};
use mekanix_session::{MekanixConfig, ReturnPolicy, Session, SessionEvent};
use mekanix_tools::{LevelInspector, WorldInspector};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mekanix-cli", about = "CLI for mekanix levels")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file; missing keys keep their defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LevelArgs {
    /// Built-in level to start from
    #[arg(long, default_value = "default")]
    preset: String,
    /// Level document (JSON) to load instead of a preset
    #[arg(long, conflicts_with = "preset")]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, presets, and a summary of a level
    Info {
        #[command(flatten)]
        level: LevelArgs,
        /// Also list every entity
        #[arg(long)]
        entities: bool,
    },
    /// Run a level headless and report the outcome
    Simulate {
        #[command(flatten)]
        level: LevelArgs,
        /// Number of physics steps
        #[arg(short, long, default_value = "600")]
        ticks: u32,
        /// Toggle the control input every N steps (0 = never press)
        #[arg(long, default_value = "30")]
        pulse: u32,
        /// Return to edit with the simulated poses
        #[arg(long)]
        keep_simulated: bool,
    },
    /// Snapshot a level, restore it, and check nothing changed
    Roundtrip {
        #[command(flatten)]
        level: LevelArgs,
    },
    /// Write a level as a JSON document
    Export {
        #[command(flatten)]
        level: LevelArgs,
        /// Output path; stdout if omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print a text rendering of a level, optionally after simulating
    Render {
        #[command(flatten)]
        level: LevelArgs,
        /// Physics steps to run before rendering (0 = edit view)
        #[arg(short, long, default_value = "0")]
        ticks: u32,
        /// Window size the view is fitted to
        #[arg(long, default_value = "720")]
        width: f32,
        #[arg(long, default_value = "1280")]
        height: f32,
    },
    /// Print the effective configuration as YAML
    Config,
}

fn load_level(args: &LevelArgs) -> anyhow::Result<Level> {
    match &args.file {
        Some(path) => load_document(path),
        None => match presets::preset(&args.preset) {
            Some(level) => Ok(level),
            None => bail!(
                "unknown preset '{}', expected one of: {}",
                args.preset,
                presets::PRESET_NAMES.join(", ")
            ),
        },
    }
}

fn load_document(path: &Path) -> anyhow::Result<Level> {
    let doc = LevelDocument::load(path)
        .with_context(|| format!("loading level document {}", path.display()))?;
    Ok(doc.into_level())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MekanixConfig> {
    match path {
        Some(path) => MekanixConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(MekanixConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { level, entities } => {
            println!("mekanix-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("presets: {}", presets::PRESET_NAMES.join(", "));
            let level = load_level(&level)?;
            println!("{}", LevelInspector::summary(&level));
            if entities {
                for (id, _) in LevelInspector::list_entities(&level) {
                    if let Some(info) = LevelInspector::inspect_entity(&level, id) {
                        println!("  {info}");
                    }
                }
            }
        }
        Commands::Simulate {
            level,
            ticks,
            pulse,
            keep_simulated,
        } => {
            if keep_simulated {
                config.session.return_policy = ReturnPolicy::KeepSimulated;
            }
            let dt = config.session.fixed_dt;
            let level = load_level(&level)?;
            let ids_before = level.entity_ids();
            let mut session = Session::new(level, config);
            session.enter_play()?;

            let mut held = false;
            for tick in 0..ticks {
                if pulse > 0 && tick % pulse == 0 {
                    held = !held;
                    let event = if held {
                        PointerEvent::down(Vec2::ZERO)
                    } else {
                        PointerEvent::up(Vec2::ZERO)
                    };
                    session.pointer(event)?;
                }
                session.advance(dt);
                for event in session.drain_events() {
                    if event == SessionEvent::LevelWon {
                        println!("Level won at step {}", tick + 1);
                    }
                }
            }
            if let Some(world) = session.world() {
                println!("{}", WorldInspector::summary(world));
            }

            session.enter_edit()?;
            let ids_after = session
                .level()
                .map(Level::entity_ids)
                .unwrap_or_default();
            println!(
                "Return to edit: ids {}",
                if ids_before == ids_after { "OK" } else { "MISMATCH" }
            );
        }
        Commands::Roundtrip { level } => {
            let level = load_level(&level)?;
            let snap = Snapshot::capture(&level)?;
            println!(
                "Snapshot {}: level='{}' bytes={} sha256={} valid={}",
                snap.id(),
                snap.level_name(),
                snap.len(),
                snap.hash(),
                snap.verify()
            );
            let restored = snap.restore()?;
            let same = restored == level && restored.next_id() == level.next_id();
            println!("Restore: {}", if same { "OK" } else { "MISMATCH" });
            if !same {
                bail!("restored level differs from the original");
            }
        }
        Commands::Export { level, out } => {
            let level = load_level(&level)?;
            let doc = LevelDocument::new(level);
            match out {
                Some(path) => {
                    doc.save(&path)?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", doc.to_json()?),
            }
        }
        Commands::Render {
            level,
            ticks,
            width,
            height,
        } => {
            let dt = config.session.fixed_dt;
            let level = load_level(&level)?;
            let view = View::fit(width, height);
            let mut session = Session::new(level, config);
            session.set_view_scale(view.view_scale());
            if ticks > 0 {
                session.enter_play()?;
                for _ in 0..ticks {
                    session.advance(dt);
                }
            }
            let frame = session.frame();
            print!("{}", DebugTextRenderer::new().render(&frame, &view));
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
