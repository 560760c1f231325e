//! Starchart - Operator Tools

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use starchart_core::combat::CombatMetrics;
use starchart_core::history::LookupMode;
use starchart_core::keys::{ClusterKey, GalaxyKey, PlanetKey};
use starchart_core::universe::Universe;
use starchart_tools::report::{self, ArchiveSummary, RecordReport, SnapshotReport, TargetReport};
use starchart_tools::{validate, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "starchart-tools")]
#[command(about = "Operator tools for the Starchart universe store")]
struct Cli {
    /// Universe archive to operate on
    #[arg(long, global = true, default_value = "starchart.bin")]
    archive: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Exact,
    Closest,
}

impl From<Mode> for LookupMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Exact => Self::Exact,
            Mode::Closest => Self::Closest,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a constants file
    Validate {
        /// Path to the RON constants file
        #[arg(default_value = "config/starchart.ron")]
        config: PathBuf,
    },
    /// Ingest a JSON tick dump into the archive
    Ingest {
        /// Path to the tick dump
        dump: PathBuf,
        /// Only check the dump, do not write
        #[arg(long)]
        dry_run: bool,
    },
    /// Summarize the archive
    Inspect,
    /// Resolve a cluster (`x`), galaxy (`x:y`) or planet (`x:y:z`)
    Lookup {
        /// Coordinates in colon notation
        coords: String,
        /// Resolve a snapshot near this tick instead of the current record
        #[arg(long)]
        tick: Option<u32>,
        /// Snapshot lookup mode
        #[arg(long, value_enum, default_value = "closest")]
        mode: Mode,
        /// Allow retired entities
        #[arg(long)]
        include_retired: bool,
    },
    /// Find an alliance by name or alias
    Alliance {
        /// Search text
        query: String,
        /// Only accept an exact name match
        #[arg(long)]
        exact: bool,
        /// Allow retired alliances
        #[arg(long)]
        include_retired: bool,
    },
    /// Attack metrics from one planet against another
    Target {
        /// Attacking planet (`x:y:z`)
        attacker: PlanetKey,
        /// Target planet (`x:y:z`)
        target: PlanetKey,
        /// Path to the RON constants file
        #[arg(long, default_value = "config/starchart.ron")]
        config: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli.archive, cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn open(archive: &Path) -> Result<Universe> {
    if archive.exists() {
        Ok(Universe::load(archive)?)
    } else {
        tracing::info!(path = %archive.display(), "No archive yet, starting empty");
        Ok(Universe::new())
    }
}

fn run(archive: &Path, command: Commands) -> Result<()> {
    match command {
        Commands::Validate { config } => {
            tracing::info!("Validating constants in: {}", config.display());
            let constants = validate::validate_config(&config)?;
            println!("{}", report::to_json(&constants)?);
        }
        Commands::Ingest { dump, dry_run } => {
            let mut universe = open(archive)?;
            let dump = validate::read_dump(&dump)?;
            if dry_run {
                validate::validate_dump(&universe, &dump)?;
            } else {
                let summary = universe.ingest(dump)?;
                universe.save(archive)?;
                println!("{}", report::to_json(&summary)?);
            }
        }
        Commands::Inspect => {
            let universe = Universe::load(archive)?;
            println!("{}", report::to_json(&ArchiveSummary::of(&universe))?);
            if let Some(tick) = universe.clock().current_tick() {
                if let Some(line) = universe.clock().describe(tick, chrono::Utc::now()) {
                    println!("{line}");
                }
            }
        }
        Commands::Lookup {
            coords,
            tick,
            mode,
            include_retired,
        } => {
            let universe = Universe::load(archive)?;
            let require_active = !include_retired;
            let out = match coords.matches(':').count() {
                0 => lookup_cluster(&universe, coords.parse()?, tick, mode.into(), require_active)?,
                1 => lookup_galaxy(&universe, coords.parse()?, tick, mode.into(), require_active)?,
                _ => lookup_planet(&universe, coords.parse()?, tick, mode.into(), require_active)?,
            };
            println!("{out}");
        }
        Commands::Alliance {
            query,
            exact,
            include_retired,
        } => {
            let universe = Universe::load(archive)?;
            let record = universe.alliances().search(&query, !include_retired, exact)?;
            let line = record.state.to_string();
            println!("{}", report::to_json(&RecordReport::of(&universe, record, line))?);
        }
        Commands::Target {
            attacker,
            target,
            config,
        } => {
            let constants = validate::validate_config(&config)?;
            let universe = Universe::load(archive)?;
            let planets = universe.planets();
            let attacker_record = planets.load_by_key(&attacker, true)?;
            let target_record = planets.load_by_key(&target, true)?;
            let metrics = CombatMetrics::new(constants.capture);
            let out = TargetReport::compute(
                &metrics,
                (attacker_record, attacker_record.state.to_string()),
                (target_record, target_record.state.to_string()),
            )?;
            println!("{}", report::to_json(&out)?);
        }
    }
    Ok(())
}

fn lookup_cluster(
    universe: &Universe,
    key: ClusterKey,
    tick: Option<u32>,
    mode: LookupMode,
    require_active: bool,
) -> Result<String> {
    let repo = universe.clusters();
    match tick {
        Some(tick) => {
            let snapshot = repo.load_snapshot(&key, tick, mode, require_active)?;
            let active = snapshot.has_active_owner(repo.catalog());
            report::to_json(&SnapshotReport::of(snapshot, tick, active))
        }
        None => {
            let record = repo.load_by_key(&key, require_active)?;
            let line = format!("{} {}", key, record.state.stats.headline());
            report::to_json(&RecordReport::of(universe, record, line))
        }
    }
}

fn lookup_galaxy(
    universe: &Universe,
    key: GalaxyKey,
    tick: Option<u32>,
    mode: LookupMode,
    require_active: bool,
) -> Result<String> {
    let repo = universe.galaxies();
    match tick {
        Some(tick) => {
            let snapshot = repo.load_snapshot(&key, tick, mode, require_active)?;
            let active = snapshot.has_active_owner(repo.catalog());
            report::to_json(&SnapshotReport::of(snapshot, tick, active))
        }
        None => {
            let record = repo.load_by_key(&key, require_active)?;
            let line = universe.describe_galaxy(key, require_active)?;
            report::to_json(&RecordReport::of(universe, record, line))
        }
    }
}

fn lookup_planet(
    universe: &Universe,
    key: PlanetKey,
    tick: Option<u32>,
    mode: LookupMode,
    require_active: bool,
) -> Result<String> {
    let repo = universe.planets();
    match tick {
        Some(tick) => {
            let snapshot = repo.load_snapshot(&key, tick, mode, require_active)?;
            let active = snapshot.has_active_owner(repo.catalog());
            report::to_json(&SnapshotReport::of(snapshot, tick, active))
        }
        None => {
            let record = repo.load_by_key(&key, require_active)?;
            let line = format!(
                "{} Exiles: {}",
                record.state,
                universe.ledger().relocation_count(&record.state.id)
            );
            report::to_json(&RecordReport::of(universe, record, line))
        }
    }
}
