//! Command-line shell for the invasion simulator.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossbeam_channel::select;
use invasion_core::{AlienProfile, CityMap, SimConfig};
use invasion_monitor::LogListener;
use invasion_sim::{cancel_pair, CancelHandle, Simulation};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "invasion",
    version,
    about = "Simulates an alien invasion over a map of linked cities"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the simulation engine.
    Start {
        /// Map file path.
        #[arg(long, short = 'm', default_value = "./maps/earth.aimap")]
        map: PathBuf,
        /// Number of aliens to disembark.
        #[arg(long, short = 'a', default_value_t = 25)]
        aliens: u32,
        /// Optional TOML configuration file; missing keys fall back to defaults.
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
        /// RNG seed override for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Parse and validate a map file, then print its canonical form.
    Map {
        /// Map file path.
        #[arg(long, short = 'm', default_value = "./maps/earth.aimap")]
        map: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    match Cli::parse().command {
        Command::Start {
            map,
            aliens,
            config,
            seed,
        } => run_simulation(&map, aliens, config.as_deref(), seed),
        Command::Map { map } => check_map(&map),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<SimConfig> {
    let mut config = match path {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = seed {
        config.rng_seed = Some(seed);
    }
    config.validate().context("config invalid")?;
    Ok(config)
}

fn load_map(path: &Path) -> Result<CityMap> {
    let map = CityMap::load(path)
        .with_context(|| format!("parsing map file {}", path.display()))?;
    map.validate()
        .with_context(|| format!("validating map file {}", path.display()))?;
    Ok(map)
}

fn run_simulation(
    map_path: &Path,
    aliens: u32,
    config_path: Option<&Path>,
    seed: Option<u64>,
) -> Result<()> {
    let config = load_config(config_path, seed)?;
    let city_map = load_map(map_path)?;

    let mut rng = config.seeded_rng();
    let fleet = AlienProfile::generate(aliens, &config, &mut rng);

    let simulation = Simulation::new(city_map, fleet, config)
        .context("building simulation")?
        .with_listener(Arc::new(LogListener));

    let (cancel_handle, cancel_token) = cancel_pair();
    install_interrupt_handler(cancel_handle)?;

    let handle = simulation.start(cancel_token.clone()).context("starting simulation")?;
    select! {
        recv(handle.stopped()) -> outcome => match outcome {
            Ok(()) => info!("closing app: simulation stopped"),
            Err(_) => info!("closing app: engine halted"),
        },
        recv(cancel_token.done()) -> _ => info!("closing app: signal received"),
    }
    handle.join();
    Ok(())
}

/// First ctrl-c fires the cancellation signal; later ones are no-ops.
fn install_interrupt_handler(cancel_handle: CancelHandle) -> Result<()> {
    let slot = Arc::new(Mutex::new(Some(cancel_handle)));
    ctrlc::set_handler(move || {
        if let Ok(mut slot) = slot.lock() {
            if let Some(handle) = slot.take() {
                handle.cancel();
            }
        }
    })
    .context("installing interrupt handler")?;
    Ok(())
}

fn check_map(map_path: &Path) -> Result<()> {
    let map = load_map(map_path)?;
    info!(cities = map.len(), map = %map_path.display(), "map is valid");
    print!("{}", map.render());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_config_file_uses_defaults() {
        let config = load_config(None, None).expect("defaults");
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn seed_flag_overrides_the_config() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "fight_coef_ms = 10").expect("write");
        writeln!(file, "rng_seed = 1").expect("write");
        file.flush().expect("flush");

        let config = load_config(Some(file.path()), Some(99)).expect("config");
        assert_eq!(config.fight_coef_ms, 10);
        assert_eq!(config.rng_seed, Some(99));
    }

    #[test]
    fn invalid_config_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "stop_check_ms = 0").expect("write");
        file.flush().expect("flush");

        assert!(load_config(Some(file.path()), None).is_err());
    }

    #[test]
    fn bad_map_file_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "Foo east=Bar").expect("write");
        file.flush().expect("flush");

        assert!(load_map(file.path()).is_err(), "asymmetric map must fail");
    }
}
