//! Command-line argument parsing for the terrain tools.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Command-line arguments.
///
/// CLI values override settings loaded from `terrain.ron`.
#[derive(Parser, Debug)]
#[command(name = "loam", about = "Streamed procedural terrain")]
pub struct CliArgs {
    /// World seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Render distance in chunks.
    #[arg(long)]
    pub render_distance: Option<u32>,

    /// Generation worker threads (0 = based on CPU count).
    #[arg(long)]
    pub workers: Option<u32>,

    /// Disable the region system and use the fallback biome blend.
    #[arg(long)]
    pub no_regions: bool,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    pub ticks: u32,

    /// Viewer speed in world units per tick.
    #[arg(long, default_value_t = 4.0)]
    pub speed: f64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.world.seed = seed;
        }
        if let Some(rd) = args.render_distance {
            self.streaming.max_render_distance = rd;
        }
        if let Some(workers) = args.workers {
            self.streaming.worker_threads = workers;
        }
        if args.no_regions {
            self.regions.enabled = false;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs {
            seed: None,
            render_distance: None,
            workers: None,
            no_regions: false,
            ticks: 600,
            speed: 4.0,
            log_level: None,
            config: None,
        }
    }

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(99),
            no_regions: true,
            log_level: Some("debug".to_string()),
            ..empty_args()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.world.seed, 99);
        assert!(!config.regions.enabled);
        assert_eq!(config.debug.log_level, "debug");
        // Non-overridden fields retain defaults
        assert_eq!(config.streaming.max_render_distance, 6);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&empty_args());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["loam", "--seed", "5", "--render-distance", "3", "--ticks", "10"]);
        assert_eq!(args.seed, Some(5));
        assert_eq!(args.render_distance, Some(3));
        assert_eq!(args.ticks, 10);
        assert!(!args.no_regions);
    }
}
