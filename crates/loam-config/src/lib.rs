//! Configuration for the streamed terrain core.
//!
//! Provides runtime-configurable settings that persist to disk as RON files.
//! Supports CLI overrides via clap, hot-reload detection, and forward/backward
//! compatible serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    BiomeEntry, ColorConfig, ColorStop, Config, DebugConfig, RegionConfig, StreamingConfig,
    SubBiomeEntry, TerrainConfig, TreeConfig, WorldConfig,
};
pub use error::ConfigError;
