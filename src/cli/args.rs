//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::device::DevicePosition;
use crate::domain::duration::Duration;

/// camclip - camera and microphone capture sessions
#[derive(Parser, Debug)]
#[command(name = "camclip")]
#[command(version)]
#[command(about = "Record camera and microphone clips to an MP4 file")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List capture devices
    Devices {
        /// Use fabricated devices instead of real hardware
        #[arg(long)]
        synthetic: bool,
    },
    /// Record a clip
    Record {
        /// Output file path
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Recording duration (e.g., 10s, 1m, 2m30s)
        #[arg(short = 'd', long, value_name = "TIME")]
        duration: Option<String>,

        /// Switch to the opposite camera after this long (e.g., 5s)
        #[arg(long, value_name = "TIME")]
        switch_after: Option<String>,

        /// Camera facing to start with
        #[arg(short = 'p', long, value_name = "POSITION")]
        position: Option<PositionArg>,

        /// Use fabricated devices instead of real hardware
        #[arg(long)]
        synthetic: bool,

        /// Stabilize the video during encoding
        #[arg(long)]
        stabilize: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Camera facing argument for clap ValueEnum
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PositionArg {
    Front,
    Back,
}

impl From<PositionArg> for DevicePosition {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::Front => DevicePosition::Front,
            PositionArg::Back => DevicePosition::Back,
        }
    }
}

/// Parsed record options
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub output: PathBuf,
    pub duration: Duration,
    pub switch_after: Option<Duration>,
    pub position: DevicePosition,
    pub synthetic: bool,
    pub stabilize: bool,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "output",
    "duration",
    "switch_after",
    "position",
    "synthetic",
    "stabilize",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
