//! Engine configuration.
//!
//! Provides configurable parameters for the simulation loop, the agent,
//! asset locations, logging, streaming and props.
//! Configuration can be loaded from and saved to a TOML file.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use glam::Vec3;
use runline_world::{PropCatalog, PropWarmup, StreamingConfig, DEFAULT_DESPAWN_DISTANCE};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "runline.toml";

/// Environment variable overriding the configuration path.
pub const CONFIG_ENV: &str = "RUNLINE_CONFIG";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Simulation ===
    /// Ticks per second
    pub tick_rate: u32,
    /// Stop after this many seconds (None = run until interrupted)
    pub run_seconds: Option<f32>,
    /// Ticks between stats log lines (0 = disabled)
    pub stats_interval: u32,

    // === Agent ===
    /// Agent start position
    pub agent_start: Vec3,
    /// Agent heading
    pub agent_forward: Vec3,
    /// Agent speed in units per second
    pub agent_speed: f32,

    // === Assets ===
    /// Level catalog file (None = built-in demo level)
    pub level_path: Option<PathBuf>,
    /// Directory of segment blueprint files
    pub segment_dir: Option<PathBuf>,
    /// Directory of prop blueprint files
    pub prop_dir: Option<PathBuf>,

    // === Logging ===
    /// Default tracing filter directive
    pub log_filter: String,

    // === Subsystems ===
    /// Segment streaming
    pub streaming: StreamingConfig,
    /// Prop pooling
    pub props: PropSettings,
}

/// Prop pooling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropSettings {
    /// Whether props are spawned at all
    pub enabled: bool,
    /// Distance behind the agent at which props despawn
    pub despawn_distance: f32,
    /// Seed for pool selection (None = random)
    pub seed: Option<u64>,
    /// Instances pre-created per asset
    pub warmup: PropWarmup,
    /// Prop assets (empty = built-in demo props)
    pub catalog: PropCatalog,
}

impl Default for PropSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            despawn_distance: DEFAULT_DESPAWN_DISTANCE,
            seed: None,
            warmup: PropWarmup::default(),
            catalog: PropCatalog::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Simulation
            tick_rate: 60,
            run_seconds: Some(30.0),
            stats_interval: 120,

            // Agent
            agent_start: Vec3::new(0.0, 0.0, 2.0),
            agent_forward: Vec3::Z,
            agent_speed: 12.0,

            // Assets
            level_path: None,
            segment_dir: None,
            prop_dir: None,

            // Logging
            log_filter: "runline=info".to_string(),

            // Subsystems
            streaming: StreamingConfig::default(),
            props: PropSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to the default file location.
    pub fn save(&self) -> io::Result<()> {
        self.save_to(Self::config_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Resolve the configuration path: first CLI argument, then
    /// `RUNLINE_CONFIG`, then `runline.toml` in the working directory.
    pub fn config_path() -> PathBuf {
        std::env::args()
            .nth(1)
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from)
    }

    /// Validate and clamp configuration values to sensible ranges.
    ///
    /// Streaming options are checked against the catalog when the session
    /// starts, not here.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(1, 1000);
        self.agent_speed = self.agent_speed.clamp(0.0, 500.0);
        if let Some(seconds) = self.run_seconds {
            self.run_seconds = Some(seconds.max(0.0));
        }
        if self.agent_forward.length_squared() < f32::EPSILON {
            warn!("Agent forward is zero, falling back to +Z");
            self.agent_forward = Vec3::Z;
        }
        self.props.despawn_distance = self.props.despawn_distance.max(0.0);
    }

    /// Seconds per tick.
    #[must_use]
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}
