//! # Configuration
//!
//! Configuration is loaded with figment from, in order of precedence (highest first):
//! 1. Environment variables prefixed with `CFPILOT_`, sections separated by `__`
//!    (for example `CFPILOT_LINK__URI=radio://0/80/2M/E7E7E7E701`)
//! 2. A TOML file, `cfpilot.toml` in the working directory unless another path is given
//! 3. Default values
//!
//! Flight plans use the same TOML format, only the `waypoints` key is read:
//! ```toml
//! waypoints = [[0.0, 0.0, 0.4], [0.5, 0.0, 0.4], [0.0, 0.0, 0.2]]
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::pose::{Pose, Waypoint};
use crate::{Error, Result};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "cfpilot.toml";

const ENV_PREFIX: &str = "CFPILOT_";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Radio link
    pub link: LinkConfig,
    /// Initial pose of the drone, defines the local frame
    pub initial_pose: Pose,
    /// Estimator convergence test
    pub estimator: EstimatorConfig,
    /// Setpoint timing
    pub flight: FlightConfig,
    /// LED ring
    pub leds: LedConfig,
    /// Default flight plan, relative to the initial pose
    pub waypoints: Vec<Waypoint>,
}

/// Radio link configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// URI of the Crazyflie
    pub uri: String,
    /// TOC cache file. `None` or an empty path disables caching.
    pub toc_cache: Option<PathBuf>,
}

/// Estimator convergence test configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Period of the variance log block in milliseconds
    pub period_ms: u64,
    /// Number of samples kept per axis
    pub window: usize,
    /// Maximum variance spread (max - min) over the window for an axis to be considered stable
    pub threshold: f64,
    /// Give up after this many milliseconds. `None` waits forever.
    pub timeout_ms: Option<u64>,
}

/// Setpoint timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Time given to the drone to reach each waypoint of a sequence, in milliseconds
    pub time_between_commands_ms: u64,
    /// Number of times each setpoint is sent
    pub setpoint_repeats: u32,
    /// Delay between repeated setpoints in milliseconds, where a delay is used
    pub setpoint_interval_ms: u64,
    /// Check the final altitude of a sequence before cutting the motors
    pub check_z_safety: bool,
    /// Height above the initial z, in meters, above which the z safety check sends an extra setpoint
    pub z_safety_margin: f32,
    /// Height above the initial z, in meters, used for landing
    pub landing_height: f32,
    /// Number of landing setpoints
    pub landing_repeats: u32,
}

/// LED ring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedConfig {
    /// Time each color is shown, in milliseconds
    pub dwell_ms: u64,
}

/// Sequence of waypoints loaded from a TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightPlan {
    /// Waypoints relative to the initial pose
    pub waypoints: Vec<Waypoint>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            initial_pose: Pose::default(),
            estimator: EstimatorConfig::default(),
            flight: FlightConfig::default(),
            leds: LedConfig::default(),
            waypoints: vec![
                Waypoint::new(0.0, 0.0, 0.4),
                Waypoint::new(0.5, 0.0, 0.4),
                Waypoint::new(0.5, 0.5, 0.4),
                Waypoint::new(0.0, 0.5, 0.4),
                Waypoint::new(0.0, 0.0, 0.4),
                Waypoint::new(0.0, 0.0, 0.2),
            ],
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            uri: "radio://0/80/2M/E7E7E7E709".to_owned(),
            toc_cache: Some(PathBuf::from("./cache/toc.json")),
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            period_ms: 500,
            window: 10,
            threshold: 0.001,
            timeout_ms: None,
        }
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            time_between_commands_ms: 2000,
            setpoint_repeats: 10,
            setpoint_interval_ms: 100,
            check_z_safety: true,
            z_safety_margin: 0.2,
            landing_height: 0.1,
            landing_repeats: 20,
        }
    }
}

impl Default for LedConfig {
    fn default() -> Self {
        Self { dwell_ms: 1000 }
    }
}

impl LinkConfig {
    /// TOC cache file, `None` when caching is disabled
    pub fn toc_cache_path(&self) -> Option<&Path> {
        self.toc_cache
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }
}

impl EstimatorConfig {
    /// Log block period
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Maximum time to wait for convergence, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl FlightConfig {
    /// Time given to reach each waypoint of a sequence
    pub fn time_between_commands(&self) -> Duration {
        Duration::from_millis(self.time_between_commands_ms)
    }

    /// Delay between repeated setpoints
    pub fn setpoint_interval(&self) -> Duration {
        Duration::from_millis(self.setpoint_interval_ms)
    }
}

impl LedConfig {
    /// Time each color is shown
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }
}

impl Config {
    /// Load the configuration from the default file and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load the configuration with an optional custom file path.
    ///
    /// A missing default file is not an error, a missing custom file is.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => {
                require_file(&path)?;
                path
            }
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config: Config = Self::figment(&config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check values that would make the flight logic misbehave
    pub fn validate(&self) -> Result<()> {
        if self.estimator.window == 0 {
            return Err(invalid("estimator.window must be at least 1"));
        }
        if self.estimator.threshold.is_nan() || self.estimator.threshold <= 0.0 {
            return Err(invalid("estimator.threshold must be positive"));
        }
        if !(10..=2550).contains(&self.estimator.period_ms) {
            return Err(Error::InvalidLogPeriod(self.estimator.period()));
        }
        if self.flight.setpoint_repeats == 0 {
            return Err(invalid("flight.setpoint_repeats must be at least 1"));
        }
        Ok(())
    }
}

impl FlightPlan {
    /// Load a flight plan from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        require_file(path)?;
        Ok(Figment::from(Toml::file(path)).extract()?)
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} not found", path.display()),
        )))
    }
}

fn invalid(message: &str) -> Error {
    Error::Config(Box::new(figment::Error::from(message.to_owned())))
}
