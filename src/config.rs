//! Helpline configuration.
//!
//! Loaded from `~/.helpline/config.toml`, or the path given with `--config`.
//! Every key is optional. A missing default file means all defaults;
//! a missing explicit file is an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::location::{
    Consented, DEFAULT_GPSD_ADDRESS, FixedProvider, GpsdProvider, LocationProvider,
    PermissionPolicy, PermissionPrompt,
};
use crate::model::{Coordinate, CoordinateError, DEFAULT_DELTA};
use crate::navigator::Route;

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid location: {0}")]
    Coordinate(#[from] CoordinateError),

    #[error("{field} must be between 0 and {max} degrees, got {value}")]
    Delta {
        field: &'static str,
        value: f64,
        max: f64,
    },
}

pub type Result<T> = core::result::Result<T, ConfigError>;

/// Helpline configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// The screen shown at launch.
    pub initial_route: Route,
    pub location: LocationConfig,
    pub map: MapConfig,
    pub log: LogConfig,
}

/// Which provider answers location requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// The configured `latitude`/`longitude`.
    #[default]
    Fixed,
    /// A gpsd daemon at `gpsd-address`.
    Gpsd,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LocationConfig {
    pub provider: ProviderKind,
    pub permission: PermissionPolicy,
    pub latitude: f64,
    pub longitude: f64,
    pub gpsd_address: String,
    /// Seconds to wait for a fix. 0 waits indefinitely.
    pub timeout_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Fixed,
            permission: PermissionPolicy::Ask,
            latitude: 37.0,
            longitude: -122.0,
            gpsd_address: DEFAULT_GPSD_ADDRESS.to_string(),
            timeout_secs: 30,
        }
    }
}

impl LocationConfig {
    pub fn coordinate(&self) -> core::result::Result<Coordinate, CoordinateError> {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Build the session's provider, wrapped in the permission gate.
    ///
    /// `prompts` receives a [`PermissionPrompt`] when the policy is `ask`.
    pub fn provider(
        &self,
        prompts: Option<mpsc::UnboundedSender<PermissionPrompt>>,
    ) -> Result<Arc<dyn LocationProvider>> {
        let inner: Box<dyn LocationProvider> = match self.provider {
            ProviderKind::Fixed => Box::new(FixedProvider::new(self.coordinate()?)),
            ProviderKind::Gpsd => Box::new(GpsdProvider::new(self.gpsd_address.clone())),
        };
        Ok(Arc::new(Consented::new(inner, self.permission, prompts)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct MapConfig {
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            latitude_delta: DEFAULT_DELTA,
            longitude_delta: DEFAULT_DELTA,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct LogConfig {
    /// Where the TUI writes its log. Defaults to `~/.helpline/helpline.log`.
    pub file: Option<PathBuf>,
}

impl Config {
    /// Load from `path`, or from `~/.helpline/config.toml` when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound && !required => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        let config: Self =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot.
    pub fn validate(&self) -> Result<()> {
        self.location.coordinate()?;
        check_delta("map.latitude-delta", self.map.latitude_delta, 180.0)?;
        check_delta("map.longitude-delta", self.map.longitude_delta, 360.0)?;
        Ok(())
    }

    /// The config file path: `~/.helpline/config.toml`.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// The log file: `log.file`, else `~/.helpline/helpline.log`.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log
            .file
            .clone()
            .or_else(|| Self::dir().map(|d| d.join("helpline.log")))
    }

    fn dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".helpline"))
    }
}

fn check_delta(field: &'static str, value: f64, max: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 && value <= max {
        Ok(())
    } else {
        Err(ConfigError::Delta { field, value, max })
    }
}
