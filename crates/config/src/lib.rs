//! Layered configuration for the imagesync service.
//!
//! Configuration is assembled from two providers, later ones taking
//! precedence: a TOML file (`imagesync.toml` by default) and environment
//! variables prefixed with `IMAGESYNC_` (nested keys separated by `__`,
//! e.g. `IMAGESYNC_REPOSITORY__MOUNT_POINT`).
//!
//! The whole surface is immutable for the lifetime of the process: the
//! [`Config`] is built once at startup and passed by reference to every
//! component that needs it.

pub mod error;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::UtcOffset;

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "imagesync.toml";
/// Environment variable prefix for configuration overrides.
const ENV_PREFIX: &str = "IMAGESYNC_";

/// Top-level service configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Where the reference database lives.
#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. Created if missing.
    pub path: PathBuf,
}

/// Where the image repository is mounted.
#[derive(Clone, Debug, Deserialize)]
pub struct RepositoryConfig {
    /// Absolute path to the mounted directory of product images.
    pub mount_point: PathBuf,
}

/// When and how often reconciliation passes run.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds to sleep between passes, regardless of outcome.
    pub interval_secs: u64,
    /// Hour of day (inclusive) from which passes are allowed.
    pub window_start_hour: u8,
    /// Hour of day (exclusive) at which passes stop being allowed.
    pub window_end_hour: u8,
    /// UTC offset, in whole hours, at which the window is evaluated.
    /// The mount is in São Paulo; the servers are not.
    pub utc_offset_hours: i8,
}
impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            window_start_hour: 7,
            window_end_hour: 19,
            utc_offset_hours: 0,
        }
    }
}

impl Config {
    /// Load configuration from the given TOML file (or [`DEFAULT_CONFIG_FILE`]
    /// when `None`) merged with `IMAGESYNC_` environment variables.
    ///
    /// A missing file is not an error; figment treats it as an empty provider,
    /// so an environment-only deployment works without any file at all.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let config: Self = Figment::new()
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .or_raise(|| ErrorKind::Extract)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let schedule = &self.schedule;
        if schedule.interval_secs == 0 {
            exn::bail!(ErrorKind::Invalid("interval_secs must be greater than zero".to_string()));
        }
        if schedule.window_end_hour > 24 || schedule.window_start_hour >= schedule.window_end_hour {
            exn::bail!(ErrorKind::Invalid(format!(
                "allowed window [{}, {}) must satisfy start < end <= 24",
                schedule.window_start_hour, schedule.window_end_hour
            )));
        }
        // UtcOffset rejects anything outside ±18h anyway; fail early with a
        // message that names the offending key.
        if UtcOffset::from_hms(schedule.utc_offset_hours, 0, 0).is_err() {
            exn::bail!(ErrorKind::Invalid(format!(
                "utc_offset_hours {} is outside the valid range of UTC offsets",
                schedule.utc_offset_hours
            )));
        }
        if !self.repository.mount_point.is_absolute() {
            exn::bail!(ErrorKind::Invalid(format!(
                "mount_point must be an absolute path, got `{}`",
                self.repository.mount_point.display()
            )));
        }
        Ok(())
    }

    /// Fixed delay between reconciliation attempts.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }

    /// The offset at which the time-of-day window is evaluated.
    ///
    /// Infallible after [`Config::load`]: validation already rejected
    /// out-of-range offsets.
    pub fn utc_offset(&self) -> UtcOffset {
        UtcOffset::from_hms(self.schedule.utc_offset_hours, 0, 0).unwrap_or(UtcOffset::UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            database: DatabaseConfig { path: PathBuf::from("/var/lib/imagesync/imagesync.db") },
            repository: RepositoryConfig { mount_point: PathBuf::from("/mnt/product-images") },
            schedule: ScheduleConfig::default(),
        }
    }

    #[test]
    fn test_defaults() {
        let schedule = ScheduleConfig::default();
        assert_eq!(schedule.interval_secs, 3600);
        assert_eq!(schedule.window_start_hour, 7);
        assert_eq!(schedule.window_end_hour, 19);
        assert_eq!(schedule.utc_offset_hours, 0);
    }

    #[test]
    fn test_load_from_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "imagesync.toml",
                r#"
                    [database]
                    path = "/tmp/imagesync.db"

                    [repository]
                    mount_point = "/mnt/images"

                    [schedule]
                    interval_secs = 600
                    window_start_hour = 8
                    window_end_hour = 18
                "#,
            )?;
            let config = Config::load(None).expect("config should load");
            assert_eq!(config.database.path, PathBuf::from("/tmp/imagesync.db"));
            assert_eq!(config.repository.mount_point, PathBuf::from("/mnt/images"));
            assert_eq!(config.interval(), Duration::from_secs(600));
            assert_eq!(config.schedule.window_start_hour, 8);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "imagesync.toml",
                r#"
                    [database]
                    path = "/tmp/imagesync.db"

                    [repository]
                    mount_point = "/mnt/images"
                "#,
            )?;
            jail.set_env("IMAGESYNC_REPOSITORY__MOUNT_POINT", "/mnt/other");
            jail.set_env("IMAGESYNC_SCHEDULE__INTERVAL_SECS", "60");
            let config = Config::load(None).expect("config should load");
            assert_eq!(config.repository.mount_point, PathBuf::from("/mnt/other"));
            assert_eq!(config.interval(), Duration::from_secs(60));
            Ok(())
        });
    }

    #[test]
    fn test_missing_required_keys() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("imagesync.toml", "[schedule]\ninterval_secs = 60\n")?;
            assert!(Config::load(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn test_validation_rejects_inverted_window() {
        let mut config = base_config();
        config.schedule.window_start_hour = 19;
        config.schedule.window_end_hour = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_interval() {
        let mut config = base_config();
        config.schedule.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_silly_offset() {
        let mut config = base_config();
        config.schedule.utc_offset_hours = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_relative_mount_point() {
        let mut config = base_config();
        config.repository.mount_point = PathBuf::from("relative/images");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_utc_offset() {
        let mut config = base_config();
        config.schedule.utc_offset_hours = -3;
        assert_eq!(config.utc_offset(), UtcOffset::from_hms(-3, 0, 0).unwrap());
    }
}
