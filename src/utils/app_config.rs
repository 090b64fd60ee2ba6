use std::path::Path;
use std::sync::RwLock;
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use config::Environment;
use lazy_static::lazy_static;

use super::error::Result;

static DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/default_config.toml"));

/// The main structure holding application config
pub struct AppConfig(config::Config);

impl AppConfig {
    fn new() -> Self {
        // Start with empty
        Self(config::Config::new())
    }

    pub fn setup(&mut self) -> Result<&mut Self> {
        // Merge with default config
        self.0
            .merge(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))?;

        // Merge settings with env variables, e.g. SCHEDSIM_REPORT__PRECISION=3
        self.0.merge(Environment::with_prefix("SCHEDSIM").separator("__"))?;

        Ok(self)
    }

    /// Load config from a file
    pub fn use_file(&mut self, path: &Path) -> Result<&mut Self> {
        self.0.merge(config::File::from(path))?;
        Ok(self)
    }

    /// Get a single value and deserialize to the given type
    pub fn get<T, K>(&self, key: K) -> Result<T>
    where
        // use DeserializeOwned, because we are reading CONFIG using RWLock
        // and the lock is released before returning. So T should not borrow
        // anything from CONFIG.
        T: serde::de::DeserializeOwned,
        K: AsRef<str>,
    {
        Ok(self.0.get(key.as_ref())?)
    }

    /// Deserialize the whole config to the given type
    pub fn fetch<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let t = self.0.clone().try_into()?;
        Ok(t)
    }
}

lazy_static! {
    /// global AppConfig instance
    static ref CONFIG: RwLock<AppConfig> = RwLock::new(AppConfig::new());
}

/// Load defaults and env overrides, then an optional user file on top
pub fn init(file: Option<&Path>) -> Result<()> {
    let mut cfg = config_mut();
    cfg.setup()?;
    if let Some(path) = file {
        cfg.use_file(path)?;
    }
    Ok(())
}

/// global AppConfig instance
pub fn config() -> RwLockReadGuard<'static, AppConfig> {
    // the lock is never held across a panic
    CONFIG.read().unwrap_or_else(|e| e.into_inner())
}

/// mutable global AppConfig instance
pub fn config_mut() -> RwLockWriteGuard<'static, AppConfig> {
    CONFIG.write().unwrap_or_else(|e| e.into_inner())
}

pub mod prelude {
    pub use super::{config, config_mut};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::new();
        config.setup().unwrap();
        config
            .use_file(Path::new(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/resources/test_config.toml"
            )))
            .unwrap();

        config
    }

    #[test]
    fn defaults() {
        let mut config = AppConfig::new();
        config.setup().unwrap();

        let format: String = config.get("report.format").unwrap();
        let count: u32 = config.get("generate.count").unwrap();
        assert_eq!(format, "text");
        assert_eq!(count, 30);
    }

    #[test]
    fn fetch_config() {
        let config = test_config();

        #[derive(Deserialize)]
        struct Report {
            format: String,
            precision: usize,
        }
        #[derive(Deserialize)]
        struct Fragment {
            report: Report,
        }

        let frag: Fragment = config.fetch().unwrap();

        assert_eq!(frag.report.format, "json");
        assert_eq!(frag.report.precision, 3);
    }

    #[test]
    fn file_overrides_only_what_it_sets() {
        let config = test_config();

        let seed: String = config.get("generate.seed").unwrap();
        let max_burst: u32 = config.get("generate.max_burst").unwrap();
        assert_eq!(seed, "test seed");
        assert_eq!(max_burst, 20);
    }
}
