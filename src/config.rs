//! Layered configuration: defaults, then a TOML file, then environment
//! variables prefixed `ARXCAT_`.

use crate::cli::RunArgs;
use crate::error::{ErrorKind, Result};
use arxcat_pipeline::PipelineOptions;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "ARXCAT_";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Source bucket name.
    pub bucket: String,
    /// Region the bucket lives in.
    pub region: String,
    /// Credentials for the requester-pays bucket. Optional so that purely
    /// local validation never requires them.
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Members validated concurrently per archive.
    pub concurrency: usize,
    /// Maximum accepted archive nesting depth.
    pub max_depth: usize,
    /// Registry JSON file loaded before and saved after each run.
    pub registry: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let defaults = PipelineOptions::default();
        Self {
            bucket: "arxiv".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
            concurrency: defaults.concurrency,
            max_depth: defaults.max_depth,
            registry: None,
        }
    }
}

impl Config {
    /// Load configuration, lowest precedence first: built-in defaults, the
    /// TOML file (explicit path, or the platform config directory), then
    /// `ARXCAT_*` environment variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = explicit.map(Path::to_path_buf).or_else(default_config_file) {
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .or_raise(|| ErrorKind::Config("cannot load configuration".to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Config("`concurrency` must be at least 1".to_string()));
        }
        if self.max_depth == 0 {
            exn::bail!(ErrorKind::Config("`max_depth` must be at least 1".to_string()));
        }
        if self.bucket.is_empty() {
            exn::bail!(ErrorKind::Config("`bucket` must not be empty".to_string()));
        }
        Ok(())
    }

    /// Fold command-line overrides over the loaded configuration.
    #[must_use]
    pub fn with_overrides(mut self, run: &RunArgs) -> Self {
        if let Some(concurrency) = run.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(max_depth) = run.max_depth {
            self.max_depth = max_depth;
        }
        if let Some(registry) = &run.registry {
            self.registry = Some(registry.clone());
        }
        self
    }

    #[must_use]
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions { concurrency: self.concurrency, max_depth: self.max_depth }
    }

    /// Credentials, or [`ErrorKind::Credentials`] for operations that must
    /// talk to the bucket.
    pub fn credentials(&self) -> Result<(String, String)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Ok((id.clone(), secret.clone())),
            _ => exn::bail!(ErrorKind::Credentials),
        }
    }
}

fn default_config_file() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "arxcat")?;
    Some(dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_any_source() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            let config = Config::load(None).unwrap();
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn toml_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("arxcat.toml", "bucket = \"mirror\"\nconcurrency = 2\n")?;
            let config = Config::load(Some(Path::new("arxcat.toml"))).unwrap();
            assert_eq!(config.bucket, "mirror");
            assert_eq!(config.concurrency, 2);
            assert_eq!(config.max_depth, Config::default().max_depth);
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.create_file("arxcat.toml", "region = \"eu-west-1\"\n")?;
            jail.set_env("ARXCAT_REGION", "us-west-2");
            let config = Config::load(Some(Path::new("arxcat.toml"))).unwrap();
            assert_eq!(config.region, "us-west-2");
            Ok(())
        });
    }

    #[test]
    fn zero_concurrency_rejected() {
        figment::Jail::expect_with(|jail| {
            jail.clear_env();
            jail.set_env("ARXCAT_CONCURRENCY", "0");
            let err = Config::load(None).unwrap_err();
            assert!(matches!(&*err, ErrorKind::Config(_)));
            Ok(())
        });
    }

    #[test]
    fn cli_overrides_win() {
        let run = RunArgs {
            concurrency: Some(16),
            max_depth: None,
            registry: Some(PathBuf::from("reg.json")),
            report: None,
        };
        let config = Config::default().with_overrides(&run);
        assert_eq!(config.concurrency, 16);
        assert_eq!(config.max_depth, Config::default().max_depth);
        assert_eq!(config.registry, Some(PathBuf::from("reg.json")));
    }

    #[test]
    fn credentials_required_together() {
        let mut config = Config::default();
        assert!(config.credentials().is_err());
        config.access_key_id = Some("id".to_string());
        assert!(config.credentials().is_err());
        config.secret_access_key = Some("secret".to_string());
        assert_eq!(config.credentials().unwrap(), ("id".to_string(), "secret".to_string()));
    }
}
