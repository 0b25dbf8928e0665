use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use blockwatch_ingest::{PollConfig, ReportScope};

use crate::cli::WatchArgs;

/// Settings for `blockwatch watch`, read from an optional TOML file and
/// overridden by command-line flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub path: PathBuf,
    pub poll_interval_ms: u64,
    pub recursive: bool,
    pub scope: ReportScope,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./storage"),
            poll_interval_ms: 500,
            recursive: false,
            scope: ReportScope::Chain,
        }
    }
}

impl WatchConfig {
    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Resolve the effective configuration for a `watch` invocation.
    pub fn resolve(args: &WatchArgs) -> anyhow::Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply(args);
        config.validate()?;
        Ok(config)
    }

    /// Flags given on the command line win over file values.
    pub fn apply(&mut self, args: &WatchArgs) {
        if let Some(path) = &args.path {
            self.path = path.clone();
        }
        if let Some(ms) = args.interval_ms {
            self.poll_interval_ms = ms;
        }
        if args.recursive {
            self.recursive = true;
        }
        if let Some(scope) = args.scope {
            self.scope = scope.into();
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        Ok(())
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            recursive: self.recursive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ScopeArg;

    #[test]
    fn default_config() {
        let c = WatchConfig::default();
        assert_eq!(c.path, PathBuf::from("./storage"));
        assert_eq!(c.poll_interval_ms, 500);
        assert!(!c.recursive);
        assert_eq!(c.scope, ReportScope::Chain);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = WatchConfig::from_toml("path = \"/var/inbox\"\nscope = \"tail\"\n").unwrap();
        assert_eq!(c.path, PathBuf::from("/var/inbox"));
        assert_eq!(c.scope, ReportScope::Tail);
        assert_eq!(c.poll_interval_ms, 500);
    }

    #[test]
    fn zero_interval_rejected() {
        assert!(WatchConfig::from_toml("poll_interval_ms = 0").is_err());
    }

    #[test]
    fn unknown_scope_rejected() {
        assert!(WatchConfig::from_toml("scope = \"everything\"").is_err());
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blockwatch.toml");
        std::fs::write(&file, "path = \"from-file\"\npoll_interval_ms = 1000\n").unwrap();

        let args = WatchArgs {
            config: Some(file),
            interval_ms: Some(25),
            recursive: true,
            scope: Some(ScopeArg::Tail),
            ..WatchArgs::default()
        };
        let c = WatchConfig::resolve(&args).unwrap();
        assert_eq!(c.path, PathBuf::from("from-file"));
        assert_eq!(c.poll_interval_ms, 25);
        assert!(c.recursive);
        assert_eq!(c.scope, ReportScope::Tail);
        assert_eq!(c.poll_config().interval, Duration::from_millis(25));
    }

    #[test]
    fn missing_file_is_an_error() {
        let args = WatchArgs {
            config: Some(PathBuf::from("/nonexistent/blockwatch.toml")),
            ..WatchArgs::default()
        };
        let err = WatchConfig::resolve(&args).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}
