use std::path::{Path, PathBuf};
use std::sync::Arc;

use dcabot::infrastructure::bootstrap::Services;
use dcabot::infrastructure::config::Config;
use dcabot::port::ChainClient;
use tempfile::TempDir;

/// A file-backed database and a matching dry-run config, removed on drop.
pub struct TempDb {
    dir: TempDir,
    config: Config,
}

impl TempDb {
    pub fn create() -> Self {
        Self::with_extra_config("")
    }

    /// `extra` is appended to the generated TOML, e.g. a `[routing]` table.
    pub fn with_extra_config(extra: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let toml = config_toml(&dir.path().join("dcabot.db"), extra);
        let config = Config::parse_toml(&toml).expect("parse test config");
        Self { dir, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Write the config to `config.toml` in the temp dir for CLI runs.
    pub fn write_config(&self, extra: &str) -> PathBuf {
        let path = self.dir.path().join("config.toml");
        let toml = config_toml(&self.dir.path().join("dcabot.db"), extra);
        std::fs::write(&path, toml).expect("write config");
        path
    }

    pub async fn services(&self, chain: Arc<dyn ChainClient>) -> Services {
        Services::with_chain(&self.config, chain)
            .await
            .expect("build services")
    }
}

fn config_toml(database: &Path, extra: &str) -> String {
    format!(
        "database = '{}'\n\n[chain]\ndca_address = \"terra1dca\"\ndry_run = true\n\n{extra}\n",
        database.display()
    )
}
