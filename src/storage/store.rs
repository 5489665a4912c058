use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::types::*;

const CONFIG_FILE: &str = "config.toml";
const SESSION_FILE: &str = "session.json";

pub struct SessionStore {
    config_path: PathBuf,
    session_path: PathBuf,
}

impl SessionStore {
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("bbstats");
        Self::at(config_dir)
    }

    pub fn at(config_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_dir = config_dir.into();
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Could not create {}", config_dir.display()))?;

        Ok(Self {
            config_path: config_dir.join(CONFIG_FILE),
            session_path: config_dir.join(SESSION_FILE),
        })
    }

    // -- Config (no secrets) --------------------------------------------------

    pub fn load_config(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config in {}", self.config_path.display()))?;
        Ok(config)
    }

    pub fn save_config(&self, config: &Config) -> Result<()> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }

    // -- Session (secrets, 0600) ----------------------------------------------

    pub fn load_session(&self) -> Result<Option<SavedSession>> {
        if !self.session_path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.session_path)?;
        let session: SavedSession = serde_json::from_str(&contents)
            .with_context(|| format!("Corrupt session file {}", self.session_path.display()))?;
        Ok(Some(session))
    }

    pub fn save_session(&self, session: &SavedSession) -> Result<()> {
        let contents = serde_json::to_string_pretty(session)?;
        fs::write(&self.session_path, &contents)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.session_path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Returns whether there was a session to remove.
    pub fn clear_session(&self) -> Result<bool> {
        if !self.session_path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.session_path)?;
        Ok(true)
    }
}
