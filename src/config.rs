use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for MailSentry
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Root of the maildir store. When unset, the notmuch database path
    /// (`notmuch config get database.path`) is used instead.
    #[serde(default)]
    pub maildir: Option<String>,

    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Source folders and their tag rules, processed in listed order
    #[serde(default)]
    pub folders: Vec<FolderRules>,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    /// Only touch messages younger than this many days; 0 disables the
    /// age window
    #[serde(default)]
    pub max_age: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String, // "compact"

    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

/// A source maildir folder together with its ordered tag rules
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct FolderRules {
    /// Folder name as known to notmuch, e.g. "INBOX"
    pub name: String,

    /// Rules applied in listed order
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// One tag rule: messages carrying (or, with a `!` prefix, lacking) the tag
/// have their files moved into the destination folder
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Tag selector, optionally prefixed with `!` for negation
    pub tag: String,

    /// Destination folder, relative to the maildir root
    pub destination: String,
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}

// Default implementations
impl Default for SyncConfig {
    fn default() -> Self {
        Self { max_age: 0 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or create a default config
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            // Create default config
            let config = Self::default();

            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
            }

            // Save default config
            config.save(&config_path)?;

            tracing::info!("Created default configuration at: {:?}", config_path);
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("mailsentry").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        if let Some(maildir) = &self.maildir {
            self.maildir = Some(
                shellexpand::full(maildir)
                    .context("Failed to expand maildir path")?
                    .into_owned(),
            );
        }

        Ok(())
    }

    /// Configured maildir root, if the config pins one
    pub fn maildir_root(&self) -> Option<PathBuf> {
        self.maildir.as_ref().map(PathBuf::from)
    }

    /// Look up the rule set for a single folder by name
    pub fn folder(&self, name: &str) -> Option<&FolderRules> {
        self.folders.iter().find(|folder| folder.name == name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            maildir: None,
            sync: SyncConfig::default(),
            logging: LoggingConfig::default(),
            folders: Vec::new(),
        }
    }
}
