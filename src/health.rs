//! System health checks for MailSentry
//!
//! This module provides preflight checks to verify the system is properly
//! configured before running operations.

use crate::config::Config;
use crate::index::NotmuchClient;
use std::path::{Path, PathBuf};

/// Result of system health checks
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Notmuch installation status
    pub notmuch: CheckResult,
    /// Maildir store root status
    pub maildir: CheckResult,
    /// Destination folder status (warning only, sync assumes they exist)
    pub destinations: CheckResult,
    /// Rule configuration status (warning only)
    pub rules: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

#[allow(dead_code)]
impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: true,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl HealthCheck {
    /// Run all health checks
    pub fn run(config: &Config, client: &NotmuchClient) -> Self {
        let store_root = resolve_store_root(config, client);

        Self {
            notmuch: Self::check_notmuch(client),
            maildir: Self::check_maildir(store_root.as_deref()),
            destinations: Self::check_destinations(config, store_root.as_deref()),
            rules: Self::check_rules(config),
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.notmuch.passed && self.maildir.passed
        // Destinations and rules are advisory, not included in required checks
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&CheckResult> {
        [&self.notmuch, &self.maildir, &self.destinations, &self.rules]
            .into_iter()
            .filter(|r| r.is_warning)
            .collect()
    }

    /// Check notmuch installation
    fn check_notmuch(client: &NotmuchClient) -> CheckResult {
        match client.version() {
            Ok(version) => CheckResult::ok_with_details("Notmuch installed", version),
            Err(e) => CheckResult::error_with_details(
                "Notmuch not usable",
                format!("{}\nInstall notmuch: https://notmuchmail.org/", e),
            ),
        }
    }

    /// Check the maildir store root exists
    fn check_maildir(store_root: Option<&Path>) -> CheckResult {
        match store_root {
            Some(path) if path.is_dir() => {
                CheckResult::ok_with_details("Maildir root exists", path.display().to_string())
            }
            Some(path) => CheckResult::error_with_details(
                "Maildir root does not exist",
                format!("Run: mkdir -p {}", path.display()),
            ),
            None => CheckResult::error_with_details(
                "No maildir root",
                "Set `maildir` in the config or configure notmuch database.path",
            ),
        }
    }

    /// Check that every rule destination has a cur/ directory
    fn check_destinations(config: &Config, store_root: Option<&Path>) -> CheckResult {
        let Some(root) = store_root else {
            return CheckResult::warning("Destinations not checked (no maildir root)");
        };

        let missing: Vec<String> = config
            .folders
            .iter()
            .flat_map(|folder| folder.rules.iter())
            .map(|rule| rule.destination.as_str())
            .filter(|destination| !root.join(destination).join("cur").is_dir())
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            CheckResult::ok("All destination folders exist")
        } else {
            // Sync renames straight into <destination>/cur/ without creating it
            CheckResult::warning_with_details(
                "Some destination folders are missing a cur/ directory",
                missing.join(", "),
            )
        }
    }

    /// Check the rule configuration is non-trivial
    fn check_rules(config: &Config) -> CheckResult {
        if config.folders.is_empty() {
            return CheckResult::warning_with_details(
                "No folders configured",
                "Add a `folders` section to the config; sync will do nothing",
            );
        }

        let empty: Vec<&str> = config
            .folders
            .iter()
            .filter(|folder| folder.rules.is_empty())
            .map(|folder| folder.name.as_str())
            .collect();

        if empty.is_empty() {
            let rule_count: usize = config.folders.iter().map(|f| f.rules.len()).sum();
            CheckResult::ok_with_details(
                "Rules configured",
                format!("{} rules across {} folders", rule_count, config.folders.len()),
            )
        } else {
            CheckResult::warning_with_details("Folders without rules", empty.join(", "))
        }
    }

    /// Get all checks as a slice for iteration
    pub fn all_checks(&self) -> [(&'static str, &CheckResult); 4] {
        [
            ("Notmuch Installation", &self.notmuch),
            ("Maildir Root", &self.maildir),
            ("Destination Folders", &self.destinations),
            ("Rule Configuration", &self.rules),
        ]
    }
}

/// Resolution order for the store root: pinned config path first, then the
/// notmuch database location
pub fn resolve_store_root(config: &Config, client: &NotmuchClient) -> Option<PathBuf> {
    config
        .maildir_root()
        .or_else(|| client.database_path().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FolderRules, Rule};
    use tempfile::TempDir;

    fn config_with_rules(rules: Vec<Rule>) -> Config {
        let mut config = Config::default();
        config.folders = vec![FolderRules {
            name: "INBOX".to_string(),
            rules,
        }];
        config
    }

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("Test passed");
        assert!(result.passed);
        assert!(!result.is_warning);
        assert!(result.details.is_none());
    }

    #[test]
    fn test_check_maildir_missing() {
        let result = HealthCheck::check_maildir(Some(Path::new("/nonexistent/mail/store")));
        assert!(!result.passed);
        assert!(result.details.unwrap().contains("mkdir -p"));
    }

    #[test]
    fn test_check_maildir_unresolved() {
        let result = HealthCheck::check_maildir(None);
        assert!(!result.passed);
    }

    #[test]
    fn test_check_destinations_reports_missing_cur() {
        let store = TempDir::new().unwrap();
        std::fs::create_dir_all(store.path().join("Work").join("cur")).unwrap();

        let config = config_with_rules(vec![
            Rule {
                tag: "work".to_string(),
                destination: "Work".to_string(),
            },
            Rule {
                tag: "!urgent".to_string(),
                destination: "Later".to_string(),
            },
        ]);

        let result = HealthCheck::check_destinations(&config, Some(store.path()));
        assert!(result.passed);
        assert!(result.is_warning);
        assert_eq!(result.details.as_deref(), Some("Later"));
    }

    #[test]
    fn test_check_rules_warns_on_empty_config() {
        let result = HealthCheck::check_rules(&Config::default());
        assert!(result.is_warning);

        let result = HealthCheck::check_rules(&config_with_rules(vec![]));
        assert!(result.is_warning);
        assert_eq!(result.details.as_deref(), Some("INBOX"));
    }

    #[test]
    fn test_all_checks_returns_all_four() {
        let health = HealthCheck {
            notmuch: CheckResult::ok("Notmuch OK"),
            maildir: CheckResult::ok("Maildir OK"),
            destinations: CheckResult::ok("Destinations OK"),
            rules: CheckResult::ok("Rules OK"),
        };
        let checks = health.all_checks();
        assert_eq!(checks.len(), 4);
        assert!(health.all_passed());
        assert!(health.warnings().is_empty());
    }
}
