//! MailSentry - Tag-Driven Maildir Synchronization for Notmuch
//!
//! MailSentry moves the files of tagged mails into the maildir folder
//! configured for the respective tag, then refreshes the notmuch index so
//! that index and filesystem state stay consistent.
//!
//! ## Core Features
//!
//! - **Tag Rules**: Ordered per-folder rules mapping tags to destination folders
//! - **Negation**: `!tag` selectors match messages lacking the tag
//! - **Age Window**: Optional `max_age` restriction to recent messages
//! - **Dry Run**: Preview every move and the index refresh without side effects
//! - **Configuration Management**: YAML-based configuration with XDG compliance
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`query`]: Notmuch query construction for tag rules
//! - [`index`]: Notmuch index client (search, refresh, store discovery)
//! - [`sync`]: The per-rule move loop and index refresh

pub mod config;
pub mod health;
pub mod index;
pub mod query;
pub mod sync;

pub use config::{Config, FolderRules, Rule};
pub use index::{Index, IndexError, MessageMatch, NotmuchClient};
pub use sync::{SyncEngine, SyncError, SyncSummary};
