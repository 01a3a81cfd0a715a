/// Common test utilities and helpers for MailSentry tests

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use mailsentry::{Index, IndexError, MessageMatch};

/// On-disk maildir store fixture with a config file slot
pub struct TestStore {
    pub temp_dir: assert_fs::TempDir,
}

impl TestStore {
    /// Create a store containing the given maildir folders
    pub fn new(folders: &[&str]) -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp dir");
        for folder in folders {
            for sub in ["cur", "new", "tmp"] {
                std::fs::create_dir_all(temp_dir.path().join(folder).join(sub))
                    .expect("Failed to create maildir folder");
            }
        }
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Drop a mail file into `<folder>/cur/` and return its path
    pub fn deliver(&self, folder: &str, name: &str) -> PathBuf {
        let path = self.root().join(folder).join("cur").join(name);
        std::fs::write(&path, "Subject: hello\n\nbody\n").expect("Failed to write mail file");
        path
    }

    /// Write a config file inside the store and return its path
    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.root().join("config.yml");
        std::fs::write(&path, content).expect("Failed to write test config");
        path
    }

    /// A minimal config pinning the maildir to this store
    pub fn write_minimal_config(&self) -> PathBuf {
        let content = format!(
            r#"
maildir: "{}"
folders:
  - name: INBOX
    rules:
      - tag: work
        destination: Work
      - tag: "!urgent"
        destination: Later
"#,
            self.root().display()
        );
        self.write_config(&content)
    }
}

/// Match handle for a mail file in a TestStore
pub fn message_at(path: PathBuf, tags: &[&str]) -> MessageMatch {
    MessageMatch {
        id: format!(
            "{}@test.example",
            path.file_name().unwrap_or_default().to_string_lossy()
        ),
        filename: path,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        subject: "hello".to_string(),
        sender: "Alice <alice@example.org>".to_string(),
        date_relative: "Today 09:00".to_string(),
    }
}

/// Index double that replays canned search results in call order and
/// records every query and refresh it sees
#[derive(Default)]
pub struct ScriptedIndex {
    pub responses: RefCell<VecDeque<Vec<MessageMatch>>>,
    pub queries: RefCell<Vec<String>>,
    pub refreshes: Cell<usize>,
    pub fail_refresh: bool,
}

impl ScriptedIndex {
    pub fn new(responses: Vec<Vec<MessageMatch>>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            ..Self::default()
        }
    }
}

impl Index for ScriptedIndex {
    fn search(&self, query: &str) -> Result<Vec<MessageMatch>, IndexError> {
        self.queries.borrow_mut().push(query.to_string());
        Ok(self.responses.borrow_mut().pop_front().unwrap_or_default())
    }

    fn refresh(&self) -> Result<(), IndexError> {
        self.refreshes.set(self.refreshes.get() + 1);
        if self.fail_refresh {
            Err(IndexError::Malformed("refresh unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Assertion helper for CLI output validation
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
