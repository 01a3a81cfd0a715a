//! Notmuch query construction for tag rules
//!
//! Every rule compiles to the same fixed query shape:
//! `folder:<folder> AND tag:<tag>` (or `NOT tag:<tag>` for negated
//! selectors), optionally extended with a `start..end` timestamp range
//! restricting matches to recent messages.

use chrono::Utc;

/// Marker prefix that inverts a tag selector
pub const NEGATION_MARKER: char = '!';

const SECONDS_PER_DAY: i64 = 86_400;

/// Inclusive Unix-timestamp range appended to every query of a sync session.
///
/// Computed once when the engine is constructed, so all rules of one run
/// share an identical window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    /// Build the window covering the last `max_age_days` days.
    ///
    /// Returns `None` for a zero age, which means "no time filter".
    pub fn new(max_age_days: u64) -> Option<Self> {
        if max_age_days == 0 {
            return None;
        }
        let now = Utc::now().timestamp();
        Some(Self {
            start: now - max_age_days as i64 * SECONDS_PER_DAY,
            end: now,
        })
    }

    fn as_clause(&self) -> String {
        format!("{}..{}", self.start, self.end)
    }
}

/// Check whether a tag selector requests the complement of a tag
pub fn is_negated(selector: &str) -> bool {
    selector.starts_with(NEGATION_MARKER)
}

/// Compile a rule's tag selector into a notmuch query scoped to `folder`.
///
/// Folder and tag content are substituted verbatim; notmuch rejects
/// malformed terms on its side.
pub fn build_query(folder: &str, selector: &str, window: Option<&TimeWindow>) -> String {
    let tag_clause = if is_negated(selector) {
        format!("NOT tag:{}", selector.trim_start_matches(NEGATION_MARKER))
    } else {
        format!("tag:{}", selector)
    };

    let mut query = format!("folder:{} AND {}", folder, tag_clause);
    if let Some(window) = window {
        query.push_str(&format!(" AND {}", window.as_clause()));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_selector() {
        assert_eq!(
            build_query("INBOX", "work", None),
            "folder:INBOX AND tag:work"
        );
    }

    #[test]
    fn test_negated_selector_strips_marker() {
        assert_eq!(
            build_query("INBOX", "!urgent", None),
            "folder:INBOX AND NOT tag:urgent"
        );

        // All leading markers are stripped, mirroring lstrip semantics
        assert_eq!(
            build_query("INBOX", "!!spam", None),
            "folder:INBOX AND NOT tag:spam"
        );
    }

    #[test]
    fn test_window_appended_after_tag_clause() {
        let window = TimeWindow {
            start: 1_000,
            end: 2_000,
        };

        assert_eq!(
            build_query("Archive", "old", Some(&window)),
            "folder:Archive AND tag:old AND 1000..2000"
        );
        assert_eq!(
            build_query("Archive", "!keep", Some(&window)),
            "folder:Archive AND NOT tag:keep AND 1000..2000"
        );
    }

    #[test]
    fn test_zero_age_means_no_window() {
        assert!(TimeWindow::new(0).is_none());
    }

    #[test]
    fn test_window_spans_requested_days() {
        let window = TimeWindow::new(30).expect("nonzero age must yield a window");
        assert_eq!(window.end - window.start, 30 * SECONDS_PER_DAY);

        let now = Utc::now().timestamp();
        assert!(window.end <= now);
        assert!(now - window.end < 5, "window end should be computed from now");
    }

    #[test]
    fn test_is_negated() {
        assert!(is_negated("!urgent"));
        assert!(!is_negated("urgent"));
        assert!(!is_negated("not!urgent"));
    }
}
