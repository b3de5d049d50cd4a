//! Regex-driven action-item extraction.
//!
//! Four pattern families are applied in order: explicit markers
//! ("action item:", "todo:"), modal phrases ("need to", "should"),
//! `@name` mentions, and "assigned to"/"responsible:" phrases. Every match
//! becomes a candidate; candidates are then deduplicated and capped.

use std::collections::HashSet;

use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::model::{ActionItem, ActionType, Priority};

/// Upper bound on returned items.
pub const MAX_ACTION_ITEMS: usize = 10;

/// Items whose normalized text is this many characters or fewer are dropped.
pub const MIN_TEXT_CHARS: usize = 10;

const URGENT_KEYWORDS: &[&str] = &["urgent", "asap", "immediately", "critical", "important"];
const HIGH_KEYWORDS: &[&str] = &["soon", "quickly", "priority", "deadline"];

/// Patterns with one capture yield general items; two captures are
/// `(assignee, text)`.
const PATTERNS: &[&str] = &[
    r"(?i)(?:action item|todo|to do|task|follow up):?\s*(.+?)(?:\n|$)",
    r"(?i)(?:need to|should|will|must)\s+(.+?)(?:\n|\.)",
    r"(?i)@(\w+)\s+(.+?)(?:\n|$)",
    r"(?i)(?:assigned to|responsible:)\s*(\w+)\s*[-:]?\s*(.+?)(?:\n|$)",
];

/// Priority from keyword presence; urgent keywords outrank high ones.
pub fn determine_priority(text: &str) -> Priority {
    let lower = text.to_lowercase();
    if URGENT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::Urgent
    } else if HIGH_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Priority::High
    } else {
        Priority::Medium
    }
}

/// Compiled action-item patterns.
///
/// Build once at service start and reuse for every request.
pub struct ActionItemExtractor {
    patterns: Vec<Regex>,
}

impl ActionItemExtractor {
    pub fn new() -> Result<Self> {
        let patterns = PATTERNS
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Every match of every pattern, in pattern-then-match order.
    pub fn candidates(&self, text: &str) -> Vec<ActionItem> {
        let mut items = Vec::new();

        for pattern in &self.patterns {
            for caps in pattern.captures_iter(text) {
                let id = items.len() + 1;
                let item = match (caps.get(1), caps.get(2)) {
                    (Some(who), Some(what)) => ActionItem {
                        id,
                        text: what.as_str().trim().to_string(),
                        assignee: Some(who.as_str().trim().to_string()),
                        priority: determine_priority(what.as_str()),
                        kind: ActionType::Assigned,
                    },
                    (Some(what), None) => ActionItem {
                        id,
                        text: what.as_str().trim().to_string(),
                        assignee: None,
                        priority: determine_priority(what.as_str()),
                        kind: ActionType::General,
                    },
                    _ => continue,
                };
                items.push(item);
            }
        }

        items
    }

    /// Extract deduplicated action items, at most [`MAX_ACTION_ITEMS`].
    pub fn extract(&self, text: &str) -> Vec<ActionItem> {
        let candidates = self.candidates(text);
        let total = candidates.len();

        let mut seen = HashSet::new();
        let items: Vec<ActionItem> = candidates
            .into_iter()
            .filter(|item| {
                let key = item.text.to_lowercase().trim().to_string();
                key.chars().count() > MIN_TEXT_CHARS && seen.insert(key)
            })
            .take(MAX_ACTION_ITEMS)
            .collect();

        debug!(candidates = total, kept = items.len(), "extracted action items");
        items
    }
}
