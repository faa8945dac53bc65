//! Validation issue aggregation
//!
//! The tracker is a plain value owned by whoever drives a sync session. It is
//! reset explicitly at the start of a full sync and otherwise accumulates.

use crate::records::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Page key used when the owning page is unknown
pub const UNKNOWN_PAGE: &str = "(unknown page)";

/// Entity name used for pages without a name
pub const UNNAMED_PAGE: &str = "(unnamed page)";

/// Bucket an issue message falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    EmptyContent,
    InvalidIdentifier,
    InvalidTimestamp,
    InvalidParent,
    InvalidChildren,
    InvalidReference,
    Other,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 7] = [
        Self::EmptyContent,
        Self::InvalidIdentifier,
        Self::InvalidTimestamp,
        Self::InvalidParent,
        Self::InvalidChildren,
        Self::InvalidReference,
        Self::Other,
    ];

    /// Classify a validation message by keyword.
    ///
    /// Only the text before the first `": "` is inspected; host values the
    /// validator appends after it never affect the category. More specific
    /// keywords are tested first: a children error also mentions "identifier".
    pub fn classify(message: &str) -> Self {
        let head = message.split_once(": ").map_or(message, |(head, _)| head);
        let message = head.to_lowercase();

        if message.contains("content") {
            Self::EmptyContent
        } else if message.contains("timestamp") {
            Self::InvalidTimestamp
        } else if message.contains("parent") {
            Self::InvalidParent
        } else if message.contains("children") || message.contains("blocks[") {
            Self::InvalidChildren
        } else if message.contains("reference") {
            Self::InvalidReference
        } else if message.contains("identifier") || message.contains(" id ") {
            Self::InvalidIdentifier
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyContent => "empty-content",
            Self::InvalidIdentifier => "invalid-identifier",
            Self::InvalidTimestamp => "invalid-timestamp",
            Self::InvalidParent => "invalid-parent",
            Self::InvalidChildren => "invalid-children",
            Self::InvalidReference => "invalid-reference",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated issue for one entity and category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub entity_kind: EntityKind,
    pub entity: String,
    pub category: IssueCategory,
    pub count: usize,
}

type EntityKey = (EntityKind, String, IssueCategory);

/// Per-page, per-category issue counters
#[derive(Debug, Clone, Default)]
pub struct IssueTracker {
    pages: BTreeMap<String, BTreeMap<EntityKey, usize>>,
}

impl IssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_block_issue(&mut self, id: &str, page: Option<&str>, issues: &[String]) {
        let page = page
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(UNKNOWN_PAGE);
        let entity = if id.trim().is_empty() { "(no id)" } else { id };
        self.record(EntityKind::Block, entity, page, issues);
    }

    pub fn record_page_issue(&mut self, page: &str, issues: &[String]) {
        let page = page.trim();
        let page = if page.is_empty() { UNNAMED_PAGE } else { page };
        self.record(EntityKind::Page, page, page, issues);
    }

    fn record(&mut self, kind: EntityKind, entity: &str, page: &str, issues: &[String]) {
        let counters = self.pages.entry(page.to_string()).or_default();
        for issue in issues {
            let key = (kind, entity.to_string(), IssueCategory::classify(issue));
            *counters.entry(key).or_insert(0) += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Clear every counter
    pub fn reset(&mut self) {
        self.pages.clear();
    }

    pub fn summary(&self) -> IssueSummary {
        let mut summary = IssueSummary::default();
        let mut blocks = std::collections::BTreeSet::new();
        let mut pages = std::collections::BTreeSet::new();

        for (page, counters) in &self.pages {
            let mut page_summary = PageIssueSummary {
                page: page.clone(),
                total: 0,
                by_category: BTreeMap::new(),
                issues: Vec::with_capacity(counters.len()),
            };

            for ((kind, entity, category), count) in counters {
                page_summary.total += count;
                *page_summary.by_category.entry(*category).or_insert(0) += count;
                *summary.by_category.entry(*category).or_insert(0) += count;
                page_summary.issues.push(ValidationIssue {
                    entity_kind: *kind,
                    entity: entity.clone(),
                    category: *category,
                    count: *count,
                });
                match kind {
                    EntityKind::Block => blocks.insert((page.as_str(), entity.as_str())),
                    EntityKind::Page => pages.insert((page.as_str(), entity.as_str())),
                };
            }

            summary.total_issues += page_summary.total;
            summary.pages.push(page_summary);
        }

        summary.affected_blocks = blocks.len();
        summary.affected_pages = pages.len();
        summary
    }
}

/// Issues for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageIssueSummary {
    pub page: String,
    pub total: usize,
    pub by_category: BTreeMap<IssueCategory, usize>,
    pub issues: Vec<ValidationIssue>,
}

/// Aggregate report over every recorded issue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub total_issues: usize,
    pub affected_blocks: usize,
    pub affected_pages: usize,
    pub by_category: BTreeMap<IssueCategory, usize>,
    pub pages: Vec<PageIssueSummary>,
}

impl IssueSummary {
    pub fn is_empty(&self) -> bool {
        self.total_issues == 0
    }

    pub fn count(&self, category: IssueCategory) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

impl fmt::Display for IssueSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No validation issues");
        }

        writeln!(
            f,
            "Validation issues: {} ({} blocks, {} pages affected)",
            self.total_issues, self.affected_blocks, self.affected_pages
        )?;
        for (category, count) in &self.by_category {
            writeln!(f, "  {category}: {count}")?;
        }

        for page in &self.pages {
            writeln!(f, "Page \"{}\": {} issues", page.page, page.total)?;
            for (category, count) in &page.by_category {
                writeln!(f, "  {category}: {count}")?;
            }
        }
        Ok(())
    }
}
