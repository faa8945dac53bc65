//! Structural validation of canonical records
//!
//! Every check runs; errors are collected, never short-circuited. Messages are
//! worded so that [`IssueCategory::classify`](crate::IssueCategory::classify)
//! can bucket them by keyword. Host values are only ever appended after a
//! `": "` separator.

use crate::records::{BlockRecord, ChildRef, PageRecord};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use kgsync_parser::Reference;
use serde::{Deserialize, Serialize};

/// Outcome of validating one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Records that can be validated
pub trait Validate {
    fn validate(&self) -> ValidationReport;
}

impl Validate for BlockRecord {
    fn validate(&self) -> ValidationReport {
        validate_block(self)
    }
}

impl Validate for PageRecord {
    fn validate(&self) -> ValidationReport {
        validate_page(self)
    }
}

pub fn validate_block(block: &BlockRecord) -> ValidationReport {
    let mut errors = Vec::new();

    if block.id.trim().is_empty() {
        errors.push("Block identifier is missing or empty".to_string());
    }
    if block.content.trim().is_empty() {
        errors.push("Block content is empty".to_string());
    }

    check_timestamp("created", block.created.as_deref(), &mut errors);
    check_timestamp("updated", block.updated.as_deref(), &mut errors);

    if let Some(parent) = &block.parent {
        if parent.trim().is_empty() {
            errors.push("parent must be null or a non-empty block identifier".to_string());
        }
    }

    check_id_list("children", &block.children, &mut errors);
    check_references(&block.references, &mut errors);

    ValidationReport::from_errors(errors)
}

pub fn validate_page(page: &PageRecord) -> ValidationReport {
    let mut errors = Vec::new();

    if page.name.trim().is_empty() {
        errors.push("Page identifier (name) is missing or empty".to_string());
    }

    check_timestamp("created", page.created.as_deref(), &mut errors);
    check_timestamp("updated", page.updated.as_deref(), &mut errors);
    check_id_list("blocks", &page.blocks, &mut errors);

    ValidationReport::from_errors(errors)
}

/// ISO-8601 date-time with or without offset, or a plain calendar date
fn is_iso8601(value: &str) -> bool {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value).is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

fn check_timestamp(label: &str, value: Option<&str>, errors: &mut Vec<String>) {
    match value {
        None => errors.push(format!("{label} timestamp is missing")),
        Some(ts) if !is_iso8601(ts) => {
            errors.push(format!("{label} timestamp is not ISO-8601: {ts:?}"))
        }
        Some(_) => {}
    }
}

fn check_id_list(field: &str, entries: &[ChildRef], errors: &mut Vec<String>) {
    for (index, entry) in entries.iter().enumerate() {
        match entry {
            ChildRef::Id(id) if id.trim().is_empty() => {
                errors.push(format!("{field}[{index}] is an empty identifier"))
            }
            ChildRef::Id(_) => {}
            ChildRef::Malformed(value) => {
                errors.push(format!("{field}[{index}] is not a string identifier: {value}"))
            }
        }
    }
}

fn check_references(references: &[Reference], errors: &mut Vec<String>) {
    for (index, reference) in references.iter().enumerate() {
        if reference.name.trim().is_empty() {
            errors.push(format!(
                "references[{index}] ({}) has an empty name",
                reference.kind
            ));
        }
    }
}
