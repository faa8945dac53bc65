//! Reference extraction
//!
//! Four independent matchers run over the same block text. A span can be
//! picked up by more than one matcher (`#[[tag page]]` yields a page reference,
//! `tags:: [[x]]` yields both a property and a page reference); overlapping
//! results are kept as-is.
//!
//! Output is grouped by matcher in registration order: every page reference
//! first, then block references, tags and property keys, each group in
//! document order.

use super::types::{Reference, ReferenceKind};
use regex::Regex;
use std::sync::LazyLock;

static PAGE_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("page reference regex"));

static BLOCK_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\((.*?)\)\)").expect("block reference regex"));

static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([a-zA-Z0-9_-]+)").expect("tag regex"));

static PROPERTY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([^:\r\n]+)::(.*)$").expect("property regex"));

static DEFAULT_EXTRACTOR: LazyLock<ReferenceExtractor> = LazyLock::new(ReferenceExtractor::new);

/// Extract every reference from block text using the default matchers.
///
/// Total: empty text yields an empty list.
pub fn extract_references(content: &str) -> Vec<Reference> {
    DEFAULT_EXTRACTOR.extract(content)
}

/// One reference syntax
pub trait ReferenceMatcher: Send + Sync {
    /// Kind of reference this matcher produces
    fn kind(&self) -> ReferenceKind;

    /// Cheap pre-check before running the regex
    fn can_handle(&self, content: &str) -> bool;

    /// Append every match in `content` to `out`, in document order
    fn collect(&self, content: &str, out: &mut Vec<Reference>);
}

/// Captures the first group of `regex`, trims it and drops empty keys when
/// `keep_empty` is false.
fn collect_captures(
    regex: &Regex,
    kind: ReferenceKind,
    content: &str,
    keep_empty: bool,
    out: &mut Vec<Reference>,
) {
    for cap in regex.captures_iter(content) {
        let Some(inner) = cap.get(1) else {
            continue;
        };
        let name = inner.as_str().trim();
        if name.is_empty() && !keep_empty {
            continue;
        }
        out.push(Reference::new(kind, name));
    }
}

/// `[[page name]]`
#[derive(Debug, Default, Clone, Copy)]
pub struct PageRefMatcher;

impl ReferenceMatcher for PageRefMatcher {
    fn kind(&self) -> ReferenceKind {
        ReferenceKind::Page
    }

    fn can_handle(&self, content: &str) -> bool {
        content.contains("[[")
    }

    fn collect(&self, content: &str, out: &mut Vec<Reference>) {
        // `[[ ]]` is kept so validation can flag it
        collect_captures(&PAGE_REF_REGEX, self.kind(), content, true, out);
    }
}

/// `((block-uuid))`
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockRefMatcher;

impl ReferenceMatcher for BlockRefMatcher {
    fn kind(&self) -> ReferenceKind {
        ReferenceKind::Block
    }

    fn can_handle(&self, content: &str) -> bool {
        content.contains("((")
    }

    fn collect(&self, content: &str, out: &mut Vec<Reference>) {
        collect_captures(&BLOCK_REF_REGEX, self.kind(), content, true, out);
    }
}

/// `#tag`, the `#` itself is not part of the name
#[derive(Debug, Default, Clone, Copy)]
pub struct TagMatcher;

impl ReferenceMatcher for TagMatcher {
    fn kind(&self) -> ReferenceKind {
        ReferenceKind::Tag
    }

    fn can_handle(&self, content: &str) -> bool {
        content.contains('#')
    }

    fn collect(&self, content: &str, out: &mut Vec<Reference>) {
        collect_captures(&TAG_REGEX, self.kind(), content, false, out);
    }
}

/// `key:: value` lines. Only the key becomes a reference; references inside
/// the value are found by the other matchers.
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyMatcher;

impl ReferenceMatcher for PropertyMatcher {
    fn kind(&self) -> ReferenceKind {
        ReferenceKind::Property
    }

    fn can_handle(&self, content: &str) -> bool {
        content.contains("::")
    }

    fn collect(&self, content: &str, out: &mut Vec<Reference>) {
        collect_captures(&PROPERTY_REGEX, self.kind(), content, false, out);
    }
}

/// Ordered set of matchers
pub struct ReferenceExtractor {
    matchers: Vec<Box<dyn ReferenceMatcher>>,
}

impl ReferenceExtractor {
    /// Page, block, tag and property matchers, in that order
    pub fn new() -> Self {
        Self::empty()
            .with_matcher(PageRefMatcher)
            .with_matcher(BlockRefMatcher)
            .with_matcher(TagMatcher)
            .with_matcher(PropertyMatcher)
    }

    /// Extractor with no matchers registered
    pub fn empty() -> Self {
        Self {
            matchers: Vec::new(),
        }
    }

    /// Append a matcher; its results come after every earlier matcher's
    pub fn with_matcher(mut self, matcher: impl ReferenceMatcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    /// Kinds produced, in output order
    pub fn kinds(&self) -> Vec<ReferenceKind> {
        self.matchers.iter().map(|m| m.kind()).collect()
    }

    pub fn extract(&self, content: &str) -> Vec<Reference> {
        let mut references = Vec::new();
        if content.is_empty() {
            return references;
        }

        for matcher in &self.matchers {
            if matcher.can_handle(content) {
                matcher.collect(content, &mut references);
            }
        }

        references
    }
}

impl Default for ReferenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}
