//! Journal page filtering for large graphs
//!
//! Daily journal pages pile up quickly. When a graph has more pages than the
//! configured threshold, journal pages older than the window are left out of
//! the full sync.

use chrono::{Duration, NaiveDate};
use kgsync_core::RawPage;
use tracing::debug;

/// Journal cut-off relative to a reference day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalWindow {
    cutoff: NaiveDate,
}

impl JournalWindow {
    /// Journals dated before `today - days` fall outside the window
    ///
    /// A window reaching past the earliest representable date keeps every
    /// journal.
    pub fn new(today: NaiveDate, days: i64) -> Self {
        let cutoff = Duration::try_days(days)
            .and_then(|span| today.checked_sub_signed(span))
            .unwrap_or(NaiveDate::MIN);
        Self { cutoff }
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Non-journal pages and undated journals are always kept
    pub fn keeps(&self, page: &RawPage) -> bool {
        if !page.journal {
            return true;
        }
        match page.journal_day.and_then(journal_date) {
            Some(date) => date >= self.cutoff,
            None => true,
        }
    }

    /// Drop out-of-window journals
    pub fn apply(&self, pages: Vec<RawPage>) -> Vec<RawPage> {
        let before = pages.len();
        let kept: Vec<RawPage> = pages.into_iter().filter(|p| self.keeps(p)).collect();
        debug!(
            cutoff = %self.cutoff,
            skipped = before - kept.len(),
            "Applied journal window"
        );
        kept
    }
}

/// `yyyymmdd` → date
fn journal_date(day: i64) -> Option<NaiveDate> {
    let year = i32::try_from(day / 10_000).ok()?;
    let month = u32::try_from((day / 100) % 100).ok()?;
    let dom = u32::try_from(day % 100).ok()?;
    NaiveDate::from_ymd_opt(year, month, dom)
}
