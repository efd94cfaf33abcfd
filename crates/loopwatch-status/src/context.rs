//! Read-only view over a report collection pinned to an evaluation instant.

use chrono::{DateTime, Utc};

use crate::model::StatusReport;

#[derive(Debug, Clone, Copy)]
pub struct StatusWindow<'a> {
    reports: &'a [StatusReport],
    now: DateTime<Utc>,
}

impl<'a> StatusWindow<'a> {
    pub fn new(reports: &'a [StatusReport], now: DateTime<Utc>) -> Self {
        Self { reports, now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn reports(&self) -> &'a [StatusReport] {
        self.reports
    }

    /// Reports uploaded at or before `now`, in input order.
    pub fn visible(&self) -> impl Iterator<Item = &'a StatusReport> + 'a {
        let now = self.now;
        self.reports
            .iter()
            .filter(move |report| report.created_at <= now)
    }

    /// Newest report of any shape at or before `now`.
    pub fn latest_at_or_before(&self) -> Option<&'a StatusReport> {
        latest_created(self.visible())
    }

    /// Newest report at or before `now` from exactly `device`.
    pub fn latest_for_device(&self, device: &str) -> Option<&'a StatusReport> {
        latest_created(self.visible().filter(|report| report.device == device))
    }
}

/// Picks the report with the greatest `created_at`; ties go to the later input.
pub(crate) fn latest_created<'a>(
    reports: impl Iterator<Item = &'a StatusReport>,
) -> Option<&'a StatusReport> {
    reports.fold(None, |best, report| match best {
        Some(current) if current.created_at > report.created_at => Some(current),
        _ => Some(report),
    })
}
