//! # Usage Tagging
//!
//! Stamps a batch of usage events with the ID of the billing period each
//! one belongs to.
//!
//! ## Flow
//! ```text
//! events ──► UsageTagger::tag ──► schedule.period_containing(ts)
//!                                      │
//!                       ┌──────────────┴──────────────┐
//!                       ▼                             ▼
//!                 Ok(period)                    Err(e)
//!                 tagged += (id, period_id)     skip → skipped += id, warn
//!                                               fail → UnassignableEvent
//! ```

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use meterline_core::PeriodId;

use crate::config::UnassignablePolicy;
use crate::error::{CycleError, CycleResult};
use crate::schedule::SubscriptionSchedule;

/// A metered event as it arrives from the ingestion side.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEvent<Tz: TimeZone> {
    pub id: String,
    pub timestamp: DateTime<Tz>,
}

impl<Tz: TimeZone> UsageEvent<Tz> {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Tz>) -> Self {
        UsageEvent {
            id: id.into(),
            timestamp,
        }
    }
}

/// An event paired with its period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedEvent {
    pub event_id: String,
    pub period_id: PeriodId,
}

/// Result of tagging one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggingReport {
    pub tagged: Vec<TaggedEvent>,

    /// IDs of events no period could hold, in input order.
    pub skipped: Vec<String>,
}

/// Tags events against one subscription schedule.
pub struct UsageTagger<'a, Tz: TimeZone> {
    schedule: &'a SubscriptionSchedule<Tz>,
    policy: UnassignablePolicy,
}

impl<'a, Tz: TimeZone> UsageTagger<'a, Tz> {
    pub fn new(schedule: &'a SubscriptionSchedule<Tz>, policy: UnassignablePolicy) -> Self {
        UsageTagger { schedule, policy }
    }

    /// Assigns every event a period ID.
    ///
    /// ## Errors
    /// Under [`UnassignablePolicy::Fail`], the first event that cannot be
    /// placed aborts the batch with [`CycleError::UnassignableEvent`].
    pub fn tag<I>(&self, events: I) -> CycleResult<TaggingReport>
    where
        I: IntoIterator<Item = UsageEvent<Tz>>,
    {
        let subscription_id = self.schedule.subscription_id();
        let mut report = TaggingReport::default();

        for event in events {
            match self.schedule.period_containing(&event.timestamp) {
                Ok(period) => {
                    let period_id = period.id()?;
                    debug!(subscription_id, event_id = %event.id, %period_id, "Tagged usage event");
                    report.tagged.push(TaggedEvent {
                        event_id: event.id,
                        period_id,
                    });
                }
                Err(err) => match self.policy {
                    UnassignablePolicy::Skip => {
                        warn!(
                            subscription_id,
                            event_id = %event.id,
                            error = %err,
                            "Skipping unassignable usage event"
                        );
                        report.skipped.push(event.id);
                    }
                    UnassignablePolicy::Fail => {
                        return Err(unassignable(event.id, err));
                    }
                },
            }
        }

        info!(
            subscription_id,
            tagged = report.tagged.len(),
            skipped = report.skipped.len(),
            "Tagged usage batch"
        );
        Ok(report)
    }
}

fn unassignable(event_id: String, err: CycleError) -> CycleError {
    match err {
        CycleError::Core(source) => CycleError::UnassignableEvent { event_id, source },
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
