/// DhikrLog entity for tracking counting sessions
///
/// One log records a full or partial session of one dhikr on one calendar
/// date. The completion workflow keeps at most one log per (dhikr, date).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{timestamp, CountMethod, DhikrId, DhikrLogId};

/// A record of counting a dhikr on a specific day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DhikrLog {
    pub id: DhikrLogId,
    /// Which dhikr this session was for
    pub dhikr_id: DhikrId,
    /// Calendar date of the session
    pub date: NaiveDate,
    /// Display string of the Hijri date, supplied by the caller
    #[serde(default)]
    pub hijri_date: String,
    pub count_completed: u32,
    /// Snapshot of the dhikr's repetitions when the log was written
    pub target_count: u32,
    /// `count_completed / target_count * 100`, within 0..=100
    pub completion_percentage: f64,
    #[serde(default)]
    pub method: CountMethod,
    #[serde(default)]
    pub duration_seconds: u64,
    #[serde(with = "timestamp")]
    pub created_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_date: Option<DateTime<Utc>>,
}

impl DhikrLog {
    /// Whether this session reached its target
    pub fn is_complete(&self) -> bool {
        self.target_count > 0 && self.count_completed >= self.target_count
    }
}

/// Input for creating a log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDhikrLog {
    pub dhikr_id: DhikrId,
    pub date: NaiveDate,
    pub hijri_date: String,
    pub count_completed: u32,
    pub target_count: u32,
    pub completion_percentage: f64,
    pub method: CountMethod,
    pub duration_seconds: u64,
}

/// Fields amended when a second session on the same day updates a log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DhikrLogPatch {
    pub count_completed: u32,
    pub target_count: u32,
    pub completion_percentage: f64,
    pub method: CountMethod,
    pub duration_seconds: u64,
}

/// How long an abandoned counter value stays restorable
pub const DRAFT_TTL_MINUTES: i64 = 60;

/// The live counter value of an unfinished session, kept so the counter can
/// resume where the user left off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub dhikr_id: DhikrId,
    pub count: u32,
    #[serde(with = "timestamp")]
    pub saved_at: DateTime<Utc>,
}

impl SessionDraft {
    /// Drafts older than an hour are stale and not restored
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.saved_at < chrono::Duration::minutes(DRAFT_TTL_MINUTES)
    }
}

/// Percentage of the target reached, clamped to 0..=100.
///
/// A zero target yields 0 rather than dividing by zero.
pub fn completion_percentage(count: u32, target: u32) -> f64 {
    if target == 0 {
        return 0.0;
    }
    (f64::from(count) / f64::from(target) * 100.0).clamp(0.0, 100.0)
}
