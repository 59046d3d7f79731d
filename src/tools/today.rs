/// The "today" view: which dhikr to put in front of the user

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{Dhikr, DhikrId};
use crate::storage::{DhikrRepository, LogRepository, RecordStore};
use crate::tools::ToolError;

/// How many dhikr the today view shows
pub const TODAY_SELECTION_SIZE: usize = 3;

/// How many recent logs are scanned for activity
const RECENT_LOG_WINDOW: usize = 100;

#[derive(Debug, Serialize)]
pub struct TodaySelection {
    pub dhikr: Vec<Dhikr>,
}

/// Up to three active dhikr, most recently practised first.
///
/// Dhikr with recent logs come first, ordered by their latest log. Remaining
/// slots are filled with the other active dhikr by priority.
pub fn today_selection<S: RecordStore>(storage: &S) -> Result<TodaySelection, ToolError> {
    let mut last_logged: HashMap<DhikrId, DateTime<Utc>> = HashMap::new();
    for log in storage.recent_logs(RECENT_LOG_WINDOW)? {
        last_logged
            .entry(log.dhikr_id)
            .and_modify(|at| *at = (*at).max(log.created_date))
            .or_insert(log.created_date);
    }

    // Already in priority order
    let active = storage.list_active_dhikr()?;
    let (mut practised, rest): (Vec<Dhikr>, Vec<Dhikr>) =
        active.into_iter().partition(|d| last_logged.contains_key(&d.id));
    practised.sort_by(|a, b| last_logged[&b.id].cmp(&last_logged[&a.id]));

    let dhikr = practised
        .into_iter()
        .chain(rest)
        .take(TODAY_SELECTION_SIZE)
        .collect();

    Ok(TodaySelection { dhikr })
}
