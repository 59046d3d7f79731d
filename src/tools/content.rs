/// Content cards and crescent sightings

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{parse_date, ContentType, CrescentSighting, IslamicContent, NewCrescentSighting, SightingId};
use crate::storage::{ContentRepository, RecordStore, SightingRepository, DEFAULT_LIST_LIMIT};
use crate::tools::{parse_opt, DeleteParams, ToolError};

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ContentListParams {
    /// hadith, tafsir, fiqh, wisdom or biography
    pub content_type: Option<String>,
    /// Maximum number of results (default 100)
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ContentListResponse {
    pub content: Vec<IslamicContent>,
    pub total: usize,
}

/// Content cards, newest first, optionally of one type
pub fn content_list<S: RecordStore>(storage: &S, params: ContentListParams) -> Result<ContentListResponse, ToolError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let content = match parse_opt::<ContentType>(params.content_type.as_deref())? {
        Some(content_type) => {
            let mut of_type = storage.content_of_type(content_type)?;
            of_type.sort_by(|a, b| b.created_date.cmp(&a.created_date));
            of_type.truncate(limit);
            of_type
        }
        None => storage.list_content(Some(limit))?,
    };
    Ok(ContentListResponse { total: content.len(), content })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CrescentRecordParams {
    /// Gregorian date of the sighting, YYYY-MM-DD
    pub gregorian_date: String,
    /// Name of the Hijri month that begins
    pub hijri_month: String,
    pub hijri_year: i32,
    /// Whether the crescent was actually seen (default true)
    pub is_sighted: Option<bool>,
    pub location: Option<String>,
}

pub fn crescent_record<S: RecordStore>(
    storage: &S,
    params: CrescentRecordParams,
) -> Result<CrescentSighting, ToolError> {
    let new = NewCrescentSighting {
        gregorian_date: parse_date(&params.gregorian_date)?,
        hijri_month: params.hijri_month.trim().to_string(),
        hijri_year: params.hijri_year,
        is_sighted: params.is_sighted.unwrap_or(true),
        location: params.location.filter(|l| !l.trim().is_empty()),
    };

    let sighting = storage.record_sighting(&new)?;
    info!("Recorded crescent sighting for {} {}", sighting.hijri_month, sighting.hijri_year);
    Ok(sighting)
}

/// All sightings, latest date first
pub fn crescent_list<S: RecordStore>(storage: &S) -> Result<Vec<CrescentSighting>, ToolError> {
    Ok(storage.list_sightings()?)
}

pub fn crescent_delete<S: RecordStore>(storage: &S, params: DeleteParams) -> Result<String, ToolError> {
    let id = SightingId::parse(&params.id)?;
    storage.delete_sighting(id)?;
    Ok(format!("Deleted crescent sighting {}", id))
}
