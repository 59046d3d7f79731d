/// Goal entity and the goal kinds
///
/// A goal is a user-defined target. Its progress-accounting rule depends on its
/// kind, and each kind carries only the bookkeeping fields its rule needs:
/// streak kinds keep a streak counter, the monthly kind keeps the month it is
/// counting, and the dhikr-bound kinds keep the dhikr they listen to.
///
/// On disk a goal is one flat record with a `goal_type` discriminator.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{timestamp, DhikrId, DomainError, GoalId, MonthKey};

/// A user-defined target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The progress rule and its bookkeeping
    #[serde(flatten)]
    pub kind: GoalKind,
    /// Days for streak kinds, repetitions for the counting kinds
    pub target_value: u64,
    #[serde(default)]
    pub current_value: u64,
    #[serde(default)]
    pub is_completed: bool,
    /// Last date progress was counted
    #[serde(default)]
    pub last_activity_date: Option<NaiveDate>,
    /// Shown to the user when the goal completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_message: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Informational only, never enforced
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(with = "timestamp")]
    pub created_date: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_date: Option<DateTime<Utc>>,
}

/// Goal kinds with their kind-specific state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "goal_type", rename_all = "snake_case")]
pub enum GoalKind {
    /// Consecutive days with any completion
    DailyStreak {
        #[serde(default)]
        streak_count: u32,
        #[serde(default)]
        last_reset_date: Option<NaiveDate>,
    },
    /// Consecutive days completing one of the selected dhikr
    DhikrStreak {
        #[serde(default)]
        dhikr_ids: Vec<DhikrId>,
        #[serde(default)]
        streak_count: u32,
        #[serde(default)]
        last_reset_date: Option<NaiveDate>,
    },
    /// Cumulative repetitions across every dhikr
    TotalCount,
    /// Cumulative repetitions of the designated dhikr
    SpecificDhikr {
        #[serde(default)]
        dhikr_ids: Vec<DhikrId>,
        #[serde(default)]
        dhikr_id: Option<DhikrId>,
    },
    /// Cumulative repetitions of any dhikr in a set
    Combination {
        #[serde(default)]
        dhikr_ids: Vec<DhikrId>,
    },
    /// Repetitions within the current calendar month
    MonthlyTarget {
        #[serde(default)]
        current_month: Option<MonthKey>,
        #[serde(default)]
        monthly_progress: u64,
        #[serde(default)]
        last_reset_date: Option<NaiveDate>,
    },
}

/// The goal kind without its state, as chosen when creating or editing a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    DailyStreak,
    DhikrStreak,
    TotalCount,
    SpecificDhikr,
    Combination,
    MonthlyTarget,
}

impl GoalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::DailyStreak => "daily_streak",
            GoalType::DhikrStreak => "dhikr_streak",
            GoalType::TotalCount => "total_count",
            GoalType::SpecificDhikr => "specific_dhikr",
            GoalType::Combination => "combination",
            GoalType::MonthlyTarget => "monthly_target",
        }
    }

    /// Kinds that only make sense with a dhikr selection
    pub fn requires_dhikr_selection(&self) -> bool {
        matches!(
            self,
            GoalType::DhikrStreak | GoalType::SpecificDhikr | GoalType::Combination
        )
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GoalType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily_streak" => Ok(GoalType::DailyStreak),
            "dhikr_streak" => Ok(GoalType::DhikrStreak),
            "total_count" => Ok(GoalType::TotalCount),
            "specific_dhikr" => Ok(GoalType::SpecificDhikr),
            "combination" => Ok(GoalType::Combination),
            "monthly_target" => Ok(GoalType::MonthlyTarget),
            other => Err(DomainError::Validation {
                message: format!(
                    "Invalid goal type '{}'. Valid options: daily_streak, dhikr_streak, total_count, specific_dhikr, combination, monthly_target",
                    other
                ),
            }),
        }
    }
}

impl GoalKind {
    pub fn goal_type(&self) -> GoalType {
        match self {
            GoalKind::DailyStreak { .. } => GoalType::DailyStreak,
            GoalKind::DhikrStreak { .. } => GoalType::DhikrStreak,
            GoalKind::TotalCount => GoalType::TotalCount,
            GoalKind::SpecificDhikr { .. } => GoalType::SpecificDhikr,
            GoalKind::Combination { .. } => GoalType::Combination,
            GoalKind::MonthlyTarget { .. } => GoalType::MonthlyTarget,
        }
    }
}

impl Goal {
    pub fn goal_type(&self) -> GoalType {
        self.kind.goal_type()
    }

    /// Dhikr selection of the dhikr-bound kinds; empty for the others
    pub fn dhikr_ids(&self) -> &[DhikrId] {
        match &self.kind {
            GoalKind::DhikrStreak { dhikr_ids, .. }
            | GoalKind::SpecificDhikr { dhikr_ids, .. }
            | GoalKind::Combination { dhikr_ids } => dhikr_ids,
            _ => &[],
        }
    }

    pub fn streak_count(&self) -> u32 {
        match self.kind {
            GoalKind::DailyStreak { streak_count, .. } | GoalKind::DhikrStreak { streak_count, .. } => {
                streak_count
            }
            _ => 0,
        }
    }

    pub fn last_reset_date(&self) -> Option<NaiveDate> {
        match self.kind {
            GoalKind::DailyStreak { last_reset_date, .. }
            | GoalKind::DhikrStreak { last_reset_date, .. }
            | GoalKind::MonthlyTarget { last_reset_date, .. } => last_reset_date,
            _ => None,
        }
    }

    pub fn current_month(&self) -> Option<MonthKey> {
        match self.kind {
            GoalKind::MonthlyTarget { current_month, .. } => current_month,
            _ => None,
        }
    }

    pub fn monthly_progress(&self) -> u64 {
        match self.kind {
            GoalKind::MonthlyTarget { monthly_progress, .. } => monthly_progress,
            _ => 0,
        }
    }

    /// Whether a completion of `dhikr_id` counts towards this goal.
    ///
    /// Daily streak, total count and monthly goals count every dhikr. A dhikr
    /// streak counts only its selection. Any other kind with a selection counts
    /// only its selection; a specific-dhikr goal without one falls back to its
    /// single designated dhikr.
    pub fn applies_to(&self, dhikr_id: DhikrId) -> bool {
        match &self.kind {
            GoalKind::DailyStreak { .. } | GoalKind::TotalCount | GoalKind::MonthlyTarget { .. } => true,
            GoalKind::DhikrStreak { dhikr_ids, .. } => dhikr_ids.contains(&dhikr_id),
            GoalKind::SpecificDhikr { dhikr_ids, .. } if !dhikr_ids.is_empty() => {
                dhikr_ids.contains(&dhikr_id)
            }
            GoalKind::SpecificDhikr { dhikr_id: designated, .. } => *designated == Some(dhikr_id),
            GoalKind::Combination { dhikr_ids } => dhikr_ids.contains(&dhikr_id),
        }
    }

    /// Progress towards the target as a percentage, capped at 100
    pub fn progress_percentage(&self) -> f64 {
        if self.target_value == 0 {
            return 0.0;
        }
        (self.current_value as f64 / self.target_value as f64 * 100.0).min(100.0)
    }
}

/// Input for creating or editing a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGoal {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub goal_type: GoalType,
    pub target_value: u64,
    #[serde(default)]
    pub dhikr_ids: Vec<DhikrId>,
    #[serde(default)]
    pub reward_message: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl NewGoal {
    pub fn new(title: impl Into<String>, goal_type: GoalType, target_value: u64) -> Self {
        Self {
            title: title.into(),
            description: None,
            goal_type,
            target_value,
            dhikr_ids: Vec::new(),
            reward_message: None,
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_dhikr(mut self, dhikr_ids: Vec<DhikrId>) -> Self {
        self.dhikr_ids = dhikr_ids;
        self
    }

    /// Validate the definition and shape the dhikr selection for its kind.
    ///
    /// Kinds that count every dhikr drop any selection; a specific-dhikr goal
    /// designates the first selected dhikr.
    pub fn validate(&self) -> Result<(), DomainError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DomainError::InvalidText("Goal title cannot be empty".to_string()));
        }
        if title.chars().count() > 200 {
            return Err(DomainError::InvalidText(
                "Goal title cannot be longer than 200 characters".to_string(),
            ));
        }
        if self.target_value == 0 {
            return Err(DomainError::InvalidValue {
                message: "Target value must be greater than 0".to_string(),
            });
        }
        if self.goal_type.requires_dhikr_selection() && self.dhikr_ids.is_empty() {
            return Err(DomainError::MissingDhikrSelection {
                goal_type: self.goal_type.to_string(),
            });
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(DomainError::InvalidDate(
                    "End date cannot be before the start date".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Fresh kind state for this definition
    pub fn initial_kind(&self) -> GoalKind {
        match self.goal_type {
            GoalType::DailyStreak => GoalKind::DailyStreak {
                streak_count: 0,
                last_reset_date: None,
            },
            GoalType::DhikrStreak => GoalKind::DhikrStreak {
                dhikr_ids: self.dhikr_ids.clone(),
                streak_count: 0,
                last_reset_date: None,
            },
            GoalType::TotalCount => GoalKind::TotalCount,
            GoalType::SpecificDhikr => GoalKind::SpecificDhikr {
                dhikr_ids: self.dhikr_ids.clone(),
                dhikr_id: self.dhikr_ids.first().copied(),
            },
            GoalType::Combination => GoalKind::Combination {
                dhikr_ids: self.dhikr_ids.clone(),
            },
            GoalType::MonthlyTarget => GoalKind::MonthlyTarget {
                current_month: None,
                monthly_progress: 0,
                last_reset_date: None,
            },
        }
    }

    /// Record body for a brand new goal, starting today unless a start date was given
    pub fn into_draft(self, today: NaiveDate) -> Result<GoalDraft, DomainError> {
        self.validate()?;
        Ok(GoalDraft {
            kind: self.initial_kind(),
            title: self.title.trim().to_string(),
            description: self.description,
            target_value: self.target_value,
            current_value: 0,
            is_completed: false,
            reward_message: self.reward_message,
            start_date: Some(self.start_date.unwrap_or(today)),
            end_date: self.end_date,
        })
    }

    /// Patch for editing the definitional fields of an existing goal.
    ///
    /// Progress is kept; completion is re-evaluated against the new target.
    pub fn into_definition_patch(self, current_value: u64) -> Result<GoalDefinitionPatch, DomainError> {
        self.validate()?;
        let dhikr_ids = match self.goal_type {
            GoalType::DailyStreak | GoalType::TotalCount | GoalType::MonthlyTarget => Vec::new(),
            _ => self.dhikr_ids,
        };
        let dhikr_id = match self.goal_type {
            GoalType::SpecificDhikr => dhikr_ids.first().copied(),
            _ => None,
        };
        Ok(GoalDefinitionPatch {
            title: self.title.trim().to_string(),
            description: self.description,
            goal_type: self.goal_type,
            target_value: self.target_value,
            is_completed: current_value >= self.target_value,
            dhikr_ids,
            dhikr_id,
            reward_message: self.reward_message,
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

/// Body of a goal about to be created
#[derive(Debug, Clone, Serialize)]
pub struct GoalDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: GoalKind,
    pub target_value: u64,
    pub current_value: u64,
    pub is_completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_message: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Definitional fields written when a goal is edited
#[derive(Debug, Clone, Serialize)]
pub struct GoalDefinitionPatch {
    pub title: String,
    pub description: Option<String>,
    pub goal_type: GoalType,
    pub target_value: u64,
    pub is_completed: bool,
    pub dhikr_ids: Vec<DhikrId>,
    pub dhikr_id: Option<DhikrId>,
    pub reward_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_selection_required_for_bound_kinds() {
        for goal_type in [GoalType::DhikrStreak, GoalType::SpecificDhikr, GoalType::Combination] {
            let result = NewGoal::new("Goal", goal_type, 10).validate();
            assert!(matches!(result, Err(DomainError::MissingDhikrSelection { .. })));
        }
        assert!(NewGoal::new("Goal", GoalType::TotalCount, 10).validate().is_ok());
    }

    #[test]
    fn test_zero_target_is_rejected() {
        assert!(NewGoal::new("Goal", GoalType::TotalCount, 0).validate().is_err());
    }

    #[test]
    fn test_draft_shapes_selection_by_kind() {
        let a = DhikrId::new();
        let b = DhikrId::new();

        let draft = NewGoal::new("Specific", GoalType::SpecificDhikr, 100)
            .with_dhikr(vec![a, b])
            .into_draft(today())
            .unwrap();
        assert_eq!(
            draft.kind,
            GoalKind::SpecificDhikr { dhikr_ids: vec![a, b], dhikr_id: Some(a) }
        );
        assert_eq!(draft.start_date, Some(today()));

        let draft = NewGoal::new("Total", GoalType::TotalCount, 100)
            .with_dhikr(vec![a])
            .into_draft(today())
            .unwrap();
        assert_eq!(draft.kind, GoalKind::TotalCount);
    }

    #[test]
    fn test_flat_record_round_trip() {
        let record = json!({
            "id": GoalId::new(),
            "title": "Seven days",
            "goal_type": "daily_streak",
            "target_value": 7,
            "current_value": 2,
            "streak_count": 2,
            "last_reset_date": "2024-01-02",
            "last_activity_date": "2024-01-02",
            "monthly_progress": 40,
            "created_date": "2024-01-01T00:00:00.000000Z"
        });

        let goal: Goal = serde_json::from_value(record).unwrap();
        assert_eq!(goal.goal_type(), GoalType::DailyStreak);
        assert_eq!(goal.streak_count(), 2);
        assert_eq!(goal.monthly_progress(), 0);

        let back = serde_json::to_value(&goal).unwrap();
        assert_eq!(back["goal_type"], "daily_streak");
        assert_eq!(back["streak_count"], 2);
        assert!(back.get("monthly_progress").is_none());
    }

    #[test]
    fn test_unknown_goal_type_does_not_decode() {
        let record = json!({
            "id": GoalId::new(),
            "title": "Mystery",
            "goal_type": "weekly_marathon",
            "target_value": 7,
            "created_date": "2024-01-01T00:00:00.000000Z"
        });
        assert!(serde_json::from_value::<Goal>(record).is_err());
    }

    #[test]
    fn test_applicability() {
        let a = DhikrId::new();
        let b = DhikrId::new();
        let goal = |kind: GoalKind| Goal {
            id: GoalId::new(),
            title: "g".to_string(),
            description: None,
            kind,
            target_value: 10,
            current_value: 0,
            is_completed: false,
            last_activity_date: None,
            reward_message: None,
            start_date: None,
            end_date: None,
            created_date: Utc::now(),
            updated_date: None,
        };

        assert!(goal(GoalKind::TotalCount).applies_to(b));
        let streak = goal(GoalKind::DhikrStreak { dhikr_ids: vec![a], streak_count: 0, last_reset_date: None });
        assert!(streak.applies_to(a));
        assert!(!streak.applies_to(b));

        let designated = goal(GoalKind::SpecificDhikr { dhikr_ids: vec![], dhikr_id: Some(b) });
        assert!(designated.applies_to(b));
        assert!(!designated.applies_to(a));

        let empty_combo = goal(GoalKind::Combination { dhikr_ids: vec![] });
        assert!(!empty_combo.applies_to(a));
    }
}
