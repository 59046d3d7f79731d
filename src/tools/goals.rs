/// Goal management: create, edit, reset, delete and the goal board

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{parse_date, DhikrId, DomainError, Goal, GoalId, GoalType, NewGoal};
use crate::storage::{GoalRepository, RecordStore};
use crate::tools::{resolve_date, DeleteParams, ToolError};

/// Goal definition as supplied by a client
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GoalParams {
    pub title: String,
    pub description: Option<String>,
    /// daily_streak, dhikr_streak, total_count, specific_dhikr, combination or monthly_target
    pub goal_type: String,
    /// Days for streak goals, repetitions otherwise
    pub target_value: u64,
    /// Dhikr the goal listens to; required for dhikr_streak, specific_dhikr and combination
    #[serde(default)]
    pub dhikr_ids: Vec<String>,
    /// Shown when the goal is completed
    pub reward_message: Option<String>,
    /// YYYY-MM-DD, defaults to today
    pub start_date: Option<String>,
    /// YYYY-MM-DD, informational only
    pub end_date: Option<String>,
}

impl GoalParams {
    fn into_new_goal(self) -> Result<NewGoal, DomainError> {
        let dhikr_ids = self
            .dhikr_ids
            .iter()
            .map(|id| DhikrId::parse(id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(NewGoal {
            title: self.title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            goal_type: self.goal_type.parse::<GoalType>()?,
            target_value: self.target_value,
            dhikr_ids,
            reward_message: self.reward_message.filter(|m| !m.trim().is_empty()),
            start_date: self.start_date.as_deref().map(parse_date).transpose()?,
            end_date: self.end_date.as_deref().map(parse_date).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateGoalParams {
    #[serde(flatten)]
    pub goal: GoalParams,
    /// Today's date, YYYY-MM-DD (defaults to today, UTC)
    pub date: Option<String>,
}

pub fn create_goal<S: RecordStore>(storage: &S, params: CreateGoalParams) -> Result<Goal, ToolError> {
    let today = resolve_date(params.date.as_deref())?;
    let goal = storage.create_goal(params.goal.into_new_goal()?, today)?;
    info!("Created {} goal \"{}\" ({})", goal.goal_type(), goal.title, goal.id);
    Ok(goal)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EditGoalParams {
    pub goal_id: String,
    #[serde(flatten)]
    pub goal: GoalParams,
}

/// Replace a goal's definition; its progress is kept
pub fn edit_goal<S: RecordStore>(storage: &S, params: EditGoalParams) -> Result<Goal, ToolError> {
    let id = GoalId::parse(&params.goal_id)?;
    let goal = storage.edit_goal(id, params.goal.into_new_goal()?)?;
    info!("Edited goal {}", id);
    Ok(goal)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResetGoalParams {
    pub goal_id: String,
    /// New start date, YYYY-MM-DD (defaults to today, UTC)
    pub date: Option<String>,
}

/// Start a goal over from zero
pub fn reset_goal<S: RecordStore>(storage: &S, params: ResetGoalParams) -> Result<Goal, ToolError> {
    let id = GoalId::parse(&params.goal_id)?;
    let today = resolve_date(params.date.as_deref())?;
    let goal = storage.reset_goal(id, today)?;
    info!("Reset goal {}", id);
    Ok(goal)
}

pub fn delete_goal<S: RecordStore>(storage: &S, params: DeleteParams) -> Result<String, ToolError> {
    let id = GoalId::parse(&params.id)?;
    storage.delete_goal(id)?;
    Ok(format!("Deleted goal {}", id))
}

/// One goal with its progress percentage
#[derive(Debug, Serialize)]
pub struct GoalCard {
    #[serde(flatten)]
    pub goal: Goal,
    pub progress_percentage: f64,
}

impl From<Goal> for GoalCard {
    fn from(goal: Goal) -> Self {
        Self { progress_percentage: goal.progress_percentage(), goal }
    }
}

/// Goals split into in-progress and completed
#[derive(Debug, Serialize)]
pub struct GoalBoard {
    pub active: Vec<GoalCard>,
    pub completed: Vec<GoalCard>,
}

/// All goals, newest first, split by completion
pub fn goal_board<S: RecordStore>(storage: &S) -> Result<GoalBoard, ToolError> {
    let (completed, active): (Vec<Goal>, Vec<Goal>) = storage
        .list_goals(Some(usize::MAX))?
        .into_iter()
        .partition(|g| g.is_completed);

    Ok(GoalBoard {
        active: active.into_iter().map(GoalCard::from).collect(),
        completed: completed.into_iter().map(GoalCard::from).collect(),
    })
}
