//! Diesel row models for queue persistence.

use super::schema::task_instances;
use crate::queue::domain::{
    PersistedTaskInstanceData, QueueName, TaskInstance, TaskInstanceId, TaskKind, TaskStatus,
};
use crate::queue::ports::{QueueStoreError, QueueStoreResult};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for task instance records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = task_instances)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskInstanceRow {
    /// Instance identifier.
    pub id: uuid::Uuid,
    /// Task kind wire name.
    pub kind: String,
    /// Schema-validated payload.
    pub payload: Value,
    /// Queue the instance is serialized under.
    pub queue_name: String,
    /// Scheduling priority.
    pub priority: i32,
    /// Attempts recorded so far.
    pub attempts: i32,
    /// Attempt ceiling.
    pub max_attempts: i32,
    /// Execution status.
    pub status: String,
    /// Most recent handler error.
    pub last_error: Option<String>,
    /// Earliest claimable time.
    pub eligible_at: DateTime<Utc>,
    /// Visibility deadline of the active claim.
    pub visibility_deadline: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When the last attempt began.
    pub last_attempted_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for task instance records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = task_instances)]
#[diesel(treat_none_as_null = true)]
pub struct NewTaskInstanceRow {
    /// Instance identifier.
    pub id: uuid::Uuid,
    /// Task kind wire name.
    pub kind: String,
    /// Schema-validated payload.
    pub payload: Value,
    /// Queue the instance is serialized under.
    pub queue_name: String,
    /// Scheduling priority.
    pub priority: i32,
    /// Attempts recorded so far.
    pub attempts: i32,
    /// Attempt ceiling.
    pub max_attempts: i32,
    /// Execution status.
    pub status: String,
    /// Most recent handler error.
    pub last_error: Option<String>,
    /// Earliest claimable time.
    pub eligible_at: DateTime<Utc>,
    /// Visibility deadline of the active claim.
    pub visibility_deadline: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// When the last attempt began.
    pub last_attempted_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Maps an aggregate to its row representation.
pub fn to_row(instance: &TaskInstance) -> NewTaskInstanceRow {
    NewTaskInstanceRow {
        id: instance.id().into_inner(),
        kind: instance.kind().as_str().to_owned(),
        payload: instance.payload().clone(),
        queue_name: instance.queue_name().as_str().to_owned(),
        priority: instance.priority(),
        attempts: i32::try_from(instance.attempts()).unwrap_or(i32::MAX),
        max_attempts: i32::try_from(instance.max_attempts()).unwrap_or(i32::MAX),
        status: instance.status().as_str().to_owned(),
        last_error: instance.last_error().map(str::to_owned),
        eligible_at: instance.eligible_at(),
        visibility_deadline: instance.visibility_deadline(),
        created_at: instance.created_at(),
        last_attempted_at: instance.last_attempted_at(),
        updated_at: instance.updated_at(),
    }
}

/// Reconstructs an aggregate from its row representation.
///
/// # Errors
///
/// Returns [`QueueStoreError::Persistence`] when the row holds a kind or
/// status string the domain does not recognize.
pub fn row_to_instance(row: TaskInstanceRow) -> QueueStoreResult<TaskInstance> {
    let TaskInstanceRow {
        id,
        kind,
        payload,
        queue_name,
        priority,
        attempts,
        max_attempts,
        status,
        last_error,
        eligible_at,
        visibility_deadline,
        created_at,
        last_attempted_at,
        updated_at,
    } = row;

    let kind = TaskKind::try_from(kind.as_str()).map_err(QueueStoreError::persistence)?;
    let status = TaskStatus::try_from(status.as_str()).map_err(QueueStoreError::persistence)?;

    Ok(TaskInstance::from_persisted(PersistedTaskInstanceData {
        id: TaskInstanceId::from_uuid(id),
        kind,
        payload,
        queue_name: QueueName::new(queue_name),
        priority,
        attempts: u32::try_from(attempts).unwrap_or(0),
        max_attempts: u32::try_from(max_attempts).unwrap_or(1),
        status,
        last_error,
        eligible_at,
        visibility_deadline,
        created_at,
        last_attempted_at,
        updated_at,
    }))
}
