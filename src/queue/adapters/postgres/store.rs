//! `PostgreSQL` queue store implementation.
//!
//! The claim protocol runs inside a transaction that first takes a
//! process-agnostic advisory lock (`pg_advisory_xact_lock`) on a single
//! crate-wide key. Serializing claimers is what makes the per-queue
//! exclusivity check sound: row-level `FOR UPDATE SKIP LOCKED` alone cannot
//! stop two workers picking *different* rows of the same queue before
//! either commits. Claims are short; handlers run outside the transaction.

use super::{
    models::{NewTaskInstanceRow, TaskInstanceRow, row_to_instance, to_row},
    schema::task_instances,
};
use crate::queue::domain::{
    FailureOutcome, QueueName, RetryPolicy, TaskInstance, TaskInstanceId, TaskStatus, WorkerId,
};
use crate::queue::ports::{QueueStore, QueueStoreError, QueueStoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use diesel::dsl::not;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::BigInt;

/// `PostgreSQL` connection pool type used by queue adapters.
pub type QueuePgPool = Pool<ConnectionManager<PgConnection>>;

/// Advisory lock key serializing claim transactions.
const CLAIM_LOCK_KEY: i64 = 0x636f_6e76_6579;

/// `PostgreSQL`-backed queue store.
#[derive(Debug, Clone)]
pub struct PostgresQueueStore {
    pool: QueuePgPool,
    retry_policy: RetryPolicy,
}

impl From<DieselError> for QueueStoreError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl PostgresQueueStore {
    /// Creates a store from a connection pool with the default retry policy.
    #[must_use]
    pub fn new(pool: QueuePgPool) -> Self {
        Self {
            pool,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Creates a store with an explicit retry policy.
    #[must_use]
    pub const fn with_retry_policy(pool: QueuePgPool, retry_policy: RetryPolicy) -> Self {
        Self { pool, retry_policy }
    }

    async fn run_blocking<F, T>(&self, f: F) -> QueueStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> QueueStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(QueueStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(QueueStoreError::persistence)?
    }
}

fn load_for_update(
    connection: &mut PgConnection,
    instance_id: TaskInstanceId,
) -> QueueStoreResult<TaskInstance> {
    let row = task_instances::table
        .filter(task_instances::id.eq(instance_id.into_inner()))
        .select(TaskInstanceRow::as_select())
        .for_update()
        .first::<TaskInstanceRow>(connection)
        .optional()?
        .ok_or(QueueStoreError::NotFound(instance_id))?;
    row_to_instance(row)
}

fn write_back(connection: &mut PgConnection, instance: &TaskInstance) -> QueueStoreResult<()> {
    let row: NewTaskInstanceRow = to_row(instance);
    diesel::update(task_instances::table.filter(task_instances::id.eq(instance.id().into_inner())))
        .set(&row)
        .execute(connection)?;
    Ok(())
}

fn select_claim_candidate(
    connection: &mut PgConnection,
    now: DateTime<Utc>,
) -> QueueStoreResult<Option<TaskInstanceRow>> {
    let busy_queues: Vec<String> = task_instances::table
        .filter(task_instances::status.eq(TaskStatus::InFlight.as_str()))
        .select(task_instances::queue_name)
        .distinct()
        .load(connection)?;

    let claimable = [
        TaskStatus::Pending.as_str(),
        TaskStatus::FailedRetryable.as_str(),
    ];
    let row = task_instances::table
        .filter(task_instances::status.eq_any(claimable))
        .filter(task_instances::eligible_at.le(now))
        .filter(not(task_instances::queue_name.eq_any(busy_queues)))
        .order((
            task_instances::priority.desc(),
            task_instances::created_at.asc(),
        ))
        .select(TaskInstanceRow::as_select())
        .first::<TaskInstanceRow>(connection)
        .optional()?;
    Ok(row)
}

#[async_trait]
impl QueueStore for PostgresQueueStore {
    async fn insert(&self, instance: &TaskInstance) -> QueueStoreResult<()> {
        let instance_id = instance.id();
        let row = to_row(instance);
        self.run_blocking(move |connection| {
            diesel::insert_into(task_instances::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        QueueStoreError::DuplicateInstance(instance_id)
                    }
                    _ => QueueStoreError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn claim_next(
        &self,
        _worker: &WorkerId,
        now: DateTime<Utc>,
        visibility_timeout: Duration,
    ) -> QueueStoreResult<Option<TaskInstance>> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, QueueStoreError, _>(|conn| {
                diesel::sql_query("SELECT pg_advisory_xact_lock($1)")
                    .bind::<BigInt, _>(CLAIM_LOCK_KEY)
                    .execute(conn)?;

                let Some(row) = select_claim_candidate(conn, now)? else {
                    return Ok(None);
                };
                let mut instance = row_to_instance(row)?;
                instance.claim(visibility_timeout, now)?;
                write_back(conn, &instance)?;
                Ok(Some(instance))
            })
        })
        .await
    }

    async fn complete(&self, id: TaskInstanceId, now: DateTime<Utc>) -> QueueStoreResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, QueueStoreError, _>(|conn| {
                let mut instance = load_for_update(conn, id)?;
                instance.succeed(now)?;
                write_back(conn, &instance)
            })
        })
        .await
    }

    async fn fail(
        &self,
        id: TaskInstanceId,
        error: &str,
        now: DateTime<Utc>,
    ) -> QueueStoreResult<FailureOutcome> {
        let retry_policy = self.retry_policy;
        let message = error.to_owned();
        self.run_blocking(move |connection| {
            connection.transaction::<_, QueueStoreError, _>(|conn| {
                let mut instance = load_for_update(conn, id)?;
                let outcome = instance.record_failure(&message, &retry_policy, now)?;
                write_back(conn, &instance)?;
                Ok(outcome)
            })
        })
        .await
    }

    async fn reap(&self, now: DateTime<Utc>) -> QueueStoreResult<Vec<TaskInstanceId>> {
        let retry_policy = self.retry_policy;
        self.run_blocking(move |connection| {
            connection.transaction::<_, QueueStoreError, _>(|conn| {
                let expired: Vec<TaskInstanceRow> = task_instances::table
                    .filter(task_instances::status.eq(TaskStatus::InFlight.as_str()))
                    .filter(task_instances::visibility_deadline.le(now))
                    .select(TaskInstanceRow::as_select())
                    .for_update()
                    .load(conn)?;

                let mut reclaimed = Vec::with_capacity(expired.len());
                for row in expired {
                    let mut instance = row_to_instance(row)?;
                    instance.expire(&retry_policy, now)?;
                    write_back(conn, &instance)?;
                    reclaimed.push(instance.id());
                }
                Ok(reclaimed)
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskInstanceId) -> QueueStoreResult<Option<TaskInstance>> {
        self.run_blocking(move |connection| {
            let row = task_instances::table
                .filter(task_instances::id.eq(id.into_inner()))
                .select(TaskInstanceRow::as_select())
                .first::<TaskInstanceRow>(connection)
                .optional()?;
            row.map(row_to_instance).transpose()
        })
        .await
    }

    async fn count_by_status(
        &self,
        queue: &QueueName,
        status: TaskStatus,
    ) -> QueueStoreResult<usize> {
        let queue = queue.as_str().to_owned();
        self.run_blocking(move |connection| {
            let count: i64 = task_instances::table
                .filter(task_instances::queue_name.eq(queue))
                .filter(task_instances::status.eq(status.as_str()))
                .count()
                .get_result(connection)?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
        .await
    }
}
