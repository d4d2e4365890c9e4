//! Diesel schema for durable queue persistence.

diesel::table! {
    /// Task instance records and their execution state.
    task_instances (id) {
        /// Instance identifier.
        id -> Uuid,
        /// Task kind wire name.
        #[max_length = 100]
        kind -> Varchar,
        /// Schema-validated payload.
        payload -> Jsonb,
        /// Queue the instance is serialized under.
        #[max_length = 255]
        queue_name -> Varchar,
        /// Scheduling priority; higher is claimed sooner.
        priority -> Int4,
        /// Attempts recorded so far.
        attempts -> Int4,
        /// Attempt ceiling.
        max_attempts -> Int4,
        /// Execution status.
        #[max_length = 50]
        status -> Varchar,
        /// Most recent handler error.
        last_error -> Nullable<Text>,
        /// Earliest claimable time.
        eligible_at -> Timestamptz,
        /// Visibility deadline of the active claim.
        visibility_deadline -> Nullable<Timestamptz>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// When the last attempt began.
        last_attempted_at -> Nullable<Timestamptz>,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
