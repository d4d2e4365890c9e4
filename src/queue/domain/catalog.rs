//! Task definitions, queue routing rules, and the catalog.

use super::{QueueDomainError, QueueName, TaskInstanceId, TaskKind, TaskPayload, ValidationError};
use serde_json::Value;
use std::collections::HashMap;

/// Reserved queue for low-priority housekeeping tasks.
pub const INTERNAL_QUEUE: &str = "internal-queue";

/// Reserved queue serializing run admission.
pub const EXECUTIONS_QUEUE: &str = "executions";

/// Reserved queue serializing event fan-out.
pub const EVENT_DISPATCHER_QUEUE: &str = "event-dispatcher";

/// Rule computing which named queue an enqueued instance belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueRouting {
    /// Each instance gets its own queue; no cross-instance serialization.
    Anonymous,
    /// Every instance of the kind shares one named queue.
    Constant(QueueName),
    /// Instances share a queue per resource key: `<prefix>:<key>`.
    PerResource {
        /// Queue name prefix, e.g. `runs` or `tasks`.
        prefix: &'static str,
    },
}

impl QueueRouting {
    /// Resolves the queue name for one enqueued instance.
    ///
    /// Resolution happens exactly once, at enqueue time; the instance keeps
    /// its queue name for its whole lifetime, including retries.
    ///
    /// # Errors
    ///
    /// Returns [`QueueDomainError::MissingResourceKey`] when a per-resource
    /// rule is configured for a payload without a resource key.
    pub fn queue_for(
        &self,
        payload: &TaskPayload,
        instance_id: TaskInstanceId,
    ) -> Result<QueueName, QueueDomainError> {
        match self {
            Self::Anonymous => Ok(QueueName::new(format!("instance:{instance_id}"))),
            Self::Constant(name) => Ok(name.clone()),
            Self::PerResource { prefix } => payload
                .resource_key()
                .map(|key| QueueName::new(format!("{prefix}:{key}")))
                .ok_or(QueueDomainError::MissingResourceKey(payload.kind())),
        }
    }
}

/// Immutable, process-wide execution policy for one task kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDefinition {
    kind: TaskKind,
    routing: QueueRouting,
    priority: i32,
    max_attempts: u32,
}

impl TaskDefinition {
    /// Creates a definition with the crate-wide defaults: anonymous routing,
    /// priority 0, three attempts.
    #[must_use]
    pub const fn new(kind: TaskKind) -> Self {
        Self {
            kind,
            routing: QueueRouting::Anonymous,
            priority: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets the routing rule.
    #[must_use]
    pub fn with_routing(mut self, routing: QueueRouting) -> Self {
        self.routing = routing;
        self
    }

    /// Sets the scheduling priority; higher is scheduled sooner.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the attempt ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`QueueDomainError::InvalidMaxAttempts`] when `max_attempts`
    /// is zero.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Result<Self, QueueDomainError> {
        if max_attempts == 0 {
            return Err(QueueDomainError::InvalidMaxAttempts(self.kind));
        }
        self.max_attempts = max_attempts;
        Ok(self)
    }

    /// Returns the kind the definition governs.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns the routing rule.
    #[must_use]
    pub const fn routing(&self) -> &QueueRouting {
        &self.routing
    }

    /// Returns the scheduling priority.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns the attempt ceiling.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the built-in definition for a kind.
    ///
    /// Routing, priority, and attempt ceilings follow the production
    /// catalog: run admission tolerates many transient infrastructure
    /// failures (13 attempts) while run execution is deliberately
    /// non-retryable at the queue layer.
    #[must_use]
    pub fn builtin(kind: TaskKind) -> Self {
        let base = Self::new(kind);
        match kind {
            TaskKind::OrganizationCreated | TaskKind::StartInitialProjectDeployment => base
                .with_routing(QueueRouting::Constant(QueueName::from(INTERNAL_QUEUE)))
                .with_priority(50),
            TaskKind::IndexEndpoint => {
                base.with_routing(QueueRouting::Constant(QueueName::from(INTERNAL_QUEUE)))
            }
            TaskKind::ScheduleEmail => base
                .with_routing(QueueRouting::Constant(QueueName::from(INTERNAL_QUEUE)))
                .with_priority(100),
            TaskKind::StartRun => Self {
                max_attempts: 13,
                ..base.with_routing(QueueRouting::Constant(QueueName::from(EXECUTIONS_QUEUE)))
            },
            TaskKind::PerformRunExecution => Self {
                max_attempts: 1,
                ..base.with_routing(QueueRouting::PerResource { prefix: "runs" })
            },
            TaskKind::PerformTaskOperation => {
                base.with_routing(QueueRouting::PerResource { prefix: "tasks" })
            }
            TaskKind::StartQueuedRuns => {
                base.with_routing(QueueRouting::PerResource { prefix: "queue" })
            }
            TaskKind::DeliverEvent => base.with_routing(QueueRouting::Constant(QueueName::from(
                EVENT_DISPATCHER_QUEUE,
            ))),
            TaskKind::DeliverHttpSourceRequest | TaskKind::DeliverScheduled => Self {
                max_attempts: 5,
                ..base
            },
            TaskKind::RunFinished
            | TaskKind::RegisterSource
            | TaskKind::RegisterDynamicTrigger
            | TaskKind::RegisterDynamicSchedule
            | TaskKind::ActivateSource
            | TaskKind::InvokeDispatcher => base,
        }
    }
}

/// Default attempt ceiling for kinds that do not override it.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// A kind resolved against the catalog: the validated payload plus the
/// definition governing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTask {
    /// Schema-validated payload.
    pub payload: TaskPayload,
    /// Definition governing routing, priority, and attempts.
    pub definition: TaskDefinition,
}

/// Static registry mapping each task kind to its execution policy.
///
/// The catalog starts from the built-in definitions; embedders may override
/// individual kinds at construction, never at runtime.
#[derive(Debug, Clone, Default)]
pub struct TaskCatalog {
    overrides: HashMap<TaskKind, TaskDefinition>,
}

impl TaskCatalog {
    /// Creates a catalog holding the built-in definitions.
    #[must_use]
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Replaces the definition for one kind.
    #[must_use]
    pub fn with_definition(mut self, definition: TaskDefinition) -> Self {
        self.overrides.insert(definition.kind(), definition);
        self
    }

    /// Returns the effective definition for a kind.
    #[must_use]
    pub fn definition(&self, kind: TaskKind) -> TaskDefinition {
        self.overrides
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| TaskDefinition::builtin(kind))
    }

    /// Validates a JSON payload against a kind and pairs it with the
    /// kind's definition.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the payload violates the kind's
    /// schema; no instance is created in that case.
    pub fn resolve(&self, kind: TaskKind, payload: &Value) -> Result<ResolvedTask, ValidationError> {
        let parsed = kind.parse_payload(payload)?;
        Ok(ResolvedTask {
            payload: parsed,
            definition: self.definition(kind),
        })
    }
}
