//! Shared fixtures for queue tests.

use crate::queue::domain::{QueueName, TaskInstance, TaskInstanceId, TaskKind};
use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use serde_json::json;
use std::sync::Mutex;

/// Deterministic clock that only moves when a test advances it.
#[derive(Debug)]
pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
}

impl FakeClock {
    /// Creates a clock pinned at a fixed reference instant.
    pub fn fixed() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .expect("valid reference timestamp");
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, delta: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += delta;
    }
}

impl Clock for FakeClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Builds a pending instance of an arbitrary internal kind.
pub fn pending_instance(queue: &str, priority: i32, max_attempts: u32, clock: &FakeClock) -> TaskInstance {
    TaskInstance::enqueued(
        TaskInstanceId::new(),
        TaskKind::ScheduleEmail,
        json!({"to": "user@example.com", "subject": "hi", "body": "there"}),
        QueueName::from(queue),
        priority,
        max_attempts,
        clock,
    )
}
