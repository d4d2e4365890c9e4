//! Application services for event dispatch and registration.

mod dispatch;
mod handlers;
mod registration;

pub use dispatch::{EventDispatchError, EventDispatchResult, EventDispatchService};
pub use handlers::{EventTaskHandler, RegistrationTaskHandler};
pub use registration::{RegistrationError, RegistrationResult, RegistrationService};
