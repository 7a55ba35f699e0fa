//! HTTP handlers for profiler-service.

pub mod categories;
pub mod health;
pub mod metrics;
pub mod quiz;

pub use categories::list_categories;
pub use health::{health_check, readiness_check};
pub use metrics::metrics;
pub use quiz::{get_test, start_test, submit_test};
