pub mod error;
pub mod model;
pub mod policy;
pub mod service;

pub use error::QuotaServiceError;
pub use model::{Plan, UsageRecord};
pub use policy::{decide, QuotaDecision, QuotaExceeded, WEEKLY_LIMIT, WEEK_IN_MS};
pub use service::{QuotaService, QuotaServiceApi};
