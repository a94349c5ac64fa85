use chrono::{DateTime, Utc};

/// Request-scoped identifiers for one webhook invocation.
///
/// The run id disambiguates documents created within the same invocation and
/// is threaded explicitly through the dispatch path. It must never be cached
/// across invocations: warm execution environments would otherwise leak a
/// previous request's id into new log records.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub received_at: DateTime<Utc>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        RunContext {
            // timestamp with millisecond precision, e.g. R240917-103418-692
            run_id: format!("R{}", now.format("%y%m%d-%H%M%S-%3f")),
            received_at: now,
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
