//! Document store metrics collection.

use metrics::{counter, histogram};
use std::time::Instant;

/// Record how long a store call took.
pub fn record_store_call(operation: &str, collection: &str, duration_secs: f64) {
    histogram!(
        "store_request_duration_seconds",
        "operation" => operation.to_string(),
        "collection" => collection.to_string()
    )
    .record(duration_secs);
}

/// Count a failed store call.
pub fn record_store_error(operation: &str, collection: &str) {
    counter!(
        "store_request_errors_total",
        "operation" => operation.to_string(),
        "collection" => collection.to_string()
    )
    .increment(1);
}

/// Times a store call and records it on completion.
///
/// ```ignore
/// let timer = StoreTimer::new("get_document", "members");
/// let result = self.send(request).await;
/// timer.finish(result.is_ok());
/// ```
pub struct StoreTimer {
    operation: &'static str,
    collection: String,
    start: Instant,
}

impl StoreTimer {
    pub fn new(operation: &'static str, collection: impl Into<String>) -> Self {
        Self {
            operation,
            collection: collection.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration, counting an error when `ok` is false.
    pub fn finish(self, ok: bool) {
        record_store_call(
            self.operation,
            &self.collection,
            self.start.elapsed().as_secs_f64(),
        );
        if !ok {
            record_store_error(self.operation, &self.collection);
        }
    }
}
