//! Backpressure policies for a full entry queue
//!
//! When producers outrun the sinks the queue fills up. The policy decides
//! whether `Dispatcher::log` waits for space or refuses the entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// What `Dispatcher::log` does when the queue is full
///
/// # Example
///
/// ```
/// use telemetry_pipeline::BackpressurePolicy;
/// use std::time::Duration;
///
/// // Default behavior: wait for space, never drop
/// let policy = BackpressurePolicy::default();
/// assert_eq!(policy, BackpressurePolicy::Block);
///
/// let policy = BackpressurePolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BackpressurePolicy {
    /// Wait until space is available.
    ///
    /// Producers slow down to the pace of the sinks; no entry is lost.
    /// Shutdown wakes waiting producers with a `PipelineStopped` error.
    #[default]
    Block,

    /// Wait for space at most this long, then refuse with `QueueFull`.
    BlockWithTimeout(#[serde(with = "millis")] Duration),

    /// Refuse immediately with `QueueFull`.
    Reject,
}

impl fmt::Display for BackpressurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackpressurePolicy::Block => write!(f, "Block"),
            BackpressurePolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            BackpressurePolicy::Reject => write!(f, "Reject"),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
