//! Aggregation inputs and tuning.

use alloy_primitives::Address;

use crate::error::{AggregateError, Result};

/// Default forward allowance added to the window end, in milliseconds.
pub const DEFAULT_CLOCK_SKEW_MS: i64 = 120_000;

/// Default number of avatars scanned at once.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Tuning for an aggregation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub clock_skew_ms: i64,
    pub concurrency: usize,
    /// Chunk budget per avatar walk.
    pub max_chunks: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            clock_skew_ms: DEFAULT_CLOCK_SKEW_MS,
            concurrency: DEFAULT_CONCURRENCY,
            max_chunks: catena_log::DEFAULT_MAX_CHUNKS,
        }
    }
}

/// Inclusive `signed_at` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Whether `signed_at` falls in `[start, end + skew]`.
    pub fn contains(&self, signed_at: i64, skew: i64) -> bool {
        signed_at >= self.start && signed_at <= self.end.saturating_add(skew)
    }
}

/// One aggregation over a set of avatars under an operator scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRequest {
    /// Operator scope id; also the namespace key read from each avatar.
    pub operator: String,
    pub avatars: Vec<Address>,
    pub chain_id: u64,
    pub window: TimeWindow,
}

impl AggregateRequest {
    pub fn new(
        operator: impl Into<String>,
        avatars: Vec<Address>,
        chain_id: u64,
        window: TimeWindow,
    ) -> Self {
        Self {
            operator: operator.into(),
            avatars,
            chain_id,
            window,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        catena_core::validation::validate_namespace_key(&self.operator)
            .map_err(|e| AggregateError::InvalidRequest(e.to_string()))?;
        if self.window.start > self.window.end {
            return Err(AggregateError::InvalidRequest(format!(
                "window start {} after end {}",
                self.window.start, self.window.end
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_edges() {
        let window = TimeWindow::new(100, 200);
        let skew = 50;

        assert!(window.contains(100, skew));
        assert!(window.contains(250, skew));
        assert!(!window.contains(251, skew));
        assert!(!window.contains(99, skew));
    }

    #[test]
    fn test_window_saturates() {
        let window = TimeWindow::new(0, i64::MAX);
        assert!(window.contains(i64::MAX, DEFAULT_CLOCK_SKEW_MS));
    }

    #[test]
    fn test_request_validation() {
        let ok = AggregateRequest::new("market", vec![], 1, TimeWindow::new(0, 10));
        assert!(ok.validate().is_ok());

        let inverted = AggregateRequest::new("market", vec![], 1, TimeWindow::new(10, 0));
        assert!(matches!(inverted.validate(), Err(AggregateError::InvalidRequest(_))));

        let unnamed = AggregateRequest::new("", vec![], 1, TimeWindow::new(0, 10));
        assert!(matches!(unnamed.validate(), Err(AggregateError::InvalidRequest(_))));
    }
}
