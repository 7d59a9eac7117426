//! Pipeline configuration.

use crate::error::PipelineError;

/// Tuning knobs for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of pool workers
    pub workers: usize,

    /// Capacity of the work and sink queues (dispatch backpressure)
    pub queue_capacity: usize,

    /// Drop records whose normalized body was already emitted
    pub dedup: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            queue_capacity: 64,
            dedup: true,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the queue capacity.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Enable or disable deduplication.
    pub fn with_dedup(mut self, dedup: bool) -> Self {
        self.dedup = dedup;
        self
    }

    /// Reject configurations the coordinator cannot run with.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.workers == 0 {
            return Err(PipelineError::InvalidConfig {
                reason: "worker count must be at least 1".into(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(PipelineError::InvalidConfig {
                reason: "queue capacity must be at least 1".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let config = PipelineConfig::new().with_workers(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builders_chain() {
        let config = PipelineConfig::new()
            .with_workers(8)
            .with_queue_capacity(128)
            .with_dedup(false);
        assert_eq!(config.workers, 8);
        assert_eq!(config.queue_capacity, 128);
        assert!(!config.dedup);
    }
}
