use std::time::Duration;

/// Tunable knobs for a running broker instance.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Path of the rendezvous pipe clients register against.
    ///
    /// Default: `/tmp/mbroker`
    pub register_pipe_path: String,

    /// Number of worker threads pulled from the registration queue.
    ///
    /// Default: 4
    pub worker_count: usize,

    /// Capacity of the bounded registration queue, analogous to the
    /// original `max_sessions / 2` sizing.
    ///
    /// Default: 16
    pub queue_capacity: usize,

    /// How long a worker waits on an empty queue before re-checking the
    /// shutdown flag.
    ///
    /// Default: 200ms
    pub shutdown_poll_interval: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            register_pipe_path: "/tmp/mbroker".to_string(),
            worker_count: 4,
            queue_capacity: 16,
            shutdown_poll_interval: Duration::from_millis(200),
        }
    }
}

impl BrokerConfig {
    pub fn with_register_pipe_path(mut self, path: impl Into<String>) -> Self {
        self.register_pipe_path = path.into();
        self
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}
