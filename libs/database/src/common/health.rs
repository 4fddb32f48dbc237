use std::time::Instant;

/// Outcome of a backend health probe
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Backend label ("relational", "mongodb")
    pub backend: &'static str,

    /// Whether the probe succeeded
    pub healthy: bool,

    /// Error message when unhealthy
    pub message: Option<String>,

    /// Round-trip time in milliseconds
    pub response_time_ms: u64,
}

impl HealthStatus {
    pub fn healthy(backend: &'static str, response_time_ms: u64) -> Self {
        Self {
            backend,
            healthy: true,
            message: None,
            response_time_ms,
        }
    }

    pub fn unhealthy(backend: &'static str, message: String, response_time_ms: u64) -> Self {
        Self {
            backend,
            healthy: false,
            message: Some(message),
            response_time_ms,
        }
    }

    /// Build a status from a probe result and the instant the probe started
    pub fn from_probe<E: std::fmt::Display>(
        backend: &'static str,
        started: Instant,
        result: Result<(), E>,
    ) -> Self {
        let elapsed = started.elapsed().as_millis() as u64;
        match result {
            Ok(()) => Self::healthy(backend, elapsed),
            Err(e) => Self::unhealthy(backend, e.to_string(), elapsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_from_probe() {
        let ok = HealthStatus::from_probe::<String>("relational", Instant::now(), Ok(()));
        assert!(ok.healthy);
        assert!(ok.message.is_none());
        assert_eq!(ok.backend, "relational");

        let failed = HealthStatus::from_probe("mongodb", Instant::now(), Err("refused"));
        assert!(!failed.healthy);
        assert_eq!(failed.message.as_deref(), Some("refused"));
    }
}
