//! Health validator contract.

use async_trait::async_trait;
use serde::Serialize;

/// Ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HealthStatus {
    Running,
    Warning,
    Failure,
}

/// Result of one validator run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub name: String,
    pub description: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

#[async_trait]
pub trait HealthValidator: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn validate(&self) -> HealthReport;

    fn report(&self, status: HealthStatus, message: impl Into<String>) -> HealthReport
    where
        Self: Sized,
    {
        HealthReport {
            name: self.name().to_string(),
            description: self.description().to_string(),
            status,
            message: Some(message.into()),
        }
    }
}
