//! `GET /healthCheck`.

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;

use crate::health::validator::{HealthReport, HealthStatus, HealthValidator};
use crate::http::handler::{Arguments, HandlerRef, Reply};
use crate::http::middleware::no_cache;
use crate::routing::declare::{ControllerDecl, ControllerDefinition};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub status: HealthStatus,
    pub other_modules: Vec<HealthReport>,
}

/// Run every validator concurrently; the worst status wins.
pub async fn check_all(validators: &[Arc<dyn HealthValidator>]) -> HealthSummary {
    let other_modules = join_all(validators.iter().map(|v| v.validate())).await;
    let status = other_modules
        .iter()
        .map(|r| r.status)
        .max()
        .unwrap_or(HealthStatus::Running);
    HealthSummary { status, other_modules }
}

#[derive(Clone, Default)]
pub struct HealthController {
    validators: Arc<Vec<Arc<dyn HealthValidator>>>,
}

impl HealthController {
    pub fn new(validators: Vec<Arc<dyn HealthValidator>>) -> Self {
        Self {
            validators: Arc::new(validators),
        }
    }
}

impl ControllerDefinition for HealthController {
    fn name(&self) -> &str {
        "HealthController"
    }

    fn declare(&self, controller: &mut ControllerDecl<'_>) {
        let validators = self.validators.clone();
        let handler = HandlerRef::new("getHealth", move |_args: Arguments| {
            let validators = validators.clone();
            async move {
                let summary = check_all(&validators).await;
                if summary.status != HealthStatus::Running {
                    tracing::warn!(status = ?summary.status, "Health check degraded");
                }
                Reply::json(&summary)
            }
        });

        controller
            .endpoint("getHealth")
            .get("/healthCheck")
            .success(200, "OK")
            .middleware(no_cache())
            .handler(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Fixed(HealthStatus);

    #[async_trait]
    impl HealthValidator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn description(&self) -> &str {
            "fixed status"
        }

        async fn validate(&self) -> HealthReport {
            self.report(self.0, "ok")
        }
    }

    #[tokio::test]
    async fn test_worst_status_wins() {
        let validators: Vec<Arc<dyn HealthValidator>> = vec![
            Arc::new(Fixed(HealthStatus::Running)),
            Arc::new(Fixed(HealthStatus::Failure)),
            Arc::new(Fixed(HealthStatus::Warning)),
        ];
        let summary = check_all(&validators).await;
        assert_eq!(summary.status, HealthStatus::Failure);
        assert_eq!(summary.other_modules.len(), 3);
    }

    #[tokio::test]
    async fn test_no_validators_is_running() {
        let summary = check_all(&[]).await;
        assert_eq!(summary.status, HealthStatus::Running);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json, serde_json::json!({"status": "Running", "otherModules": []}));
    }
}
