//! Store availability check.

use std::sync::Arc;

use async_trait::async_trait;

use crate::health::validator::{HealthReport, HealthStatus, HealthValidator};
use crate::store::StationStore;

pub struct StoreHealthCheck {
    store: Arc<dyn StationStore>,
}

impl StoreHealthCheck {
    pub fn new(store: Arc<dyn StationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HealthValidator for StoreHealthCheck {
    fn name(&self) -> &str {
        "Datamart Store"
    }

    fn description(&self) -> &str {
        "Station and readings store"
    }

    async fn validate(&self) -> HealthReport {
        match self.store.ping().await {
            Ok(()) => self.report(HealthStatus::Running, "Datamart is available"),
            Err(e) => {
                tracing::warn!(error = %e, "Store health check failed");
                self.report(
                    HealthStatus::Failure,
                    format!("Failed to connect to the Datamart store: {e}"),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_reports_store_state() {
        let store = Arc::new(MemoryStore::default());
        let check = StoreHealthCheck::new(store.clone());
        assert_eq!(check.validate().await.status, HealthStatus::Running);

        store.set_available(false);
        let report = check.validate().await;
        assert_eq!(report.status, HealthStatus::Failure);
        assert!(report.message.unwrap().contains("offline"));
    }
}
