//! Shared handler state and health tracking.

use std::sync::{Mutex, MutexGuard};

use tracing::warn;
use visamap_core::PolicyGateway;
use visamap_publish::{ArtifactReader, Publisher};
use visamap_telemetry::Metrics;

/// Dependencies shared by every handler.
pub(crate) struct ApiState {
    pub(crate) gateway: PolicyGateway,
    pub(crate) publisher: Publisher,
    pub(crate) reader: ArtifactReader,
    pub(crate) telemetry: Metrics,
    health_status: Mutex<Vec<String>>,
}

impl ApiState {
    pub(crate) const fn new(
        gateway: PolicyGateway,
        publisher: Publisher,
        reader: ArtifactReader,
        telemetry: Metrics,
    ) -> Self {
        Self {
            gateway,
            publisher,
            reader,
            telemetry,
            health_status: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add_degraded_component(&self, component: &str) {
        let mut guard = self.lock_health();
        if !guard.iter().any(|entry| entry == component) {
            guard.push(component.to_string());
            guard.sort();
            warn!(component, "component marked degraded");
        }
    }

    pub(crate) fn remove_degraded_component(&self, component: &str) {
        let mut guard = self.lock_health();
        guard.retain(|entry| entry != component);
    }

    pub(crate) fn current_health_degraded(&self) -> Vec<String> {
        self.lock_health().clone()
    }

    fn lock_health(&self) -> MutexGuard<'_, Vec<String>> {
        self.health_status
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
