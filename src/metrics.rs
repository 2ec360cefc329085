/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/metrics.rs
*
* This module defines and registers the custom Prometheus metrics that the
* workshop-operator exposes. They show how reconcile passes end, which
* components keep blocking or failing, and how many objects the operator
* creates on the cluster's behalf.
*
* Using `lazy_static`, the metrics are created only once and are available
* globally and safely across concurrent reconcile passes and the metrics
* server.
*
* SPDX-License-Identifier: Apache-2.0
*/

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, Histogram, IntCounterVec, Registry,
};

// --- Metric Definitions ---

lazy_static! {
    /// Finished reconcile passes, labeled by how they ended:
    /// `complete`, `blocked`, `aborted` or `torn_down`.
    pub static ref RECONCILE_PASSES_TOTAL: IntCounterVec =
        register_int_counter_vec!(
            "workshop_reconcile_passes_total",
            "Total number of Workshop reconcile passes, by result.",
            &["result"]
        ).unwrap();

    /// Component reconciler invocations, labeled by component and outcome.
    pub static ref COMPONENT_OUTCOMES_TOTAL: IntCounterVec =
        register_int_counter_vec!(
            "workshop_component_outcomes_total",
            "Total number of component reconciler outcomes.",
            &["component", "outcome"]
        ).unwrap();

    /// Wall-clock duration of whole passes, in seconds.
    pub static ref RECONCILE_DURATION_SECONDS: Histogram =
        register_histogram!(
            "workshop_reconcile_duration_seconds",
            "Duration of Workshop reconcile passes.",
            vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
        ).unwrap();

    /// Aborted passes, labeled by the kind of error that stopped them.
    pub static ref RECONCILE_ERRORS_TOTAL: IntCounterVec =
        register_int_counter_vec!(
            "workshop_reconcile_errors_total",
            "Total number of aborted Workshop reconcile passes, by error.",
            &["error"]
        ).unwrap();

    /// Objects created on the cluster (AlreadyExists is not counted).
    pub static ref RESOURCES_CREATED_TOTAL: IntCounterVec =
        register_int_counter_vec!(
            "workshop_resources_created_total",
            "Total number of objects created, by kind.",
            &["kind"]
        ).unwrap();
}

/// Creates a new Prometheus registry and registers all custom metrics.
///
/// This function is intended to be called once at operator startup.
pub fn create_and_register_metrics() -> Result<Registry, prometheus::Error> {
    let r = Registry::new();
    r.register(Box::new(RECONCILE_PASSES_TOTAL.clone()))?;
    r.register(Box::new(COMPONENT_OUTCOMES_TOTAL.clone()))?;
    r.register(Box::new(RECONCILE_DURATION_SECONDS.clone()))?;
    r.register(Box::new(RECONCILE_ERRORS_TOTAL.clone()))?;
    r.register(Box::new(RESOURCES_CREATED_TOTAL.clone()))?;
    Ok(r)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_exposes_all_metrics() {
        RECONCILE_PASSES_TOTAL.with_label_values(&["complete"]).inc();
        COMPONENT_OUTCOMES_TOTAL.with_label_values(&["portal", "done"]).inc();
        RECONCILE_DURATION_SECONDS.observe(0.2);
        RECONCILE_ERRORS_TOTAL.with_label_values(&["addressing"]).inc();
        RESOURCES_CREATED_TOTAL.with_label_values(&["Namespace"]).inc();

        let registry = create_and_register_metrics().unwrap();
        let names: Vec<String> = registry.gather().iter().map(|f| f.get_name().to_string()).collect();
        for expected in [
            "workshop_reconcile_passes_total",
            "workshop_component_outcomes_total",
            "workshop_reconcile_duration_seconds",
            "workshop_reconcile_errors_total",
            "workshop_resources_created_total",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }
}
