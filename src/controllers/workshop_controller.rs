/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/controllers/workshop_controller.rs
*
* The `kube-runtime` entry points for the Workshop resource. `reconcile`
* re-reads the Workshop, runs one engine pass, mirrors the result into
* `.status` and picks the requeue interval. `on_error` records the abort on
* the Workshop and backs off.
*
* Each pass runs in its own span. If the Workshop carries a W3C trace context
* in its annotations, the span is parented to it so a pass can be followed from
* whatever client triggered it.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::engine::{Direction, Engine, PassReport, PassState};
use crate::config::OperatorConfig;
use crate::crds::{Workshop, WorkshopPhase, WorkshopStatus};
use crate::error::{Error, Result};
use crate::gateway::{ClusterGateway, KubeGateway, WorkshopStore};
use crate::metrics;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn, Instrument};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Shared state handed to every reconcile call.
pub struct Context {
    pub gateway: KubeGateway,
    pub engine: Engine,
    pub config: OperatorConfig,
}

// Reads the trace context propagated through Workshop annotations.
struct AnnotationExtractor<'a>(&'a BTreeMap<String, String>);

impl<'a> opentelemetry::propagation::Extractor for AnnotationExtractor<'a> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|s| s.as_str()).collect()
    }
}

pub async fn reconcile(workshop: Arc<Workshop>, ctx: Arc<Context>) -> Result<Action> {
    let parent_context = TraceContextPropagator::new().extract(&AnnotationExtractor(workshop.annotations()));
    let span = tracing::info_span!(
        "reconcile_workshop",
        "workshop.name" = workshop.name_any().as_str(),
        "workshop.namespace" = workshop.namespace().unwrap_or_default().as_str()
    );
    span.set_parent(parent_context);

    async move {
        let started = Instant::now();
        let result = reconcile_with(&workshop, &ctx.gateway, &ctx.gateway, &ctx.engine, &ctx.config).await;
        metrics::RECONCILE_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());
        result
    }
    .instrument(span)
    .await
}

/// One pass against arbitrary backends.
pub async fn reconcile_with(
    workshop: &Workshop,
    gateway: &dyn ClusterGateway,
    store: &dyn WorkshopStore,
    engine: &Engine,
    config: &OperatorConfig,
) -> Result<Action> {
    let name = workshop.name_any();
    let namespace = workshop
        .namespace()
        .ok_or_else(|| Error::MissingNamespace(name.clone()))?;

    // The cached copy may be stale; finalizer writes need the live resourceVersion.
    let Some(current) = store.get_workshop(&namespace, &name).await? else {
        info!(workshop = %name, "Workshop is gone");
        return Ok(Action::await_change());
    };

    let report = match engine.reconcile(&current, gateway, store, &config.console_route).await {
        Ok(report) => report,
        Err(err) => {
            metrics::RECONCILE_PASSES_TOTAL.with_label_values(&["aborted"]).inc();
            metrics::RECONCILE_ERRORS_TOTAL
                .with_label_values(&[err.metric_label()])
                .inc();
            return Err(err);
        }
    };
    metrics::RECONCILE_PASSES_TOTAL
        .with_label_values(&[report.metric_result()])
        .inc();

    if let Some(status) = status_for(&report) {
        publish_status(store, &current, status).await?;
    }

    let action = next_action(&report, config);
    info!(workshop = %name, state = ?report.state, ?action, "Pass finished");
    Ok(action)
}

pub fn on_error(workshop: Arc<Workshop>, error: &Error, ctx: Arc<Context>) -> Action {
    warn!(workshop = %workshop.name_any(), error = %error, "Reconcile failed");

    let status = failed_status(error);
    let gateway = ctx.gateway.clone();
    tokio::spawn(async move {
        if let Err(e) = publish_status(&gateway, &workshop, status).await {
            warn!(workshop = %workshop.name_any(), error = %e, "Could not record failure on Workshop");
        }
    });

    Action::requeue(ctx.config.error_backoff)
}

/// The status a finished pass should leave behind, if any.
pub fn status_for(report: &PassReport) -> Option<WorkshopStatus> {
    match (&report.state, report.direction) {
        (PassState::Complete, Direction::Forward) => Some(WorkshopStatus {
            phase: Some(WorkshopPhase::Ready),
            message: Some("All components reconciled".to_string()),
            ..Default::default()
        }),
        (PassState::Blocked(_), direction) => Some(WorkshopStatus {
            phase: Some(match direction {
                Direction::Forward => WorkshopPhase::Blocked,
                Direction::Teardown => WorkshopPhase::Terminating,
            }),
            component: report.blocked_component().map(str::to_string),
            message: report.reason.clone(),
            ..Default::default()
        }),
        // Torn down but still finalized by someone else.
        (PassState::Complete, Direction::Teardown) if !report.finalizer_removed => Some(WorkshopStatus {
            phase: Some(WorkshopPhase::Terminating),
            message: Some("Teardown finished".to_string()),
            ..Default::default()
        }),
        _ => None,
    }
}

pub fn failed_status(error: &Error) -> WorkshopStatus {
    WorkshopStatus {
        phase: Some(WorkshopPhase::Failed),
        component: error.component().map(str::to_string),
        message: Some(error.to_string()),
        ..Default::default()
    }
}

pub fn next_action(report: &PassReport, config: &OperatorConfig) -> Action {
    match (&report.state, report.direction) {
        (PassState::Complete, Direction::Forward) => Action::requeue(config.resync_interval),
        (PassState::Blocked(_), _) => Action::requeue(config.retry_interval),
        _ => Action::await_change(),
    }
}

/// Writes `status` unless the Workshop already reports the same state.
async fn publish_status(store: &dyn WorkshopStore, workshop: &Workshop, mut status: WorkshopStatus) -> Result<()> {
    if workshop.status.as_ref().is_some_and(|s| s.same_state(&status)) {
        return Ok(());
    }
    status.last_transition_time = Some(chrono::Utc::now().to_rfc3339());
    store
        .patch_status(workshop, &status)
        .await
        .map_err(|e| Error::StatusUpdateError(e.to_string()))
}
