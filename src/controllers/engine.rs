/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/controllers/engine.rs
*
* The reconciliation engine. It owns the statically ordered table of component
* reconcilers and runs one pass over one Workshop:
*
* - Addressing is derived first. If that fails, the pass aborts before any
*   component runs.
* - A Workshop being deleted gets the reverse teardown sequence and, once it
*   finishes cleanly, loses its finalizer. The forward sequence never runs
*   for it.
* - A live Workshop gets the finalizer (if missing) and then the forward
*   sequence, starting at the first component every time. `Done` advances,
*   `RetryLater` stops the pass at that component, `Fatal` aborts it and
*   propagates the cause. Nothing created earlier is rolled back.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{finalizer, routes};
use crate::components::{
    cert_manager::CertManager, codeready::CodeReady, gitea::Gitea, gitops::GitOps, identity::Identity,
    pipelines::Pipelines, portal::Portal, project::Project, serverless::Serverless,
    service_mesh::ServiceMesh, vault::Vault, ComponentReconciler, Pass, ReconcileOutcome,
};
use crate::config::ConsoleRoute;
use crate::crds::Workshop;
use crate::error::{Error, Result};
use crate::gateway::{ClusterGateway, WorkshopStore};
use crate::metrics;
use kube::ResourceExt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Running(usize),
    Blocked(usize),
    Aborted(String),
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Teardown,
}

/// What a pass did and where it stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub direction: Direction,
    pub state: PassState,
    /// Components invoked, in invocation order.
    pub invoked: Vec<&'static str>,
    /// Why the pass is blocked, when it is.
    pub reason: Option<String>,
    pub finalizer_removed: bool,
}

impl PassReport {
    fn new(direction: Direction) -> Self {
        Self {
            direction,
            state: PassState::Idle,
            invoked: Vec::new(),
            reason: None,
            finalizer_removed: false,
        }
    }

    /// The component the pass stopped at, if it stopped early.
    pub fn blocked_component(&self) -> Option<&'static str> {
        match self.state {
            PassState::Blocked(_) => self.invoked.last().copied(),
            _ => None,
        }
    }

    pub fn metric_result(&self) -> &'static str {
        match (&self.state, self.direction) {
            (PassState::Complete, Direction::Teardown) => "torn_down",
            (PassState::Complete, Direction::Forward) => "complete",
            (PassState::Aborted(_), _) => "aborted",
            _ => "blocked",
        }
    }

    fn transition(&mut self, next: PassState) {
        debug!(from = ?self.state, to = ?next, "Pass state");
        self.state = next;
    }
}

pub struct Engine {
    components: Vec<Box<dyn ComponentReconciler>>,
}

impl Engine {
    /// The production order: each component only depends on earlier ones.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(Portal),
            Box::new(Project),
            Box::new(Identity),
            Box::new(Gitea),
            Box::new(Pipelines),
            Box::new(GitOps),
            Box::new(CodeReady),
            Box::new(ServiceMesh),
            Box::new(Serverless),
            Box::new(Vault),
            Box::new(CertManager),
        ])
    }

    pub fn new(components: Vec<Box<dyn ComponentReconciler>>) -> Self {
        Self { components }
    }

    pub fn component_names(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// One full pass over `workshop`.
    pub async fn reconcile(
        &self,
        workshop: &Workshop,
        gateway: &dyn ClusterGateway,
        store: &dyn WorkshopStore,
        console_route: &ConsoleRoute,
    ) -> Result<PassReport> {
        let deleting = finalizer::is_deleting(workshop);
        if deleting && !finalizer::has_finalizer(workshop) {
            debug!(workshop = %workshop.name_any(), "Deleting without our finalizer, nothing to do");
            return Ok(PassReport::new(Direction::Teardown));
        }

        let routes = routes::discover(gateway, console_route).await?;

        if deleting {
            let pass = Pass::for_teardown(workshop, &routes, gateway)?;
            let mut report = self.run_teardown(&pass).await?;
            if report.state == PassState::Complete {
                finalizer::detach(store, workshop).await?;
                report.finalizer_removed = true;
            }
            return Ok(report);
        }

        finalizer::attach(store, workshop).await?;
        let pass = Pass::new(workshop, &routes, gateway)?;
        // The mark must be raised before anything for the new learners exists.
        if pass.users > workshop.recorded_users() {
            store
                .record_provisioned_users(workshop, pass.users)
                .await
                .map_err(|e| Error::StatusUpdateError(e.to_string()))?;
        }
        self.run_forward(&pass).await
    }

    /// Runs components in declared order, stopping at the first that is not `Done`.
    pub async fn run_forward(&self, pass: &Pass<'_>) -> Result<PassReport> {
        let mut report = PassReport::new(Direction::Forward);
        for (index, component) in self.components.iter().enumerate() {
            report.transition(PassState::Running(index));
            report.invoked.push(component.name());
            let outcome = component.reconcile(pass).await;
            if let Some(err) = Self::settle(&mut report, index, component.as_ref(), outcome) {
                return Err(err);
            }
            if report.state != PassState::Running(index) {
                return Ok(report);
            }
        }
        report.transition(PassState::Complete);
        info!(workshop = %pass.factory.workshop_name(), "All components reconciled");
        Ok(report)
    }

    /// Runs every component's teardown, last component first.
    pub async fn run_teardown(&self, pass: &Pass<'_>) -> Result<PassReport> {
        let mut report = PassReport::new(Direction::Teardown);
        for (index, component) in self.components.iter().enumerate().rev() {
            report.transition(PassState::Running(index));
            report.invoked.push(component.name());
            let outcome = component.teardown(pass).await;
            if let Some(err) = Self::settle(&mut report, index, component.as_ref(), outcome) {
                return Err(err);
            }
            if report.state != PassState::Running(index) {
                return Ok(report);
            }
        }
        report.transition(PassState::Complete);
        info!(workshop = %pass.factory.workshop_name(), "Teardown finished");
        Ok(report)
    }

    /// Applies one outcome to the report; returns the error for `Fatal`.
    fn settle(
        report: &mut PassReport,
        index: usize,
        component: &dyn ComponentReconciler,
        outcome: ReconcileOutcome,
    ) -> Option<Error> {
        metrics::COMPONENT_OUTCOMES_TOTAL
            .with_label_values(&[component.name(), outcome.label()])
            .inc();
        match outcome {
            ReconcileOutcome::Done => None,
            ReconcileOutcome::RetryLater(reason) => {
                info!(component = component.name(), %reason, "Pass blocked");
                report.reason = Some(reason);
                report.transition(PassState::Blocked(index));
                None
            }
            ReconcileOutcome::Fatal(err) => {
                warn!(component = component.name(), error = %err, "Pass aborted");
                report.transition(PassState::Aborted(err.to_string()));
                Some(Error::ComponentFailed {
                    component: component.name(),
                    source: Box::new(err),
                })
            }
        }
    }
}
