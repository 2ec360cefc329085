/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/mod.rs
*
* The component reconciler contract and the step driver shared by all eleven
* platform components.
*
* Architecture:
* - A component describes its footprint as an ordered list of `Step`s built
*   fresh from the Workshop on every pass (`plan`). Planning is pure.
* - `reconcile` walks the plan: each `Create` is create-if-absent, each gate
*   (`AwaitInstall`, `LinkIdentity`) may stop the component with `RetryLater`
*   before any later step is attempted.
* - `teardown` walks the same plan backwards and deletes what `Create` steps
*   would have created. Objects that are already gone count as deleted.
* - Components that are disabled return `Done` without planning or touching
*   the cluster. Disabling never deletes anything.
*
* SPDX-License-Identifier: Apache-2.0
*/

pub mod cert_manager;
pub mod codeready;
pub mod gitea;
pub mod gitops;
pub mod identity;
pub mod olm;
pub mod pipelines;
pub mod portal;
pub mod project;
pub mod serverless;
pub mod service_mesh;
pub mod vault;

use crate::controllers::routes::ExternalRouteInfo;
use crate::crds::{Workshop, WorkshopSpec};
use crate::error::{Error, Result};
use crate::gateway::{ClusterGateway, CreateOutcome, DeleteOutcome};
use crate::metrics;
use crate::resources::olm::{GLOBAL_OPERATORS_NAMESPACE, OperatorInstall};
use crate::resources::{builders, kinds, GeneratedResource, ResourceFactory, ResourceKind};
use async_trait::async_trait;
use tracing::{debug, info};

/// Result of one component reconciler invocation.
#[derive(Debug)]
pub enum ReconcileOutcome {
    Done,
    /// A dependency is not ready yet; carries a human-readable reason.
    RetryLater(String),
    Fatal(Error),
}

impl ReconcileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ReconcileOutcome::Done => "done",
            ReconcileOutcome::RetryLater(_) => "retry_later",
            ReconcileOutcome::Fatal(_) => "fatal",
        }
    }
}

/// Whether a component's gates let it finish this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Waiting(String),
}

impl From<Result<Readiness>> for ReconcileOutcome {
    fn from(result: Result<Readiness>) -> Self {
        match result {
            Ok(Readiness::Ready) => ReconcileOutcome::Done,
            Ok(Readiness::Waiting(reason)) => ReconcileOutcome::RetryLater(reason),
            Err(e) => ReconcileOutcome::Fatal(e),
        }
    }
}

/// One unit of a component's footprint.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Create(GeneratedResource),
    /// Approve the operator's install plan before anything after this step.
    AwaitInstall(OperatorInstall),
    /// Bind a learner's identity to their User once the User has a uid.
    LinkIdentity { provider: String, username: String },
}

/// Everything a component needs for one pass over one Workshop.
pub struct Pass<'a> {
    pub workshop: &'a Workshop,
    pub routes: &'a ExternalRouteInfo,
    pub users: u32,
    pub gateway: &'a dyn ClusterGateway,
    pub factory: ResourceFactory,
}

impl<'a> Pass<'a> {
    pub fn new(
        workshop: &'a Workshop,
        routes: &'a ExternalRouteInfo,
        gateway: &'a dyn ClusterGateway,
    ) -> Result<Self> {
        Ok(Self {
            workshop,
            routes,
            users: workshop.spec.user_count(),
            gateway,
            factory: ResourceFactory::for_workshop(workshop)?,
        })
    }

    /// Like `new`, but the learner range also covers learners that were
    /// provisioned earlier and have since been dropped from the spec.
    pub fn for_teardown(
        workshop: &'a Workshop,
        routes: &'a ExternalRouteInfo,
        gateway: &'a dyn ClusterGateway,
    ) -> Result<Self> {
        let mut pass = Self::new(workshop, routes, gateway)?;
        pass.users = workshop.provisioned_user_count();
        Ok(pass)
    }

    pub fn spec(&self) -> &WorkshopSpec {
        &self.workshop.spec
    }

    pub fn learners(&self) -> impl Iterator<Item = (u32, String)> {
        (1..=self.users).map(|i| (i, learner_name(i)))
    }

    /// Create-if-absent. `AlreadyExists` is as good as `Created`.
    pub async fn ensure(&self, component: &str, resource: &GeneratedResource) -> Result<CreateOutcome> {
        let outcome = self.gateway.create(resource).await?;
        match outcome {
            CreateOutcome::Created => {
                metrics::RESOURCES_CREATED_TOTAL
                    .with_label_values(&[resource.kind.kind])
                    .inc();
                info!(component, resource = %resource.display_id(), "Created");
            }
            CreateOutcome::AlreadyExists => {
                debug!(component, resource = %resource.display_id(), "AlreadyExists");
            }
        }
        Ok(outcome)
    }

    /// Delete-if-present. `NotFound` is as good as `Deleted`.
    pub async fn remove(
        &self,
        component: &str,
        kind: &'static ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<DeleteOutcome> {
        let outcome = self.gateway.delete(kind, name, namespace).await?;
        match outcome {
            DeleteOutcome::Deleted => info!(component, kind = kind.kind, name, ?namespace, "Deleted"),
            DeleteOutcome::NotFound => debug!(component, kind = kind.kind, name, ?namespace, "NotFound"),
        }
        Ok(outcome)
    }

    /// Namespaces other tenants rely on; teardown never deletes them.
    fn is_shared_namespace(&self, resource: &GeneratedResource) -> bool {
        std::ptr::eq(resource.kind, &kinds::NAMESPACE)
            && [GLOBAL_OPERATORS_NAMESPACE, identity::CONFIG_NAMESPACE, self.factory.owner_namespace()]
                .contains(&resource.name())
    }
}

#[async_trait]
pub trait ComponentReconciler: Send + Sync {
    fn name(&self) -> &'static str;

    fn enabled(&self, spec: &WorkshopSpec) -> bool;

    /// The component's footprint in creation order.
    fn plan(&self, pass: &Pass<'_>) -> Vec<Step>;

    async fn reconcile(&self, pass: &Pass<'_>) -> ReconcileOutcome {
        if !self.enabled(pass.spec()) {
            debug!(component = self.name(), "Disabled, skipping");
            return ReconcileOutcome::Done;
        }
        drive(self.name(), pass, self.plan(pass)).await.into()
    }

    async fn teardown(&self, pass: &Pass<'_>) -> ReconcileOutcome {
        match dismantle(self.name(), pass, self.plan(pass)).await {
            Ok(()) => ReconcileOutcome::Done,
            Err(e) => ReconcileOutcome::Fatal(e),
        }
    }
}

async fn drive(component: &str, pass: &Pass<'_>, steps: Vec<Step>) -> Result<Readiness> {
    for step in steps {
        let readiness = match step {
            Step::Create(resource) => {
                pass.ensure(component, &resource).await?;
                Readiness::Ready
            }
            Step::AwaitInstall(install) => olm::approve_install_plan(pass.gateway, &install).await?,
            Step::LinkIdentity { provider, username } => {
                identity::link_identity(pass, component, &provider, &username).await?
            }
        };
        if let Readiness::Waiting(reason) = readiness {
            info!(component, %reason, "Waiting");
            return Ok(Readiness::Waiting(reason));
        }
    }
    Ok(Readiness::Ready)
}

async fn dismantle(component: &str, pass: &Pass<'_>, steps: Vec<Step>) -> Result<()> {
    let mut doomed = Vec::new();
    for step in steps {
        match step {
            Step::Create(resource) => doomed.push(resource),
            Step::LinkIdentity { provider, username } => {
                let identity_name = builders::identity_name(&provider, &username);
                doomed.push(pass.factory.reference(&kinds::IDENTITY, identity_name.clone(), None));
                doomed.push(pass.factory.reference(&kinds::USER_IDENTITY_MAPPING, identity_name, None));
            }
            Step::AwaitInstall(_) => {}
        }
    }

    for resource in doomed.iter().rev() {
        if pass.is_shared_namespace(resource) {
            debug!(component, namespace = resource.name(), "Keeping shared namespace");
            continue;
        }
        pass.remove(component, resource.kind, resource.name(), resource.namespace())
            .await?;
    }
    Ok(())
}

/// Learners are `user1..=userN`, never zero-padded.
pub fn learner_name(index: u32) -> String {
    format!("user{}", index)
}

/// The project namespace of learner `index`.
pub fn project_namespace(staging_name: &str, index: u32) -> String {
    let staging_name = if staging_name.is_empty() {
        project::DEFAULT_STAGING_NAME
    } else {
        staging_name
    };
    format!("{}{}", staging_name, index)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::controllers::routes::tests::test_routes;
    use crate::gateway::memory::{GatewayOp, MemoryGateway};
    use crate::resources::tests::test_workshop;
    use serde_json::json;

    struct Fixed {
        steps: fn(&Pass<'_>) -> Vec<Step>,
        enabled: bool,
    }

    #[async_trait]
    impl ComponentReconciler for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn enabled(&self, _spec: &WorkshopSpec) -> bool {
            self.enabled
        }

        fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
            (self.steps)(pass)
        }
    }

    fn two_config_maps(pass: &Pass<'_>) -> Vec<Step> {
        ["first", "second"]
            .into_iter()
            .map(|name| {
                Step::Create(pass.factory.build(
                    &kinds::CONFIG_MAP,
                    name,
                    None,
                    pass.factory.labels("fixed"),
                    json!({ "data": {} }),
                ))
            })
            .collect()
    }

    #[test]
    fn test_learner_names_are_not_padded() {
        assert_eq!(learner_name(1), "user1");
        assert_eq!(learner_name(10), "user10");
        assert_eq!(project_namespace("staging", 3), "staging3");
        assert_eq!(project_namespace("", 2), "staging2");
    }

    #[tokio::test]
    async fn test_disabled_component_touches_nothing() {
        let gateway = MemoryGateway::new();
        let workshop = test_workshop("workshop", 2);
        let routes = test_routes();
        let pass = Pass::new(&workshop, &routes, &gateway).unwrap();

        let component = Fixed {
            steps: |_| panic!("a disabled component must not plan"),
            enabled: false,
        };
        assert!(matches!(component.reconcile(&pass).await, ReconcileOutcome::Done));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_teardown_deletes_in_reverse_and_tolerates_missing() {
        let gateway = MemoryGateway::new();
        let workshop = test_workshop("workshop", 1);
        let routes = test_routes();
        let pass = Pass::new(&workshop, &routes, &gateway).unwrap();
        let component = Fixed {
            steps: two_config_maps,
            enabled: true,
        };

        // "first" is never created, so deleting it reports NotFound.
        gateway.insert(&pass.factory.reference(&kinds::CONFIG_MAP, "second", None));
        assert!(matches!(component.teardown(&pass).await, ReconcileOutcome::Done));

        let deleted: Vec<String> = gateway
            .calls()
            .into_iter()
            .filter(|c| c.op == GatewayOp::Delete)
            .map(|c| c.name)
            .collect();
        assert_eq!(deleted, vec!["second", "first"]);
        assert_eq!(gateway.object_count(), 0);
    }

    #[tokio::test]
    async fn test_create_failure_is_fatal() {
        let gateway = MemoryGateway::new();
        gateway.fail_on(&kinds::CONFIG_MAP, GatewayOp::Create);
        let workshop = test_workshop("workshop", 1);
        let routes = test_routes();
        let pass = Pass::new(&workshop, &routes, &gateway).unwrap();
        let component = Fixed {
            steps: two_config_maps,
            enabled: true,
        };

        let outcome = component.reconcile(&pass).await;
        assert!(matches!(outcome, ReconcileOutcome::Fatal(Error::KubeError(_))));
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_shared_namespaces_survive_teardown() {
        let gateway = MemoryGateway::new();
        let workshop = test_workshop("workshop", 1);
        let routes = test_routes();
        let pass = Pass::new(&workshop, &routes, &gateway).unwrap();
        let component = Fixed {
            steps: |pass| {
                ["openshift-operators", "workshop", "gitea"]
                    .into_iter()
                    .map(|ns| Step::Create(builders::namespace(&pass.factory, ns, Default::default())))
                    .collect()
            },
            enabled: true,
        };

        component.teardown(&pass).await;
        let deleted: Vec<String> = gateway.calls().into_iter().map(|c| c.name).collect();
        assert_eq!(deleted, vec!["gitea"]);
    }

    /// Runs a component twice against the same cluster and checks the second
    /// pass creates nothing new.
    pub(crate) async fn assert_idempotent(component: &dyn ComponentReconciler, workshop: &Workshop) -> MemoryGateway {
        let gateway = MemoryGateway::with_olm();
        let routes = test_routes();
        {
            let pass = Pass::new(workshop, &routes, &gateway).unwrap();

            let first = component.reconcile(&pass).await;
            assert!(matches!(first, ReconcileOutcome::Done), "{}: {:?}", component.name(), first);
            let stored = gateway.object_count();
            assert!(stored > 0, "{} created nothing", component.name());

            let second = component.reconcile(&pass).await;
            assert!(matches!(second, ReconcileOutcome::Done), "{}: {:?}", component.name(), second);
            assert_eq!(gateway.object_count(), stored, "{} is not idempotent", component.name());
        }
        gateway
    }
}
