/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/gitops.rs
*
* OpenShift GitOps. An Argo CD instance whose RBAC policy lets each learner
* manage applications targeting their own project namespace, plus a `view`
* binding so learners can see the Argo CD namespace.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{learner_name, project_namespace, ComponentReconciler, Pass, Step};
use crate::crds::WorkshopSpec;
use crate::resources::olm::{self, OperatorInstall, REDHAT_CATALOG};
use crate::resources::{builders, custom};
use async_trait::async_trait;

pub const NAMESPACE: &str = "argocd";

pub struct GitOps;

#[async_trait]
impl ComponentReconciler for GitOps {
    fn name(&self) -> &'static str {
        "gitops"
    }

    fn enabled(&self, spec: &WorkshopSpec) -> bool {
        spec.infrastructure.gitops.enabled
    }

    fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
        let f = &pass.factory;
        let spec = pass.spec();
        let labels = f.labels(self.name());
        let install = OperatorInstall::global(
            "openshift-gitops-operator",
            REDHAT_CATALOG,
            &spec.infrastructure.gitops.operator_hub,
            "stable",
        );
        let policy = rbac_policy(&spec.infrastructure.project.staging_name, pass.users);

        let mut steps = vec![
            Step::Create(olm::subscription(f, &install, labels.clone())),
            Step::AwaitInstall(install),
            Step::Create(builders::namespace(f, NAMESPACE, labels.clone())),
            Step::Create(custom::argo_cd(f, NAMESPACE, NAMESPACE, labels.clone(), &policy)),
        ];
        steps.extend(pass.learners().map(|(_, user)| {
            Step::Create(builders::role_binding_for_users(
                f,
                &format!("{}-argocd-view", user),
                NAMESPACE,
                labels.clone(),
                std::slice::from_ref(&user),
                "ClusterRole",
                "view",
            ))
        }));
        steps
    }
}

/// Argo CD CSV policy: one role per learner scoped to their project namespace.
pub fn rbac_policy(staging_name: &str, users: u32) -> String {
    (1..=users)
        .map(|i| {
            let user = learner_name(i);
            let namespace = project_namespace(staging_name, i);
            format!(
                "p, role:{user}, applications, *, {namespace}/*, allow\ng, {user}, role:{user}",
                user = user,
                namespace = namespace
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
