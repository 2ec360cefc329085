/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/codeready.rs
*
* The cloud IDE. Unlike the global operators, CodeReady Workspaces installs
* into its own namespace, so it needs an OperatorGroup there first.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{ComponentReconciler, Pass, Step};
use crate::crds::WorkshopSpec;
use crate::resources::olm::{self, OperatorInstall, REDHAT_CATALOG};
use crate::resources::{builders, custom};
use async_trait::async_trait;

pub const NAMESPACE: &str = "workspaces";
const PACKAGE: &str = "codeready-workspaces";

pub struct CodeReady;

#[async_trait]
impl ComponentReconciler for CodeReady {
    fn name(&self) -> &'static str {
        "codeready"
    }

    fn enabled(&self, spec: &WorkshopSpec) -> bool {
        spec.infrastructure.code_ready_workspace.enabled
    }

    fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
        let f = &pass.factory;
        let spec = &pass.spec().infrastructure.code_ready_workspace;
        let labels = f.labels(self.name());
        let install = OperatorInstall::in_namespace(PACKAGE, NAMESPACE, REDHAT_CATALOG, &spec.operator_hub, "latest");

        vec![
            Step::Create(builders::namespace(f, NAMESPACE, labels.clone())),
            Step::Create(olm::operator_group(f, PACKAGE, NAMESPACE, labels.clone())),
            Step::Create(olm::subscription(f, &install, labels.clone())),
            Step::AwaitInstall(install),
            Step::Create(custom::che_cluster(f, PACKAGE, NAMESPACE, labels, spec.openshift_oauth)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::tests::assert_idempotent;
    use crate::resources::kinds;
    use crate::resources::tests::test_workshop;

    #[tokio::test]
    async fn test_codeready_installs_into_own_namespace() {
        let mut workshop = test_workshop("workshop", 1);
        workshop.spec.infrastructure.code_ready_workspace.enabled = true;
        workshop.spec.infrastructure.code_ready_workspace.openshift_oauth = true;

        let gateway = assert_idempotent(&CodeReady, &workshop).await;
        assert!(gateway.contains(&kinds::OPERATOR_GROUP, PACKAGE, Some(NAMESPACE)));
        assert!(gateway.contains(&kinds::SUBSCRIPTION, PACKAGE, Some(NAMESPACE)));
        let che = gateway.object(&kinds::CHE_CLUSTER, PACKAGE, Some(NAMESPACE)).unwrap();
        assert_eq!(che.data["spec"]["auth"]["openShiftoAuth"], true);
    }
}
