/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/gitea.rs
*
* Source control. Installs the Gitea operator, then asks it for a Gitea
* server in its own namespace and publishes the learner accounts the server
* should carry.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{ComponentReconciler, Pass, Step};
use crate::crds::WorkshopSpec;
use crate::resources::olm::{self, OperatorInstall, COMMUNITY_CATALOG};
use crate::resources::{builders, custom};
use async_trait::async_trait;
use std::collections::BTreeMap;

pub const NAMESPACE: &str = "gitea";
const SERVER: &str = "gitea-server";
const DEFAULT_IMAGE: &str = "quay.io/gpte-devops-automation/gitea";

pub struct Gitea;

#[async_trait]
impl ComponentReconciler for Gitea {
    fn name(&self) -> &'static str {
        "gitea"
    }

    fn enabled(&self, spec: &WorkshopSpec) -> bool {
        spec.infrastructure.gitea.enabled
    }

    fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
        let f = &pass.factory;
        let spec = &pass.spec().infrastructure.gitea;
        let labels = f.labels(self.name());
        let install = OperatorInstall::global("gitea-operator", COMMUNITY_CATALOG, &spec.operator_hub, "stable");

        let accounts: Vec<String> = pass.learners().map(|(_, user)| user).collect();
        let data = BTreeMap::from([
            ("users".to_string(), accounts.join("\n")),
            ("password".to_string(), pass.spec().user.password.clone()),
        ]);

        vec![
            Step::Create(olm::subscription(f, &install, labels.clone())),
            Step::AwaitInstall(install),
            Step::Create(builders::namespace(f, NAMESPACE, labels.clone())),
            Step::Create(custom::gitea(
                f,
                SERVER,
                NAMESPACE,
                labels.clone(),
                &spec.image.reference_or(DEFAULT_IMAGE, "latest"),
            )),
            Step::Create(builders::config_map(f, "gitea-users", NAMESPACE, labels, data)),
        ]
    }
}
