/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/serverless.rs
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{ComponentReconciler, Pass, Step};
use crate::crds::WorkshopSpec;
use crate::resources::olm::{self, OperatorInstall, REDHAT_CATALOG};
use crate::resources::{builders, custom};
use async_trait::async_trait;

pub const NAMESPACE: &str = "knative-serving";

/// OpenShift Serverless with a cluster-wide KnativeServing instance.
pub struct Serverless;

#[async_trait]
impl ComponentReconciler for Serverless {
    fn name(&self) -> &'static str {
        "serverless"
    }

    fn enabled(&self, spec: &WorkshopSpec) -> bool {
        spec.infrastructure.serverless.enabled
    }

    fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
        let f = &pass.factory;
        let labels = f.labels(self.name());
        let install = OperatorInstall::global(
            "serverless-operator",
            REDHAT_CATALOG,
            &pass.spec().infrastructure.serverless.operator_hub,
            "stable",
        );

        vec![
            Step::Create(olm::subscription(f, &install, labels.clone())),
            Step::AwaitInstall(install),
            Step::Create(builders::namespace(f, NAMESPACE, labels.clone())),
            Step::Create(custom::knative_serving(f, NAMESPACE, NAMESPACE, labels)),
        ]
    }
}
