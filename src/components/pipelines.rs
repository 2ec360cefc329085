/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/pipelines.rs
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{ComponentReconciler, Pass, Step};
use crate::crds::WorkshopSpec;
use crate::resources::olm::{self, OperatorInstall, REDHAT_CATALOG};
use async_trait::async_trait;

/// OpenShift Pipelines. The operator provisions everything itself once its
/// install plan is approved.
pub struct Pipelines;

#[async_trait]
impl ComponentReconciler for Pipelines {
    fn name(&self) -> &'static str {
        "pipelines"
    }

    fn enabled(&self, spec: &WorkshopSpec) -> bool {
        spec.infrastructure.pipeline.enabled
    }

    fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
        let install = OperatorInstall::global(
            "openshift-pipelines-operator-rh",
            REDHAT_CATALOG,
            &pass.spec().infrastructure.pipeline.operator_hub,
            "stable",
        );
        vec![
            Step::Create(olm::subscription(&pass.factory, &install, pass.factory.labels(self.name()))),
            Step::AwaitInstall(install),
        ]
    }
}
