/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/cert_manager.rs
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{ComponentReconciler, Pass, Step};
use crate::crds::WorkshopSpec;
use crate::resources::olm::{self, OperatorInstall, CERTIFIED_CATALOG};
use crate::resources::{builders, custom};
use async_trait::async_trait;

pub const NAMESPACE: &str = "cert-manager";

pub struct CertManager;

#[async_trait]
impl ComponentReconciler for CertManager {
    fn name(&self) -> &'static str {
        "certmanager"
    }

    fn enabled(&self, spec: &WorkshopSpec) -> bool {
        spec.infrastructure.cert_manager.enabled
    }

    fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
        let f = &pass.factory;
        let labels = f.labels(self.name());
        let install = OperatorInstall::global(
            "cert-manager-operator",
            CERTIFIED_CATALOG,
            &pass.spec().infrastructure.cert_manager.operator_hub,
            "stable",
        );

        vec![
            Step::Create(olm::subscription(f, &install, labels.clone())),
            Step::AwaitInstall(install),
            Step::Create(builders::namespace(f, NAMESPACE, labels.clone())),
            Step::Create(custom::cert_manager(f, NAMESPACE, NAMESPACE, labels)),
        ]
    }
}
