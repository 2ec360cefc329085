/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/service_mesh.rs
*
* OpenShift Service Mesh. The mesh operator depends on the Elasticsearch,
* Jaeger and Kiali operators, so those are installed and approved first. The
* member roll enrolls every learner project namespace.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{project_namespace, ComponentReconciler, Pass, Step};
use crate::crds::{OperatorHubSpec, WorkshopSpec};
use crate::resources::olm::{self, OperatorInstall, REDHAT_CATALOG};
use crate::resources::{builders, custom};
use async_trait::async_trait;

pub const NAMESPACE: &str = "istio-system";
const CONTROL_PLANE: &str = "basic";

pub struct ServiceMesh;

#[async_trait]
impl ComponentReconciler for ServiceMesh {
    fn name(&self) -> &'static str {
        "servicemesh"
    }

    fn enabled(&self, spec: &WorkshopSpec) -> bool {
        spec.infrastructure.service_mesh.enabled
    }

    fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
        let f = &pass.factory;
        let spec = pass.spec();
        let mesh = &spec.infrastructure.service_mesh;
        let labels = f.labels(self.name());

        let operators: [(&str, &OperatorHubSpec); 4] = [
            ("elasticsearch-operator", &mesh.elastic_search_operator_hub),
            ("jaeger-product", &mesh.jaeger_operator_hub),
            ("kiali-ossm", &mesh.kiali_operator_hub),
            ("servicemeshoperator", &mesh.service_mesh_operator_hub),
        ];

        let mut steps = Vec::new();
        for (package, hub) in operators {
            let install = OperatorInstall::global(package, REDHAT_CATALOG, hub, "stable");
            steps.push(Step::Create(olm::subscription(f, &install, labels.clone())));
            steps.push(Step::AwaitInstall(install));
        }

        let members: Vec<String> = pass
            .learners()
            .map(|(i, _)| project_namespace(&spec.infrastructure.project.staging_name, i))
            .collect();
        steps.extend([
            Step::Create(builders::namespace(f, NAMESPACE, labels.clone())),
            Step::Create(custom::service_mesh_control_plane(f, CONTROL_PLANE, NAMESPACE, labels.clone())),
            Step::Create(custom::service_mesh_member_roll(f, NAMESPACE, labels, &members)),
        ]);
        steps
    }
}
