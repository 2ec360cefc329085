/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/project.rs
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{project_namespace, ComponentReconciler, Pass, Step};
use crate::crds::WorkshopSpec;
use crate::resources::builders;
use async_trait::async_trait;

pub const DEFAULT_STAGING_NAME: &str = "staging";

/// One project namespace per learner, with the learner as its admin.
pub struct Project;

#[async_trait]
impl ComponentReconciler for Project {
    fn name(&self) -> &'static str {
        "project"
    }

    fn enabled(&self, spec: &WorkshopSpec) -> bool {
        spec.infrastructure.project.enabled
    }

    fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
        let f = &pass.factory;
        let staging = &pass.spec().infrastructure.project.staging_name;
        let labels = f.labels(self.name());

        pass.learners()
            .flat_map(|(i, user)| {
                let namespace = project_namespace(staging, i);
                [
                    Step::Create(builders::namespace(f, &namespace, labels.clone())),
                    Step::Create(builders::role_binding_for_users(
                        f,
                        &user,
                        &namespace,
                        labels.clone(),
                        std::slice::from_ref(&user),
                        "ClusterRole",
                        "admin",
                    )),
                ]
            })
            .collect()
    }
}
