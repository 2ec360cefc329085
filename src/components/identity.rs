/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/identity.rs
*
* Learner identities. Each learner gets a credentials secret in
* `openshift-config`, an OpenShift `User`, and an `Identity` plus
* `UserIdentityMapping` tying the htpasswd provider login to that User. The
* Identity needs the User's uid, so linking waits until the User is visible.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{ComponentReconciler, Pass, Readiness, Step};
use crate::crds::WorkshopSpec;
use crate::error::Result;
use crate::resources::{builders, kinds};
use async_trait::async_trait;
use std::collections::BTreeMap;

pub const CONFIG_NAMESPACE: &str = "openshift-config";

pub fn provider_name(username: &str) -> String {
    format!("htpass-secret-{}", username)
}

pub struct Identity;

#[async_trait]
impl ComponentReconciler for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn enabled(&self, spec: &WorkshopSpec) -> bool {
        spec.infrastructure.identity.enabled
    }

    fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
        let f = &pass.factory;
        let labels = f.labels(self.name());
        let password = &pass.spec().user.password;

        pass.learners()
            .flat_map(|(_, user)| {
                let provider = provider_name(&user);
                let credentials = BTreeMap::from([
                    ("username".to_string(), user.clone()),
                    ("password".to_string(), password.clone()),
                ]);
                [
                    Step::Create(builders::secret(f, &provider, CONFIG_NAMESPACE, labels.clone(), credentials)),
                    Step::Create(builders::user(f, &user, labels.clone())),
                    Step::LinkIdentity {
                        provider,
                        username: user,
                    },
                ]
            })
            .collect()
    }
}

/// Creates the Identity and its mapping once the User has a uid.
pub(crate) async fn link_identity(
    pass: &Pass<'_>,
    component: &str,
    provider: &str,
    username: &str,
) -> Result<Readiness> {
    let uid = pass
        .gateway
        .get(&kinds::USER, username, None)
        .await?
        .and_then(|user| user.metadata.uid);
    let Some(uid) = uid else {
        return Ok(Readiness::Waiting(format!("User {} has no uid yet", username)));
    };

    let labels = pass.factory.labels(component);
    let identity = builders::identity(&pass.factory, provider, username, &uid, labels.clone());
    pass.ensure(component, &identity).await?;
    let mapping = builders::user_identity_mapping(&pass.factory, provider, username, labels);
    pass.ensure(component, &mapping).await?;
    Ok(Readiness::Ready)
}
