/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/vault.rs
*
* A standalone Vault server plus the agent injector. The server's service
* account may review tokens cluster-wide (`system:auth-delegator`) so the
* Kubernetes auth method works for learner workloads.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{ComponentReconciler, Pass, Step};
use crate::crds::WorkshopSpec;
use crate::resources::builders::{self, DeploymentParams};
use async_trait::async_trait;
use std::collections::BTreeMap;

pub const NAMESPACE: &str = "vault";
const SERVER: &str = "vault";
const INJECTOR: &str = "vault-agent-injector";
const CONFIG: &str = "vault-config";
const SERVER_PORT: i32 = 8200;
const INJECTOR_PORT: i32 = 8080;

const SERVER_CONFIG: &str = r#"ui = true
listener "tcp" {
  tls_disable = 1
  address = "[::]:8200"
  cluster_address = "[::]:8201"
}
storage "file" {
  path = "/vault/data"
}
"#;

pub struct Vault;

#[async_trait]
impl ComponentReconciler for Vault {
    fn name(&self) -> &'static str {
        "vault"
    }

    fn enabled(&self, spec: &WorkshopSpec) -> bool {
        spec.infrastructure.vault.enabled
    }

    fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
        let f = &pass.factory;
        let spec = &pass.spec().infrastructure.vault;
        let labels = f.labels(self.name());
        let config = BTreeMap::from([("extraconfig-from-values.hcl".to_string(), SERVER_CONFIG.to_string())]);

        let server = builders::deployment(
            f,
            labels.clone(),
            DeploymentParams {
                name: SERVER,
                namespace: NAMESPACE,
                image: spec.image.reference_or("hashicorp/vault", "1.6.2"),
                env: vec![
                    ("VAULT_ADDR", format!("http://127.0.0.1:{}", SERVER_PORT)),
                    ("SKIP_SETCAP", "true".to_string()),
                ],
                container_port: Some(SERVER_PORT),
                service_account: Some(SERVER),
                args: vec![
                    "server".to_string(),
                    "-config=/vault/config/extraconfig-from-values.hcl".to_string(),
                ],
                config_volume: Some((CONFIG, "/vault/config")),
            },
        );

        let injector = builders::deployment(
            f,
            labels.clone(),
            DeploymentParams {
                name: INJECTOR,
                namespace: NAMESPACE,
                image: spec.agent_injector_image.reference_or("hashicorp/vault-k8s", "0.7.0"),
                env: vec![
                    ("AGENT_INJECT_LISTEN", format!(":{}", INJECTOR_PORT)),
                    (
                        "AGENT_INJECT_VAULT_ADDR",
                        format!("http://{}.{}.svc:{}", SERVER, NAMESPACE, SERVER_PORT),
                    ),
                    ("AGENT_INJECT_VAULT_AUTH_PATH", "auth/kubernetes".to_string()),
                    ("AGENT_INJECT_LOG_LEVEL", "info".to_string()),
                ],
                container_port: Some(INJECTOR_PORT),
                service_account: Some(SERVER),
                args: vec!["agent-inject".to_string()],
                ..Default::default()
            },
        );

        vec![
            Step::Create(builders::namespace(f, NAMESPACE, labels.clone())),
            Step::Create(builders::service_account(f, SERVER, NAMESPACE, labels.clone())),
            Step::Create(builders::cluster_role_binding_for_service_account(
                f,
                "vault-server-binding",
                labels.clone(),
                SERVER,
                NAMESPACE,
                "system:auth-delegator",
            )),
            Step::Create(builders::config_map(f, CONFIG, NAMESPACE, labels.clone(), config)),
            Step::Create(server),
            Step::Create(builders::service(f, SERVER, NAMESPACE, labels.clone(), SERVER, SERVER_PORT)),
            Step::Create(injector),
        ]
    }
}
