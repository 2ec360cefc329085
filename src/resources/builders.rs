/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/resources/builders.rs
*
* Builders for the built-in Kubernetes and OpenShift kinds the components use:
* namespaces, config maps, secrets, service accounts, bindings, deployments,
* services, routes and OpenShift user objects.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{kinds, GeneratedResource, ResourceFactory};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub type Labels = BTreeMap<String, String>;

pub fn namespace(factory: &ResourceFactory, name: &str, labels: Labels) -> GeneratedResource {
    factory.build(&kinds::NAMESPACE, name, None, labels, json!({}))
}

pub fn config_map(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
    data: BTreeMap<String, String>,
) -> GeneratedResource {
    factory.build(&kinds::CONFIG_MAP, name, Some(namespace), labels, json!({ "data": data }))
}

/// An `Opaque` secret; values are base64-encoded here.
pub fn secret(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
    data: BTreeMap<String, String>,
) -> GeneratedResource {
    let encoded: BTreeMap<String, String> = data
        .into_iter()
        .map(|(k, v)| (k, STANDARD.encode(v.as_bytes())))
        .collect();
    factory.build(
        &kinds::SECRET,
        name,
        Some(namespace),
        labels,
        json!({ "type": "Opaque", "data": encoded }),
    )
}

pub fn service_account(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
) -> GeneratedResource {
    factory.build(&kinds::SERVICE_ACCOUNT, name, Some(namespace), labels, json!({}))
}

fn role_ref(role_kind: &str, role_name: &str) -> Value {
    json!({
        "apiGroup": "rbac.authorization.k8s.io",
        "kind": role_kind,
        "name": role_name,
    })
}

/// Binds a set of users to a role inside `namespace`.
pub fn role_binding_for_users(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
    users: &[String],
    role_kind: &str,
    role_name: &str,
) -> GeneratedResource {
    let subjects: Vec<Value> = users
        .iter()
        .map(|user| {
            json!({
                "kind": "User",
                "apiGroup": "rbac.authorization.k8s.io",
                "name": user,
            })
        })
        .collect();
    factory.build(
        &kinds::ROLE_BINDING,
        name,
        Some(namespace),
        labels,
        json!({ "subjects": subjects, "roleRef": role_ref(role_kind, role_name) }),
    )
}

pub fn cluster_role_binding_for_service_account(
    factory: &ResourceFactory,
    name: &str,
    labels: Labels,
    service_account: &str,
    service_account_namespace: &str,
    cluster_role: &str,
) -> GeneratedResource {
    factory.build(
        &kinds::CLUSTER_ROLE_BINDING,
        name,
        None,
        labels,
        json!({
            "subjects": [{
                "kind": "ServiceAccount",
                "name": service_account,
                "namespace": service_account_namespace,
            }],
            "roleRef": role_ref("ClusterRole", cluster_role),
        }),
    )
}

/// Parameters for a single-container deployment.
#[derive(Debug, Clone, Default)]
pub struct DeploymentParams<'a> {
    pub name: &'a str,
    pub namespace: &'a str,
    pub image: String,
    pub env: Vec<(&'static str, String)>,
    pub container_port: Option<i32>,
    pub service_account: Option<&'a str>,
    pub args: Vec<String>,
    /// Config map mounted into the container: `(config map name, mount path)`.
    pub config_volume: Option<(&'a str, &'a str)>,
}

pub fn deployment(factory: &ResourceFactory, labels: Labels, params: DeploymentParams<'_>) -> GeneratedResource {
    let env: Vec<Value> = params
        .env
        .iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect();

    let mut container = json!({
        "name": params.name,
        "image": params.image,
        "imagePullPolicy": "IfNotPresent",
        "env": env,
    });
    if let Some(port) = params.container_port {
        container["ports"] = json!([{ "containerPort": port, "protocol": "TCP" }]);
    }
    if !params.args.is_empty() {
        container["args"] = json!(params.args);
    }

    if let Some((_, mount_path)) = params.config_volume {
        container["volumeMounts"] = json!([{ "name": "config", "mountPath": mount_path }]);
    }

    let mut pod_spec = json!({ "containers": [container] });
    if let Some(sa) = params.service_account {
        pod_spec["serviceAccountName"] = json!(sa);
    }
    if let Some((config_map, _)) = params.config_volume {
        pod_spec["volumes"] = json!([{ "name": "config", "configMap": { "name": config_map } }]);
    }

    factory.build(
        &kinds::DEPLOYMENT,
        params.name,
        Some(params.namespace),
        labels.clone(),
        json!({
            "spec": {
                "replicas": 1,
                "selector": { "matchLabels": { "app": params.name } },
                "strategy": { "type": "RollingUpdate" },
                "template": {
                    "metadata": { "labels": merged_labels(&labels, params.name) },
                    "spec": pod_spec,
                },
            }
        }),
    )
}

fn merged_labels(labels: &Labels, app: &str) -> Labels {
    let mut merged = labels.clone();
    merged.insert("app".to_string(), app.to_string());
    merged
}

pub fn service(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
    app: &str,
    port: i32,
) -> GeneratedResource {
    factory.build(
        &kinds::SERVICE,
        name,
        Some(namespace),
        labels,
        json!({
            "spec": {
                "type": "ClusterIP",
                "selector": { "app": app },
                "ports": [{ "name": "http", "port": port, "targetPort": port, "protocol": "TCP" }],
            }
        }),
    )
}

pub fn route(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
    host: &str,
    service_name: &str,
) -> GeneratedResource {
    factory.build(
        &kinds::ROUTE,
        name,
        Some(namespace),
        labels,
        json!({
            "spec": {
                "host": host,
                "to": { "kind": "Service", "name": service_name, "weight": 100 },
                "port": { "targetPort": "http" },
                "tls": { "termination": "edge", "insecureEdgeTerminationPolicy": "Redirect" },
            }
        }),
    )
}

// --- OpenShift user objects ---

pub fn user(factory: &ResourceFactory, username: &str, labels: Labels) -> GeneratedResource {
    factory.build(&kinds::USER, username, None, labels, json!({ "fullName": username }))
}

/// The identity name OpenShift expects: `<provider>:<username>`.
pub fn identity_name(provider: &str, username: &str) -> String {
    format!("{}:{}", provider, username)
}

pub fn identity(
    factory: &ResourceFactory,
    provider: &str,
    username: &str,
    user_uid: &str,
    labels: Labels,
) -> GeneratedResource {
    factory.build(
        &kinds::IDENTITY,
        identity_name(provider, username),
        None,
        labels,
        json!({
            "providerName": provider,
            "providerUserName": username,
            "user": { "name": username, "uid": user_uid },
        }),
    )
}

pub fn user_identity_mapping(
    factory: &ResourceFactory,
    provider: &str,
    username: &str,
    labels: Labels,
) -> GeneratedResource {
    let identity = identity_name(provider, username);
    factory.build(
        &kinds::USER_IDENTITY_MAPPING,
        identity.clone(),
        None,
        labels,
        json!({
            "identity": { "name": identity },
            "user": { "name": username },
        }),
    )
}
