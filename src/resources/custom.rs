/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/resources/custom.rs
*
* Custom resources consumed by the operators each component installs.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::builders::Labels;
use super::{kinds, GeneratedResource, ResourceFactory};
use serde_json::json;

pub fn gitea(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
    image: &str,
) -> GeneratedResource {
    let (image_name, image_tag) = image.rsplit_once(':').unwrap_or((image, "latest"));
    factory.build(
        &kinds::GITEA,
        name,
        Some(namespace),
        labels,
        json!({
            "spec": {
                "giteaImage": image_name,
                "giteaImageTag": image_tag,
                "giteaVolumeSize": "4Gi",
                "giteaSsl": true,
                "postgresqlVolumeSize": "4Gi",
            }
        }),
    )
}

pub fn argo_cd(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
    rbac_policy: &str,
) -> GeneratedResource {
    factory.build(
        &kinds::ARGO_CD,
        name,
        Some(namespace),
        labels,
        json!({
            "spec": {
                "dex": { "openShiftOAuth": true },
                "rbac": { "defaultPolicy": "role:readonly", "policy": rbac_policy, "scopes": "[groups]" },
                "server": { "route": { "enabled": true } },
            }
        }),
    )
}

pub fn che_cluster(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
    openshift_oauth: bool,
) -> GeneratedResource {
    factory.build(
        &kinds::CHE_CLUSTER,
        name,
        Some(namespace),
        labels,
        json!({
            "spec": {
                "server": {
                    "selfSignedCert": false,
                    "tlsSupport": true,
                    "serverMemoryLimit": "6000Mi",
                },
                "auth": {
                    "openShiftoAuth": openshift_oauth,
                },
                "storage": {
                    "pvcStrategy": "per-workspace",
                    "pvcClaimSize": "1Gi",
                },
            }
        }),
    )
}

pub fn service_mesh_control_plane(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
) -> GeneratedResource {
    factory.build(
        &kinds::SERVICE_MESH_CONTROL_PLANE,
        name,
        Some(namespace),
        labels,
        json!({
            "spec": {
                "version": "v2.0",
                "tracing": { "type": "Jaeger", "sampling": 10000 },
                "addons": {
                    "jaeger": { "install": { "storage": { "type": "Memory" } } },
                    "kiali": { "enabled": true },
                    "grafana": { "enabled": true },
                },
            }
        }),
    )
}

pub fn service_mesh_member_roll(
    factory: &ResourceFactory,
    namespace: &str,
    labels: Labels,
    members: &[String],
) -> GeneratedResource {
    factory.build(
        &kinds::SERVICE_MESH_MEMBER_ROLL,
        "default",
        Some(namespace),
        labels,
        json!({ "spec": { "members": members } }),
    )
}

pub fn knative_serving(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
) -> GeneratedResource {
    factory.build(&kinds::KNATIVE_SERVING, name, Some(namespace), labels, json!({ "spec": {} }))
}

pub fn cert_manager(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
) -> GeneratedResource {
    factory.build(
        &kinds::CERT_MANAGER,
        name,
        Some(namespace),
        labels,
        json!({ "spec": { "managementState": "Managed" } }),
    )
}
