/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/resources/olm.rs
*
* Operator Lifecycle Manager objects: subscriptions that install a component's
* operator from a catalog, and operator groups for namespaces that host one.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::builders::Labels;
use super::{kinds, GeneratedResource, ResourceFactory};
use crate::crds::OperatorHubSpec;
use serde_json::json;

pub const GLOBAL_OPERATORS_NAMESPACE: &str = "openshift-operators";
pub const MARKETPLACE_NAMESPACE: &str = "openshift-marketplace";
pub const REDHAT_CATALOG: &str = "redhat-operators";
pub const CERTIFIED_CATALOG: &str = "certified-operators";
pub const COMMUNITY_CATALOG: &str = "community-operators";

/// Everything needed to subscribe to an operator and later approve its install plan.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorInstall {
    pub subscription: String,
    pub namespace: String,
    pub package: String,
    pub catalog: &'static str,
    pub channel: String,
    pub cluster_service_version: Option<String>,
}

impl OperatorInstall {
    /// A subscription in `openshift-operators` named after its package.
    pub fn global(package: &str, catalog: &'static str, hub: &OperatorHubSpec, default_channel: &str) -> Self {
        Self::in_namespace(package, GLOBAL_OPERATORS_NAMESPACE, catalog, hub, default_channel)
    }

    pub fn in_namespace(
        package: &str,
        namespace: &str,
        catalog: &'static str,
        hub: &OperatorHubSpec,
        default_channel: &str,
    ) -> Self {
        let channel = if hub.channel.is_empty() {
            default_channel.to_string()
        } else {
            hub.channel.clone()
        };
        Self {
            subscription: package.to_string(),
            namespace: namespace.to_string(),
            package: package.to_string(),
            catalog,
            channel,
            cluster_service_version: hub.cluster_service_version.clone().filter(|csv| !csv.is_empty()),
        }
    }
}

pub fn subscription(factory: &ResourceFactory, install: &OperatorInstall, labels: Labels) -> GeneratedResource {
    let mut spec = json!({
        "channel": install.channel,
        "installPlanApproval": "Manual",
        "name": install.package,
        "source": install.catalog,
        "sourceNamespace": MARKETPLACE_NAMESPACE,
    });
    if let Some(csv) = &install.cluster_service_version {
        spec["startingCSV"] = json!(csv);
    }
    factory.build(
        &kinds::SUBSCRIPTION,
        install.subscription.as_str(),
        Some(&install.namespace),
        labels,
        json!({ "spec": spec }),
    )
}

pub fn operator_group(
    factory: &ResourceFactory,
    name: &str,
    namespace: &str,
    labels: Labels,
) -> GeneratedResource {
    factory.build(
        &kinds::OPERATOR_GROUP,
        name,
        Some(namespace),
        labels,
        json!({ "spec": { "targetNamespaces": [namespace] } }),
    )
}
