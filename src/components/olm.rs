/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/olm.rs
*
* The install-plan gate. Subscriptions are created with manual approval, so a
* component that depends on an operator must find the install plan OLM made
* for its subscription and approve it before creating the operator's custom
* resources.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::Readiness;
use crate::error::{Error, Result};
use crate::gateway::ClusterGateway;
use crate::resources::kinds;
use crate::resources::olm::OperatorInstall;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// The part of a Subscription's status OLM fills in.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionStatus {
    #[serde(default, rename = "currentCSV")]
    current_csv: Option<String>,
    #[serde(default)]
    install_plan_ref: Option<InstallPlanRef>,
}

#[derive(Debug, Deserialize)]
struct InstallPlanRef {
    name: Option<String>,
    namespace: Option<String>,
}

impl SubscriptionStatus {
    /// A Subscription OLM has not touched yet has no status at all.
    fn from_object(data: &Value) -> Result<Self> {
        match data.get("status") {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(raw) => Ok(serde_json::from_value(raw.clone())?),
        }
    }
}

pub async fn approve_install_plan(gateway: &dyn ClusterGateway, install: &OperatorInstall) -> Result<Readiness> {
    let Some(subscription) = gateway
        .get(&kinds::SUBSCRIPTION, &install.subscription, Some(&install.namespace))
        .await?
    else {
        return Ok(Readiness::Waiting(format!(
            "Subscription {}/{} is not visible yet",
            install.namespace, install.subscription
        )));
    };

    let status = SubscriptionStatus::from_object(&subscription.data)?;
    if let Some(pinned) = &install.cluster_service_version {
        let current = status.current_csv.as_deref().unwrap_or_default();
        if current != pinned.as_str() {
            return Ok(Readiness::Waiting(format!(
                "Subscription {} resolved '{}', waiting for '{}'",
                install.subscription, current, pinned
            )));
        }
    }

    let Some(plan_ref) = status.install_plan_ref else {
        return Ok(Readiness::Waiting(format!(
            "Waiting for Subscription {} to create an InstallPlan",
            install.subscription
        )));
    };
    let plan_name = plan_ref.name.ok_or_else(|| Error::InvalidUpstream {
        kind: "Subscription",
        name: install.subscription.clone(),
        reason: "status.installPlanRef has no name".to_string(),
    })?;
    let plan_name = plan_name.as_str();
    let plan_namespace = plan_ref.namespace.as_deref().unwrap_or(&install.namespace);

    let Some(mut plan) = gateway
        .get(&kinds::INSTALL_PLAN, plan_name, Some(plan_namespace))
        .await?
    else {
        return Ok(Readiness::Waiting(format!(
            "InstallPlan {}/{} is not visible yet",
            plan_namespace, plan_name
        )));
    };

    if plan.data["spec"]["approved"].as_bool() != Some(true) {
        plan.data["spec"]["approved"] = json!(true);
        gateway.update(&kinds::INSTALL_PLAN, &plan).await?;
        info!(subscription = %install.subscription, install_plan = plan_name, "Approved InstallPlan");
    }
    Ok(Readiness::Ready)
}
