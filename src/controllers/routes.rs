/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/controllers/routes.rs
*
* Ingress-derived addressing. The console route's host yields both the console
* URL and, once the fixed console prefix is stripped, the suffix every other
* externally visible hostname is built on.
*
* SPDX-License-Identifier: Apache-2.0
*/

use crate::config::ConsoleRoute;
use crate::error::{Error, Result};
use crate::gateway::ClusterGateway;
use crate::resources::kinds;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalRouteInfo {
    pub console_url: String,
    pub apps_hostname_suffix: String,
}

impl ExternalRouteInfo {
    /// Derives addressing from the console host. A host without `prefix`, or
    /// with nothing after it, is a configuration error.
    pub fn from_host(host: &str, prefix: &str) -> Result<Self> {
        let suffix = host
            .strip_prefix(prefix)
            .filter(|suffix| !suffix.is_empty())
            .ok_or_else(|| Error::MalformedIngressHost {
                host: host.to_string(),
                prefix: prefix.to_string(),
            })?;

        Ok(Self {
            console_url: format!("https://{}", host),
            apps_hostname_suffix: suffix.to_string(),
        })
    }
}

/// Reads the console route through the gateway and derives addressing from it.
pub async fn discover(gateway: &dyn ClusterGateway, route: &ConsoleRoute) -> Result<ExternalRouteInfo> {
    let missing = || Error::MissingRoute {
        namespace: route.namespace.clone(),
        name: route.name.clone(),
    };
    let object = gateway
        .get(&kinds::ROUTE, &route.name, Some(&route.namespace))
        .await?
        .ok_or_else(missing)?;

    let host = object.data["spec"]["host"]
        .as_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| Error::MissingRouteHost {
            namespace: route.namespace.clone(),
            name: route.name.clone(),
        })?;

    let info = ExternalRouteInfo::from_host(host, &route.host_prefix)?;
    debug!(
        console_url = %info.console_url,
        apps_suffix = %info.apps_hostname_suffix,
        "Derived ingress addressing"
    );
    Ok(info)
}
