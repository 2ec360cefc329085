/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/components/portal.rs
*
* The learner-facing portal: a redis instance and the username-distribution
* app that hands each learner an account and links to the workshop guides.
* Everything lives in the Workshop's namespace and is owned by it.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{ComponentReconciler, Pass, Step};
use crate::controllers::routes::ExternalRouteInfo;
use crate::crds::WorkshopSpec;
use crate::resources::builders::{self, DeploymentParams};
use async_trait::async_trait;

const REDIS: &str = "redis";
const REDIS_IMAGE: &str = "registry.redhat.io/rhel8/redis-6:latest";
const REDIS_PORT: i32 = 6379;
const PORTAL: &str = "portal";
const PORTAL_IMAGE: &str = "quay.io/mcouliba/username-distribution";
const PORTAL_PORT: i32 = 8080;
const DEFAULT_MODULE_URLS: &str =
    "https://docs.openshift.com/container-platform/latest/welcome/index.html;openshift_docs";

pub struct Portal;

#[async_trait]
impl ComponentReconciler for Portal {
    fn name(&self) -> &'static str {
        PORTAL
    }

    fn enabled(&self, spec: &WorkshopSpec) -> bool {
        spec.infrastructure.portal.enabled
    }

    fn plan(&self, pass: &Pass<'_>) -> Vec<Step> {
        let f = &pass.factory;
        let ns = f.owner_namespace();
        let spec = pass.spec();
        let labels = f.labels(PORTAL);
        let password = &spec.user.password;
        let admin_password = if spec.infrastructure.portal.admin_password.is_empty() {
            password.clone()
        } else {
            spec.infrastructure.portal.admin_password.clone()
        };

        let redis = builders::deployment(
            f,
            labels.clone(),
            DeploymentParams {
                name: REDIS,
                namespace: ns,
                image: REDIS_IMAGE.to_string(),
                env: vec![("REDIS_PASSWORD", REDIS.to_string())],
                container_port: Some(REDIS_PORT),
                ..Default::default()
            },
        );

        let portal = builders::deployment(
            f,
            labels.clone(),
            DeploymentParams {
                name: PORTAL,
                namespace: ns,
                image: spec.infrastructure.portal.image.reference_or(PORTAL_IMAGE, "latest"),
                env: vec![
                    ("LAB_REDIS_HOST", REDIS.to_string()),
                    ("LAB_REDIS_PASS", REDIS.to_string()),
                    ("LAB_TITLE", "OpenShift Workshops".to_string()),
                    ("LAB_DURATION_HOURS", "1week".to_string()),
                    ("LAB_USER_COUNT", pass.users.to_string()),
                    ("LAB_USER_ACCESS_TOKEN", password.clone()),
                    ("LAB_USER_PASS", password.clone()),
                    ("LAB_USER_PREFIX", "user".to_string()),
                    ("LAB_USER_PAD_ZERO", "false".to_string()),
                    ("LAB_ADMIN_PASS", admin_password),
                    ("LAB_MODULE_URLS", module_urls(spec, pass.routes)),
                    ("LAB_EXTRA_URLS", format!("{};OpenShift Console", pass.routes.console_url)),
                ],
                container_port: Some(PORTAL_PORT),
                ..Default::default()
            },
        );

        let host = format!("{}-{}.{}", PORTAL, ns, pass.routes.apps_hostname_suffix);
        vec![
            Step::Create(redis),
            Step::Create(builders::service(f, REDIS, ns, labels.clone(), REDIS, REDIS_PORT)),
            Step::Create(portal),
            Step::Create(builders::service(f, PORTAL, ns, labels.clone(), PORTAL, PORTAL_PORT)),
            Step::Create(builders::route(f, PORTAL, ns, labels, &host, PORTAL)),
        ]
    }
}

/// `url?params;name` per scholars guide, comma separated. Learner-specific
/// values are left as `%USER_ID%` for the portal to fill in.
pub fn module_urls(spec: &WorkshopSpec, routes: &ExternalRouteInfo) -> String {
    let scholars = &spec.infrastructure.guide.scholars;
    if !scholars.enabled || scholars.guide_url.is_empty() {
        return DEFAULT_MODULE_URLS.to_string();
    }

    let git_repo: String = url::form_urlencoded::byte_serialize(spec.source.git_url.as_bytes()).collect();
    let params = format!(
        "APPS_HOSTNAME_SUFFIX={}&USER_ID=%USER_ID%&OPENSHIFT_PASSWORD={}&WORKSHOP_GIT_REPO={}&WORKSHOP_GIT_REF={}",
        routes.apps_hostname_suffix,
        spec.user.password,
        git_repo,
        spec.source.effective_ref(),
    );

    scholars
        .guide_url
        .iter()
        .map(|(name, url)| format!("{}?{};{}", url, params, name))
        .collect::<Vec<_>>()
        .join(",")
}
