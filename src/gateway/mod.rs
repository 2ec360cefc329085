/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/gateway/mod.rs
*
* The cluster gateway: the only path from the reconciliation engine to the
* backing store. "Already exists" on create and "not found" on get/delete are
* distinguished outcomes rather than errors, so callers can treat them as the
* success-equivalents they are.
*
* Implementations must be safe for concurrent use; passes for different
* Workshops share a single gateway.
*
* SPDX-License-Identifier: Apache-2.0
*/

pub mod kube_gateway;
#[cfg(test)]
pub mod memory;

use crate::crds::{Workshop, WorkshopStatus};
use crate::resources::{GeneratedResource, ResourceKind};
use async_trait::async_trait;
use kube::api::DynamicObject;

pub use kube_gateway::KubeGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[async_trait]
pub trait ClusterGateway: Send + Sync {
    async fn create(&self, resource: &GeneratedResource) -> Result<CreateOutcome, kube::Error>;

    /// `Ok(None)` when the object does not exist.
    async fn get(
        &self,
        kind: &'static ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Option<DynamicObject>, kube::Error>;

    async fn update(
        &self,
        kind: &'static ResourceKind,
        object: &DynamicObject,
    ) -> Result<DynamicObject, kube::Error>;

    async fn delete(
        &self,
        kind: &'static ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<DeleteOutcome, kube::Error>;
}

/// Reads and writes the Workshop objects themselves.
#[async_trait]
pub trait WorkshopStore: Send + Sync {
    async fn get_workshop(&self, namespace: &str, name: &str) -> Result<Option<Workshop>, kube::Error>;

    /// Replaces the finalizer list, guarded by the object's resource version.
    async fn set_finalizers(&self, workshop: &Workshop, finalizers: Vec<String>) -> Result<(), kube::Error>;

    /// Merge-patches `.status`. An unset `provisionedUsers` keeps the stored mark.
    async fn patch_status(&self, workshop: &Workshop, status: &WorkshopStatus) -> Result<(), kube::Error>;

    /// Sets `status.provisionedUsers`, leaving every other status field alone.
    async fn record_provisioned_users(&self, workshop: &Workshop, users: u32) -> Result<(), kube::Error>;
}

pub(crate) fn is_status(err: &kube::Error, code: u16) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == code)
}
