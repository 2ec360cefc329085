/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/gateway/memory.rs
*
* In-memory cluster used by the unit tests. It records every call, assigns
* uids on create, can be told to fail a given operation on a given kind, and
* can play the part of OLM by attaching an unapproved InstallPlan to every
* Subscription it stores.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{ClusterGateway, CreateOutcome, DeleteOutcome, WorkshopStore};
use crate::crds::{Workshop, WorkshopStatus};
use crate::resources::{kinds, GeneratedResource, ResourceKind};
use async_trait::async_trait;
use kube::api::DynamicObject;
use kube::core::ErrorResponse;
use kube::ResourceExt;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    Create,
    Get,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
    pub op: GatewayOp,
    pub kind: &'static str,
    pub name: String,
    pub namespace: Option<String>,
}

type ObjectKey = (String, Option<String>, String);

fn object_key(kind: &ResourceKind, name: &str, namespace: Option<&str>) -> ObjectKey {
    let namespace = if kind.namespaced() {
        namespace.map(str::to_string)
    } else {
        None
    };
    (format!("{}/{}", kind.api_version(), kind.kind), namespace, name.to_string())
}

fn api_error(code: u16, reason: &str, message: String) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message,
        reason: reason.to_string(),
        code,
    })
}

#[derive(Default)]
struct State {
    objects: BTreeMap<ObjectKey, DynamicObject>,
    workshops: BTreeMap<(String, String), Workshop>,
    calls: Vec<GatewayCall>,
    failures: HashSet<(&'static str, GatewayOp)>,
    next_uid: u64,
    next_version: u64,
}

impl State {
    fn bump_version(&mut self) -> String {
        self.next_version += 1;
        self.next_version.to_string()
    }
}

#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
    simulate_olm: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored Subscription gets a status pointing at a fresh, unapproved InstallPlan.
    pub fn with_olm() -> Self {
        Self {
            simulate_olm: true,
            ..Self::default()
        }
    }

    pub fn fail_on(&self, kind: &'static ResourceKind, op: GatewayOp) {
        self.lock().failures.insert((kind.kind, op));
    }

    pub fn insert(&self, resource: &GeneratedResource) {
        let mut state = self.lock();
        let key = object_key(resource.kind, resource.name(), resource.namespace());
        let mut obj = resource.to_dynamic();
        obj.metadata.resource_version = Some(state.bump_version());
        state.objects.insert(key, obj);
    }

    pub fn object(&self, kind: &ResourceKind, name: &str, namespace: Option<&str>) -> Option<DynamicObject> {
        self.lock().objects.get(&object_key(kind, name, namespace)).cloned()
    }

    pub fn contains(&self, kind: &ResourceKind, name: &str, namespace: Option<&str>) -> bool {
        self.object(kind, name, namespace).is_some()
    }

    pub fn objects(&self) -> Vec<DynamicObject> {
        self.lock().objects.values().cloned().collect()
    }

    pub fn object_count(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn insert_workshop(&self, workshop: Workshop) {
        let mut state = self.lock();
        let key = (workshop.namespace().unwrap_or_default(), workshop.name_any());
        state.workshops.insert(key, workshop);
    }

    pub fn workshop(&self, namespace: &str, name: &str) -> Option<Workshop> {
        self.lock()
            .workshops
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(
        state: &mut State,
        op: GatewayOp,
        kind: &'static ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<(), kube::Error> {
        state.calls.push(GatewayCall {
            op,
            kind: kind.kind,
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
        });
        if state.failures.contains(&(kind.kind, op)) {
            return Err(api_error(
                403,
                "Forbidden",
                format!("{:?} on {} '{}' is forbidden", op, kind.kind, name),
            ));
        }
        Ok(())
    }

    fn attach_install_plan(state: &mut State, subscription: &mut DynamicObject) {
        let namespace = subscription.metadata.namespace.clone();
        let sub_name = subscription.name_any();
        let plan_name = format!("install-{}", sub_name);
        let csv = subscription.data["spec"]["startingCSV"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.v1.0.0", sub_name));

        subscription.data["status"] = json!({
            "currentCSV": csv,
            "installPlanRef": { "name": plan_name, "namespace": namespace },
        });

        let mut plan = DynamicObject::new(&plan_name, &kinds::INSTALL_PLAN.api_resource())
            .data(json!({ "spec": { "approved": false, "clusterServiceVersionNames": [csv] } }));
        plan.metadata.namespace = namespace.clone();
        plan.metadata.resource_version = Some(state.bump_version());
        state.objects.insert(
            object_key(&kinds::INSTALL_PLAN, &plan_name, namespace.as_deref()),
            plan,
        );
    }
}

#[async_trait]
impl ClusterGateway for MemoryGateway {
    async fn create(&self, resource: &GeneratedResource) -> Result<CreateOutcome, kube::Error> {
        let mut state = self.lock();
        Self::record(&mut state, GatewayOp::Create, resource.kind, resource.name(), resource.namespace())?;

        let key = object_key(resource.kind, resource.name(), resource.namespace());
        if state.objects.contains_key(&key) {
            return Ok(CreateOutcome::AlreadyExists);
        }

        let mut obj = resource.to_dynamic();
        state.next_uid += 1;
        obj.metadata.uid = Some(format!("uid-{}", state.next_uid));
        obj.metadata.resource_version = Some(state.bump_version());
        if self.simulate_olm && std::ptr::eq(resource.kind, &kinds::SUBSCRIPTION) {
            Self::attach_install_plan(&mut state, &mut obj);
        }
        state.objects.insert(key, obj);
        Ok(CreateOutcome::Created)
    }

    async fn get(
        &self,
        kind: &'static ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Option<DynamicObject>, kube::Error> {
        let mut state = self.lock();
        Self::record(&mut state, GatewayOp::Get, kind, name, namespace)?;
        Ok(state.objects.get(&object_key(kind, name, namespace)).cloned())
    }

    async fn update(
        &self,
        kind: &'static ResourceKind,
        object: &DynamicObject,
    ) -> Result<DynamicObject, kube::Error> {
        let mut state = self.lock();
        let name = object.name_any();
        let namespace = object.metadata.namespace.as_deref();
        Self::record(&mut state, GatewayOp::Update, kind, &name, namespace)?;

        let key = object_key(kind, &name, namespace);
        let stored_version = match state.objects.get(&key) {
            Some(stored) => stored.metadata.resource_version.clone(),
            None => return Err(api_error(404, "NotFound", format!("{} '{}' not found", kind.kind, name))),
        };
        if object.metadata.resource_version.is_some() && object.metadata.resource_version != stored_version {
            return Err(api_error(409, "Conflict", format!("{} '{}' was modified", kind.kind, name)));
        }

        let mut updated = object.clone();
        updated.metadata.resource_version = Some(state.bump_version());
        state.objects.insert(key, updated.clone());
        Ok(updated)
    }

    async fn delete(
        &self,
        kind: &'static ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<DeleteOutcome, kube::Error> {
        let mut state = self.lock();
        Self::record(&mut state, GatewayOp::Delete, kind, name, namespace)?;
        match state.objects.remove(&object_key(kind, name, namespace)) {
            Some(_) => Ok(DeleteOutcome::Deleted),
            None => Ok(DeleteOutcome::NotFound),
        }
    }
}

#[async_trait]
impl WorkshopStore for MemoryGateway {
    async fn get_workshop(&self, namespace: &str, name: &str) -> Result<Option<Workshop>, kube::Error> {
        Ok(self.workshop(namespace, name))
    }

    async fn set_finalizers(&self, workshop: &Workshop, finalizers: Vec<String>) -> Result<(), kube::Error> {
        let mut state = self.lock();
        let key = (workshop.namespace().unwrap_or_default(), workshop.name_any());
        let Some(stored) = state.workshops.get_mut(&key) else {
            return Err(api_error(404, "NotFound", format!("Workshop '{}' not found", key.1)));
        };
        if stored.metadata.resource_version != workshop.metadata.resource_version {
            return Err(api_error(409, "Conflict", format!("Workshop '{}' was modified", key.1)));
        }

        stored.metadata.finalizers = (!finalizers.is_empty()).then_some(finalizers);
        if stored.metadata.deletion_timestamp.is_some() && stored.metadata.finalizers.is_none() {
            state.workshops.remove(&key);
            return Ok(());
        }
        let version = state.bump_version();
        if let Some(stored) = state.workshops.get_mut(&key) {
            stored.metadata.resource_version = Some(version);
        }
        Ok(())
    }

    async fn patch_status(&self, workshop: &Workshop, status: &WorkshopStatus) -> Result<(), kube::Error> {
        let mut state = self.lock();
        let key = (workshop.namespace().unwrap_or_default(), workshop.name_any());
        match state.workshops.get_mut(&key) {
            Some(stored) => {
                let mark = stored.status.as_ref().and_then(|s| s.provisioned_users);
                let mut next = status.clone();
                next.provisioned_users = next.provisioned_users.or(mark);
                stored.status = Some(next);
                Ok(())
            }
            None => Err(api_error(404, "NotFound", format!("Workshop '{}' not found", key.1))),
        }
    }

    async fn record_provisioned_users(&self, workshop: &Workshop, users: u32) -> Result<(), kube::Error> {
        let mut state = self.lock();
        let key = (workshop.namespace().unwrap_or_default(), workshop.name_any());
        match state.workshops.get_mut(&key) {
            Some(stored) => {
                stored.status.get_or_insert_with(Default::default).provisioned_users = Some(users);
                Ok(())
            }
            None => Err(api_error(404, "NotFound", format!("Workshop '{}' not found", key.1))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::tests::{mark_deleting, test_workshop};
    use crate::resources::ResourceFactory;

    #[tokio::test]
    async fn test_create_twice_reports_already_exists() {
        let gateway = MemoryGateway::new();
        let factory = ResourceFactory::for_workshop(&test_workshop("workshop", 1)).unwrap();
        let ns = factory.reference(&kinds::NAMESPACE, "gitea", None);

        assert_eq!(gateway.create(&ns).await.unwrap(), CreateOutcome::Created);
        assert_eq!(gateway.create(&ns).await.unwrap(), CreateOutcome::AlreadyExists);
        assert_eq!(gateway.object_count(), 1);

        let stored = gateway.get(&kinds::NAMESPACE, "gitea", None).await.unwrap().unwrap();
        assert_eq!(stored.metadata.uid.as_deref(), Some("uid-1"));
    }

    #[tokio::test]
    async fn test_delete_missing_object_is_not_found() {
        let gateway = MemoryGateway::new();
        let outcome = gateway.delete(&kinds::CONFIG_MAP, "absent", Some("workshop")).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_injected_failure_is_an_api_error() {
        let gateway = MemoryGateway::new();
        gateway.fail_on(&kinds::SECRET, GatewayOp::Create);
        let factory = ResourceFactory::for_workshop(&test_workshop("workshop", 1)).unwrap();
        let secret = factory.reference(&kinds::SECRET, "creds", Some("workshop"));

        let err = gateway.create(&secret).await.unwrap_err();
        assert!(crate::gateway::is_status(&err, 403));
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_olm_simulation_attaches_install_plan() {
        let gateway = MemoryGateway::with_olm();
        let factory = ResourceFactory::for_workshop(&test_workshop("workshop", 1)).unwrap();
        let sub = factory.reference(&kinds::SUBSCRIPTION, "gitea-operator", Some("openshift-operators"));
        gateway.create(&sub).await.unwrap();

        let stored = gateway
            .object(&kinds::SUBSCRIPTION, "gitea-operator", Some("openshift-operators"))
            .unwrap();
        assert_eq!(stored.data["status"]["installPlanRef"]["name"], "install-gitea-operator");
        let plan = gateway
            .object(&kinds::INSTALL_PLAN, "install-gitea-operator", Some("openshift-operators"))
            .unwrap();
        assert_eq!(plan.data["spec"]["approved"], false);
    }

    #[tokio::test]
    async fn test_status_patch_keeps_provisioned_mark() {
        let gateway = MemoryGateway::new();
        let workshop = test_workshop("workshop", 3);
        gateway.insert_workshop(workshop.clone());

        gateway.record_provisioned_users(&workshop, 3).await.unwrap();
        gateway
            .patch_status(
                &workshop,
                &WorkshopStatus {
                    message: Some("ready".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let status = gateway.workshop("workshop", "summit").unwrap().status.unwrap();
        assert_eq!(status.provisioned_users, Some(3));
        assert_eq!(status.message.as_deref(), Some("ready"));
    }

    #[tokio::test]
    async fn test_removing_last_finalizer_of_deleting_workshop_removes_it() {
        let gateway = MemoryGateway::new();
        let mut workshop = test_workshop("workshop", 1);
        workshop.metadata.finalizers = Some(vec!["x".to_string()]);
        mark_deleting(&mut workshop);
        gateway.insert_workshop(workshop.clone());

        gateway.set_finalizers(&workshop, vec![]).await.unwrap();
        assert!(gateway.workshop("workshop", "summit").is_none());
    }
}
