/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/resources/mod.rs
*
* The resource factory. Every object the operator asks the cluster to hold is
* built here, freshly on each pass, from the Workshop and a handful of
* addressing parameters. Building is pure: no network access, no hidden state.
*
* Owner references are attached by the factory itself so no call site can get
* scoping wrong. An object is owned by its Workshop only when its kind is
* namespaced and it lives in the Workshop's own namespace; cluster-scoped
* objects and objects in other namespaces carry no owner reference, because
* the API server rejects such references.
*
* SPDX-License-Identifier: Apache-2.0
*/

pub mod builders;
pub mod custom;
pub mod kinds;
pub mod olm;

use crate::crds::Workshop;
use crate::error::{Error, Result};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{DynamicObject, ObjectMeta};
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;

pub use kinds::ResourceKind;

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";
pub const PART_OF_LABEL: &str = "app.kubernetes.io/part-of";
pub const WORKSHOP_LABEL: &str = "workshop.stakater.com/workshop";
pub const MANAGER_NAME: &str = "workshop-operator";

/// An object produced by the factory, ready to hand to the cluster gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedResource {
    pub kind: &'static ResourceKind,
    pub metadata: ObjectMeta,
    /// Top-level fields besides `apiVersion`, `kind` and `metadata`.
    pub body: serde_json::Value,
}

impl GeneratedResource {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }

    pub fn has_owner_reference(&self) -> bool {
        self.metadata
            .owner_references
            .as_ref()
            .is_some_and(|refs| !refs.is_empty())
    }

    pub fn to_dynamic(&self) -> DynamicObject {
        let mut obj = DynamicObject::new(self.name(), &self.kind.api_resource()).data(self.body.clone());
        obj.metadata = self.metadata.clone();
        obj
    }

    /// `Kind namespace/name`, for logs.
    pub fn display_id(&self) -> String {
        match self.namespace() {
            Some(ns) => format!("{} {}/{}", self.kind.kind, ns, self.name()),
            None => format!("{} {}", self.kind.kind, self.name()),
        }
    }
}

/// Builds `GeneratedResource`s on behalf of one Workshop.
#[derive(Debug, Clone)]
pub struct ResourceFactory {
    owner: OwnerReference,
    owner_namespace: String,
    workshop_name: String,
}

impl ResourceFactory {
    pub fn for_workshop(workshop: &Workshop) -> Result<Self> {
        let workshop_name = workshop.name_any();
        let owner_namespace = workshop
            .namespace()
            .ok_or_else(|| Error::MissingNamespace(workshop_name.clone()))?;
        let owner = workshop
            .controller_owner_ref(&())
            .ok_or_else(|| Error::MissingUid(workshop_name.clone()))?;

        Ok(Self {
            owner,
            owner_namespace,
            workshop_name,
        })
    }

    pub fn owner_namespace(&self) -> &str {
        &self.owner_namespace
    }

    pub fn workshop_name(&self) -> &str {
        &self.workshop_name
    }

    /// Labels stamped on every generated object, plus `part-of` for the component.
    pub fn labels(&self, part_of: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            (MANAGED_BY_LABEL.to_string(), MANAGER_NAME.to_string()),
            (WORKSHOP_LABEL.to_string(), self.workshop_name.clone()),
            (PART_OF_LABEL.to_string(), part_of.to_string()),
        ])
    }

    /// Builds an object of `kind`. A namespaced kind given no namespace lands in
    /// the Workshop's namespace; a cluster-scoped kind drops any namespace given.
    pub fn build(
        &self,
        kind: &'static ResourceKind,
        name: impl Into<String>,
        namespace: Option<&str>,
        labels: BTreeMap<String, String>,
        body: serde_json::Value,
    ) -> GeneratedResource {
        let namespace = if kind.namespaced() {
            Some(namespace.unwrap_or(&self.owner_namespace).to_string())
        } else {
            None
        };
        let owned = kind.supports_owner_reference()
            && namespace.as_deref() == Some(self.owner_namespace.as_str());

        GeneratedResource {
            kind,
            metadata: ObjectMeta {
                name: Some(name.into()),
                namespace,
                labels: Some(labels),
                owner_references: owned.then(|| vec![self.owner.clone()]),
                ..Default::default()
            },
            body,
        }
    }

    /// A bare reference used to address an object for reads and deletes.
    pub fn reference(
        &self,
        kind: &'static ResourceKind,
        name: impl Into<String>,
        namespace: Option<&str>,
    ) -> GeneratedResource {
        self.build(kind, name, namespace, BTreeMap::new(), serde_json::json!({}))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crds::WorkshopSpec;

    pub(crate) fn test_workshop(namespace: &str, users: i32) -> Workshop {
        let mut spec = WorkshopSpec::default();
        spec.user.number = users;
        spec.user.password = "openshift".to_string();
        let mut workshop = Workshop::new("summit", spec);
        workshop.metadata.namespace = Some(namespace.to_string());
        workshop.metadata.uid = Some("0d7f0c1e-workshop-uid".to_string());
        workshop
    }

    /// Sets a deletion timestamp the way the API server does on delete.
    pub(crate) fn mark_deleting(workshop: &mut Workshop) {
        workshop.metadata.deletion_timestamp =
            Some(serde_json::from_value(serde_json::json!("2025-06-01T12:00:00Z")).unwrap());
    }

    #[test]
    fn test_same_namespace_resource_is_owned() {
        let factory = ResourceFactory::for_workshop(&test_workshop("workshop", 1)).unwrap();
        let cm = factory.build(
            &kinds::CONFIG_MAP,
            "settings",
            Some("workshop"),
            factory.labels("portal"),
            serde_json::json!({ "data": {} }),
        );

        assert!(cm.has_owner_reference());
        let owner = &cm.metadata.owner_references.as_ref().unwrap()[0];
        assert_eq!(owner.kind, "Workshop");
        assert_eq!(owner.name, "summit");
        assert_eq!(owner.controller, Some(true));
    }

    #[test]
    fn test_cross_namespace_resource_is_not_owned() {
        let factory = ResourceFactory::for_workshop(&test_workshop("workshop", 1)).unwrap();
        let cm = factory.build(
            &kinds::CONFIG_MAP,
            "settings",
            Some("gitea"),
            BTreeMap::new(),
            serde_json::json!({}),
        );
        assert!(!cm.has_owner_reference());
        assert_eq!(cm.namespace(), Some("gitea"));
    }

    #[test]
    fn test_cluster_scoped_resource_is_not_owned_and_has_no_namespace() {
        let factory = ResourceFactory::for_workshop(&test_workshop("workshop", 1)).unwrap();
        let ns = factory.build(
            &kinds::NAMESPACE,
            "gitea",
            Some("workshop"),
            BTreeMap::new(),
            serde_json::json!({}),
        );
        assert!(!ns.has_owner_reference());
        assert_eq!(ns.namespace(), None);
    }

    #[test]
    fn test_factory_requires_uid_and_namespace() {
        let mut workshop = test_workshop("workshop", 1);
        workshop.metadata.uid = None;
        assert!(matches!(
            ResourceFactory::for_workshop(&workshop),
            Err(Error::MissingUid(_))
        ));

        let mut workshop = test_workshop("workshop", 1);
        workshop.metadata.namespace = None;
        assert!(matches!(
            ResourceFactory::for_workshop(&workshop),
            Err(Error::MissingNamespace(_))
        ));
    }

    #[test]
    fn test_to_dynamic_carries_type_metadata_and_body() {
        let factory = ResourceFactory::for_workshop(&test_workshop("workshop", 1)).unwrap();
        let cm = factory.build(
            &kinds::CONFIG_MAP,
            "settings",
            None,
            factory.labels("portal"),
            serde_json::json!({ "data": { "key": "value" } }),
        );
        let obj = cm.to_dynamic();
        let types = obj.types.as_ref().unwrap();
        assert_eq!(types.kind, "ConfigMap");
        assert_eq!(types.api_version, "v1");
        assert_eq!(obj.metadata.namespace.as_deref(), Some("workshop"));
        assert_eq!(obj.data["data"]["key"], "value");
    }
}
