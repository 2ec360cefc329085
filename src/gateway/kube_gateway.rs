/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/gateway/kube_gateway.rs
*
* `ClusterGateway` and `WorkshopStore` backed by a live `kube::Client`. Every
* kind goes through `Api<DynamicObject>`, addressed by the static kind table,
* so the gateway needs no per-kind code.
*
* SPDX-License-Identifier: Apache-2.0
*/

use super::{is_status, ClusterGateway, CreateOutcome, DeleteOutcome, WorkshopStore};
use crate::crds::{Workshop, WorkshopStatus};
use crate::resources::{GeneratedResource, ResourceKind};
use async_trait::async_trait;
use kube::{
    api::{Api, DeleteParams, DynamicObject, Patch, PatchParams, PostParams},
    client::Client,
    ResourceExt,
};
use serde_json::json;
use tracing::debug;

#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    field_manager: String,
}

impl KubeGateway {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
        }
    }

    fn api(&self, kind: &ResourceKind, namespace: Option<&str>) -> Api<DynamicObject> {
        let ar = kind.api_resource();
        match namespace {
            Some(ns) if kind.namespaced() => Api::namespaced_with(self.client.clone(), ns, &ar),
            _ => Api::all_with(self.client.clone(), &ar),
        }
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            dry_run: false,
            field_manager: Some(self.field_manager.clone()),
        }
    }

    fn workshops(&self, namespace: &str) -> Api<Workshop> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ClusterGateway for KubeGateway {
    async fn create(&self, resource: &GeneratedResource) -> Result<CreateOutcome, kube::Error> {
        let api = self.api(resource.kind, resource.namespace());
        match api.create(&self.post_params(), &resource.to_dynamic()).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) if is_status(&e, 409) => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }

    async fn get(
        &self,
        kind: &'static ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Option<DynamicObject>, kube::Error> {
        self.api(kind, namespace).get_opt(name).await
    }

    async fn update(
        &self,
        kind: &'static ResourceKind,
        object: &DynamicObject,
    ) -> Result<DynamicObject, kube::Error> {
        let api = self.api(kind, object.metadata.namespace.as_deref());
        api.replace(&object.name_any(), &self.post_params(), object).await
    }

    async fn delete(
        &self,
        kind: &'static ResourceKind,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<DeleteOutcome, kube::Error> {
        match self.api(kind, namespace).delete(name, &DeleteParams::background()).await {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(e) if is_status(&e, 404) => Ok(DeleteOutcome::NotFound),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl WorkshopStore for KubeGateway {
    async fn get_workshop(&self, namespace: &str, name: &str) -> Result<Option<Workshop>, kube::Error> {
        self.workshops(namespace).get_opt(name).await
    }

    async fn set_finalizers(&self, workshop: &Workshop, finalizers: Vec<String>) -> Result<(), kube::Error> {
        let namespace = workshop.namespace().unwrap_or_default();
        let name = workshop.name_any();
        debug!(workshop = %name, ?finalizers, "Patching finalizers");

        // resourceVersion makes the merge patch fail with 409 on a stale read.
        let patch = json!({
            "metadata": {
                "finalizers": finalizers,
                "resourceVersion": workshop.resource_version(),
            }
        });
        self.workshops(&namespace)
            .patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn patch_status(&self, workshop: &Workshop, status: &WorkshopStatus) -> Result<(), kube::Error> {
        let namespace = workshop.namespace().unwrap_or_default();
        let patch = json!({ "status": status });
        self.workshops(&namespace)
            .patch_status(&workshop.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn record_provisioned_users(&self, workshop: &Workshop, users: u32) -> Result<(), kube::Error> {
        let namespace = workshop.namespace().unwrap_or_default();
        let name = workshop.name_any();
        debug!(workshop = %name, users, "Raising provisioned learner mark");
        let patch = json!({ "status": { "provisionedUsers": users } });
        self.workshops(&namespace)
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::tests::test_workshop;
    use crate::resources::{builders, kinds, ResourceFactory};
    use http::{Method, Request, Response};
    use kube::client::Body;
    use std::collections::BTreeMap;
    use tower_test::mock::{self, Handle};

    type ApiHandle = Handle<Request<Body>, Response<Body>>;

    fn gateway() -> (KubeGateway, ApiHandle) {
        let (service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        let client = Client::new(service, "default");
        (KubeGateway::new(client, "workshop-operator"), handle)
    }

    fn status(code: u16, reason: &str) -> Response<Body> {
        let body = json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": format!("{} from the API server", reason),
            "reason": reason,
            "code": code,
        });
        Response::builder()
            .status(code)
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    /// Answers exactly one request with `response`, checking its method and path.
    fn answer_once(
        mut handle: ApiHandle,
        method: Method,
        path: &'static str,
        response: Response<Body>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let (request, send) = handle.next_request().await.expect("service not called");
            assert_eq!(request.method(), method);
            assert_eq!(request.uri().path(), path);
            send.send_response(response);
        })
    }

    fn config_map() -> GeneratedResource {
        let workshop = test_workshop("workshop", 1);
        let factory = ResourceFactory::for_workshop(&workshop).unwrap();
        builders::config_map(&factory, "portal-settings", "workshop", factory.labels("portal"), BTreeMap::new())
    }

    #[tokio::test]
    async fn test_create_conflict_is_already_exists() {
        let (gateway, handle) = gateway();
        let server = answer_once(
            handle,
            Method::POST,
            "/api/v1/namespaces/workshop/configmaps",
            status(409, "AlreadyExists"),
        );

        let outcome = gateway.create(&config_map()).await.unwrap();
        assert_eq!(outcome, CreateOutcome::AlreadyExists);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_create_success_is_created() {
        let (gateway, handle) = gateway();
        let created = serde_json::to_vec(&config_map().to_dynamic()).unwrap();
        let response = Response::builder().status(201).body(Body::from(created)).unwrap();
        let server = answer_once(handle, Method::POST, "/api/v1/namespaces/workshop/configmaps", response);

        assert_eq!(gateway.create(&config_map()).await.unwrap(), CreateOutcome::Created);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let (gateway, handle) = gateway();
        let server = answer_once(handle, Method::DELETE, "/api/v1/namespaces/staging2", status(404, "NotFound"));

        let outcome = gateway.delete(&kinds::NAMESPACE, "staging2", None).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::NotFound);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_forbidden_create_is_an_error() {
        let (gateway, handle) = gateway();
        let server = answer_once(
            handle,
            Method::POST,
            "/api/v1/namespaces/workshop/configmaps",
            status(403, "Forbidden"),
        );

        let err = gateway.create(&config_map()).await.unwrap_err();
        assert!(is_status(&err, 403));
        server.await.unwrap();
    }
}
