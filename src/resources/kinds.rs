/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/resources/kinds.rs
*
* Static table of every kind the operator generates or reads. Scope is a
* property of the kind, fixed at compile time, and it alone decides whether a
* generated object may carry an owner reference back to its Workshop.
*
* SPDX-License-Identifier: Apache-2.0
*/

use kube::api::ApiResource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Cluster,
    Namespaced,
}

/// A Kubernetes kind with the addressing information needed by the gateway.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    pub group: &'static str,
    pub version: &'static str,
    pub kind: &'static str,
    pub plural: &'static str,
    pub scope: Scope,
}

impl ResourceKind {
    pub const fn namespaced(&self) -> bool {
        matches!(self.scope, Scope::Namespaced)
    }

    /// Cluster-scoped objects must not point at a namespaced owner.
    pub const fn supports_owner_reference(&self) -> bool {
        self.namespaced()
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.to_string()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.to_string(),
            version: self.version.to_string(),
            api_version: self.api_version(),
            kind: self.kind.to_string(),
            plural: self.plural.to_string(),
        }
    }
}

const fn kind(
    group: &'static str,
    version: &'static str,
    kind: &'static str,
    plural: &'static str,
    scope: Scope,
) -> ResourceKind {
    ResourceKind {
        group,
        version,
        kind,
        plural,
        scope,
    }
}

// --- Core / apps / rbac ---
pub static NAMESPACE: ResourceKind = kind("", "v1", "Namespace", "namespaces", Scope::Cluster);
pub static CONFIG_MAP: ResourceKind = kind("", "v1", "ConfigMap", "configmaps", Scope::Namespaced);
pub static SECRET: ResourceKind = kind("", "v1", "Secret", "secrets", Scope::Namespaced);
pub static SERVICE: ResourceKind = kind("", "v1", "Service", "services", Scope::Namespaced);
pub static SERVICE_ACCOUNT: ResourceKind =
    kind("", "v1", "ServiceAccount", "serviceaccounts", Scope::Namespaced);
pub static DEPLOYMENT: ResourceKind = kind("apps", "v1", "Deployment", "deployments", Scope::Namespaced);
pub static ROLE_BINDING: ResourceKind = kind(
    "rbac.authorization.k8s.io",
    "v1",
    "RoleBinding",
    "rolebindings",
    Scope::Namespaced,
);
pub static CLUSTER_ROLE_BINDING: ResourceKind = kind(
    "rbac.authorization.k8s.io",
    "v1",
    "ClusterRoleBinding",
    "clusterrolebindings",
    Scope::Cluster,
);

// --- OpenShift ---
pub static ROUTE: ResourceKind = kind("route.openshift.io", "v1", "Route", "routes", Scope::Namespaced);
pub static USER: ResourceKind = kind("user.openshift.io", "v1", "User", "users", Scope::Cluster);
pub static IDENTITY: ResourceKind = kind("user.openshift.io", "v1", "Identity", "identities", Scope::Cluster);
pub static USER_IDENTITY_MAPPING: ResourceKind = kind(
    "user.openshift.io",
    "v1",
    "UserIdentityMapping",
    "useridentitymappings",
    Scope::Cluster,
);

// --- Operator Lifecycle Manager ---
pub static SUBSCRIPTION: ResourceKind = kind(
    "operators.coreos.com",
    "v1alpha1",
    "Subscription",
    "subscriptions",
    Scope::Namespaced,
);
pub static INSTALL_PLAN: ResourceKind = kind(
    "operators.coreos.com",
    "v1alpha1",
    "InstallPlan",
    "installplans",
    Scope::Namespaced,
);
pub static OPERATOR_GROUP: ResourceKind = kind(
    "operators.coreos.com",
    "v1",
    "OperatorGroup",
    "operatorgroups",
    Scope::Namespaced,
);

// --- Component custom resources ---
pub static GITEA: ResourceKind = kind("gpte.opentlc.com", "v1", "Gitea", "giteas", Scope::Namespaced);
pub static ARGO_CD: ResourceKind = kind("argoproj.io", "v1alpha1", "ArgoCD", "argocds", Scope::Namespaced);
pub static CHE_CLUSTER: ResourceKind =
    kind("org.eclipse.che", "v1", "CheCluster", "checlusters", Scope::Namespaced);
pub static SERVICE_MESH_CONTROL_PLANE: ResourceKind = kind(
    "maistra.io",
    "v2",
    "ServiceMeshControlPlane",
    "servicemeshcontrolplanes",
    Scope::Namespaced,
);
pub static SERVICE_MESH_MEMBER_ROLL: ResourceKind = kind(
    "maistra.io",
    "v1",
    "ServiceMeshMemberRoll",
    "servicemeshmemberrolls",
    Scope::Namespaced,
);
pub static KNATIVE_SERVING: ResourceKind = kind(
    "operator.knative.dev",
    "v1alpha1",
    "KnativeServing",
    "knativeservings",
    Scope::Namespaced,
);
pub static CERT_MANAGER: ResourceKind = kind(
    "operator.openshift.io",
    "v1alpha1",
    "CertManager",
    "certmanagers",
    Scope::Namespaced,
);
