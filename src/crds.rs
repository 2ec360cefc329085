/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/crds.rs
*
* This file defines the Rust data structures that correspond to the `Workshop`
* Custom Resource Definition. By using the `kube::CustomResource` derive macro,
* we get a strongly-typed representation of the API, enabling safe interaction
* with the Kubernetes API server.
*
* Architecture:
* - `WorkshopSpec` is the operator's desired state: learner count, the source
*   repository learners work from, and one section per platform component with
*   its enable flag and sub-configuration.
* - Every section is `#[serde(default)]` so partial documents deserialize and
*   the operator can fill in the blanks.
* - `serde` attributes map between idiomatic Rust `snake_case` and idiomatic
*   Kubernetes `camelCase`.
* - `schemars` generates the OpenAPI v3 schema embedded into the CRD manifest.
*
* SPDX-License-Identifier: Apache-2.0
*/

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// --- Workshop Custom Resource Definition ---

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "workshop.stakater.com",
    version = "v1",
    kind = "Workshop",
    namespaced,
    status = "WorkshopStatus",
    printcolumn = r#"{"name":"Users", "type":"integer", "jsonPath":".spec.user.number"}"#,
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"Component", "type":"string", "jsonPath":".status.component"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#,
    shortname = "ws"
)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopSpec {
    #[serde(default)]
    pub user: UserSpec,
    #[serde(default)]
    pub source: SourceSpec,
    #[serde(default)]
    pub infrastructure: InfrastructureSpec,
}

impl WorkshopSpec {
    /// Number of learners, clamped to zero for negative input.
    pub fn user_count(&self) -> u32 {
        u32::try_from(self.user.number.max(0)).unwrap_or(0)
    }
}

impl Workshop {
    /// The recorded high-water mark of provisioned learners.
    pub fn recorded_users(&self) -> u32 {
        self.status.as_ref().and_then(|s| s.provisioned_users).unwrap_or(0)
    }

    /// Learners that may still own objects on the cluster: the current count or
    /// the highest count ever provisioned, whichever is larger.
    pub fn provisioned_user_count(&self) -> u32 {
        self.spec.user_count().max(self.recorded_users())
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    #[serde(default)]
    pub number: i32,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpec {
    #[serde(default)]
    pub git_url: String,
    #[serde(default)]
    pub git_branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
}

impl SourceSpec {
    /// The ref learners check out: an explicit ref wins over the branch.
    pub fn effective_ref(&self) -> &str {
        self.git_ref.as_deref().unwrap_or(&self.git_branch)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureSpec {
    #[serde(default)]
    pub guide: GuideSpec,
    #[serde(default)]
    pub portal: PortalSpec,
    #[serde(default)]
    pub project: ProjectSpec,
    #[serde(default)]
    pub identity: Toggle,
    #[serde(default)]
    pub gitea: GiteaSpec,
    #[serde(default)]
    pub pipeline: OperatorComponentSpec,
    #[serde(default)]
    pub gitops: OperatorComponentSpec,
    #[serde(default)]
    pub code_ready_workspace: CodeReadyWorkspaceSpec,
    #[serde(default)]
    pub service_mesh: ServiceMeshSpec,
    #[serde(default)]
    pub serverless: OperatorComponentSpec,
    #[serde(default)]
    pub vault: VaultSpec,
    #[serde(default)]
    pub cert_manager: OperatorComponentSpec,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Toggle {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuideSpec {
    #[serde(default)]
    pub scholars: ScholarsSpec,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScholarsSpec {
    #[serde(default)]
    pub enabled: bool,
    /// Guide name to guide URL. Ordered so the generated module list is stable.
    #[serde(default)]
    pub guide_url: BTreeMap<String, String>,
}

/// Container image reference.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tag: String,
}

impl ImageSpec {
    /// `name:tag`, falling back to the given default for empty fields.
    pub fn reference_or(&self, default_name: &str, default_tag: &str) -> String {
        let name = if self.name.is_empty() { default_name } else { &self.name };
        let tag = if self.tag.is_empty() { default_tag } else { &self.tag };
        format!("{}:{}", name, tag)
    }
}

/// OLM subscription parameters.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperatorHubSpec {
    #[serde(default)]
    pub channel: String,
    /// Pins the subscription to a specific CSV when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_service_version: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortalSpec {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub admin_password: String,
    #[serde(default)]
    pub image: ImageSpec,
}

impl Default for PortalSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            admin_password: String::new(),
            image: ImageSpec::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub staging_name: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GiteaSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub image: ImageSpec,
    #[serde(default)]
    pub operator_hub: OperatorHubSpec,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatorComponentSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub operator_hub: OperatorHubSpec,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeReadyWorkspaceSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub operator_hub: OperatorHubSpec,
    #[serde(default, rename = "openshiftOAuth")]
    pub openshift_oauth: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceMeshSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub service_mesh_operator_hub: OperatorHubSpec,
    #[serde(default)]
    pub elastic_search_operator_hub: OperatorHubSpec,
    #[serde(default)]
    pub jaeger_operator_hub: OperatorHubSpec,
    #[serde(default)]
    pub kiali_operator_hub: OperatorHubSpec,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultSpec {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub image: ImageSpec,
    #[serde(default)]
    pub agent_injector_image: ImageSpec,
}

// --- Status ---

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub enum WorkshopPhase {
    Progressing,
    Blocked,
    Ready,
    Failed,
    Terminating,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkshopStatus {
    // Serialized as null when unset so a merge patch clears a stale value.
    #[serde(default)]
    pub phase: Option<WorkshopPhase>,
    /// The component the last pass stopped at.
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// RFC 3339 time of the last phase, component or message change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
    /// Highest learner count a forward pass has ever provisioned. Only ever
    /// raised, and left untouched by patches that do not set it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioned_users: Option<u32>,
}

impl WorkshopStatus {
    /// Equality ignoring `last_transition_time`.
    pub fn same_state(&self, other: &WorkshopStatus) -> bool {
        self.phase == other.phase && self.component == other.component && self.message == other.message
    }
}
