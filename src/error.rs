/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/error.rs
*
* Error taxonomy shared by the reconciliation engine, the component reconcilers
* and the cluster gateway. Outcomes that are success-equivalent (an object that
* already exists on create, an object that is already gone on delete) never
* become an `Error`; they are modelled as distinct gateway outcomes instead.
*
* SPDX-License-Identifier: Apache-2.0
*/

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Workshop '{0}' has no namespace")]
    MissingNamespace(String),

    #[error("Workshop '{0}' has no uid; owner references cannot be built")]
    MissingUid(String),

    #[error("Ingress route '{namespace}/{name}' not found")]
    MissingRoute { namespace: String, name: String },

    #[error("Ingress route '{namespace}/{name}' has no spec.host")]
    MissingRouteHost { namespace: String, name: String },

    #[error("Ingress host '{host}' does not start with '{prefix}'")]
    MalformedIngressHost { host: String, prefix: String },

    #[error("Invalid upstream object {kind} '{name}': {reason}")]
    InvalidUpstream {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("Finalizer update failed: {0}")]
    FinalizerError(String),

    #[error("Failed to update Workshop status: {0}")]
    StatusUpdateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Component '{component}' failed: {source}")]
    ComponentFailed {
        component: &'static str,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Error class reported on `workshop_reconcile_errors_total`.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Error::KubeError(_) => "kube",
            Error::MissingNamespace(_) | Error::MissingUid(_) => "metadata",
            Error::MissingRoute { .. }
            | Error::MissingRouteHost { .. }
            | Error::MalformedIngressHost { .. } => "addressing",
            Error::InvalidUpstream { .. } => "upstream",
            Error::FinalizerError(_) => "finalizer",
            Error::StatusUpdateError(_) => "status",
            Error::SerializationError(_) => "serialization",
            Error::ComponentFailed { source, .. } => source.metric_label(),
        }
    }

    /// The component a failed pass stopped at, if the failure came from one.
    pub fn component(&self) -> Option<&'static str> {
        match self {
            Error::ComponentFailed { component, .. } => Some(*component),
            _ => None,
        }
    }
}
