/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/controllers/finalizer.rs
*
* The Workshop's teardown marker. It is attached on first sight of a live
* Workshop and removed only after a complete reverse teardown, so deleting a
* Workshop can never leak the cluster-scoped and cross-namespace objects that
* carry no owner reference.
*
* SPDX-License-Identifier: Apache-2.0
*/

use crate::crds::Workshop;
use crate::error::{Error, Result};
use crate::gateway::WorkshopStore;
use kube::ResourceExt;
use tracing::info;

pub const FINALIZER: &str = "finalizer.workshop.stakater.com";

pub fn has_finalizer(workshop: &Workshop) -> bool {
    workshop.finalizers().iter().any(|f| f == FINALIZER)
}

pub fn is_deleting(workshop: &Workshop) -> bool {
    workshop.metadata.deletion_timestamp.is_some()
}

/// Adds the finalizer unless it is already present.
pub async fn attach(store: &dyn WorkshopStore, workshop: &Workshop) -> Result<()> {
    if has_finalizer(workshop) {
        return Ok(());
    }
    let mut finalizers = workshop.finalizers().to_vec();
    finalizers.push(FINALIZER.to_string());
    store
        .set_finalizers(workshop, finalizers)
        .await
        .map_err(|e| Error::FinalizerError(format!("attaching to '{}': {}", workshop.name_any(), e)))?;
    info!(workshop = %workshop.name_any(), "Finalizer attached");
    Ok(())
}

/// Removes the finalizer, leaving any other finalizers untouched.
pub async fn detach(store: &dyn WorkshopStore, workshop: &Workshop) -> Result<()> {
    if !has_finalizer(workshop) {
        return Ok(());
    }
    let finalizers: Vec<String> = workshop
        .finalizers()
        .iter()
        .filter(|f| f.as_str() != FINALIZER)
        .cloned()
        .collect();
    store
        .set_finalizers(workshop, finalizers)
        .await
        .map_err(|e| Error::FinalizerError(format!("removing from '{}': {}", workshop.name_any(), e)))?;
    info!(workshop = %workshop.name_any(), "Finalizer removed");
    Ok(())
}
