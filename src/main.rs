/*
* Copyright (C) 2025 Pedro Henrique / phkaiser13
*
* File: src/main.rs
*
* Entry point of the workshop-operator. It wires the process together and then
* hands control to the kube-runtime controller:
*
* 1. Configuration is read from the environment.
* 2. Telemetry: a JSON `tracing` subscriber filtered by `RUST_LOG`, plus the
*    Jaeger layer when enabled.
* 3. A Kubernetes client and the `KubeGateway` built on it.
* 4. The Prometheus registry, served on `/metrics` by a small warp server.
* 5. A `Controller` for `Workshop` that also watches the Deployments, Services
*    and ConfigMaps a Workshop owns, so drift in those re-triggers the owner.
*
* The metrics server and the controller run side by side under `tokio::join!`.
*
* SPDX-License-Identifier: Apache-2.0
*/

use anyhow::Context as _;
use futures::stream::StreamExt;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::{Api, Client};
use kube_runtime::{watcher, Controller};
use opentelemetry::global;
use prometheus::{Encoder, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warp::Filter;

mod components;
mod config;
mod controllers;
mod crds;
mod error;
mod gateway;
mod metrics;
mod resources;

use config::OperatorConfig;
use controllers::engine::Engine;
use controllers::workshop_controller::{self, Context};
use crds::Workshop;
use gateway::KubeGateway;

/// Installs the global subscriber. The Jaeger layer is only built when asked for.
fn init_telemetry(jaeger_enabled: bool) -> anyhow::Result<()> {
    let telemetry = if jaeger_enabled {
        let tracer = opentelemetry_jaeger::new_agent_pipeline()
            .with_service_name("workshop-operator")
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("installing the Jaeger pipeline")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json();

    tracing_subscriber::registry()
        .with(filter)
        .with(telemetry)
        .with(fmt_layer)
        .try_init()
        .context("installing the tracing subscriber")?;
    Ok(())
}

/// Renders the metrics into the Prometheus text format.
async fn metrics_handler(registry: Arc<Registry>) -> Result<impl warp::Reply, warp::Rejection> {
    let encoder = TextEncoder::new();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
    }

    let response = String::from_utf8_lossy(&buffer).into_owned();
    Ok(warp::reply::with_header(
        response,
        "Content-Type",
        encoder.format_type(),
    ))
}

/// Runs the HTTP server that exposes `/metrics`.
async fn run_metrics_server(registry: Arc<Registry>, addr: SocketAddr) {
    let metrics_route = warp::path("metrics")
        .and(warp::get())
        .and(warp::any().map(move || Arc::clone(&registry)))
        .and_then(metrics_handler);

    info!(%addr, "Starting metrics server");
    warp::serve(metrics_route).run(addr).await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = OperatorConfig::from_env()?;
    init_telemetry(config.jaeger_enabled)?;
    info!(?config, "Configuration loaded");

    let client = Client::try_default()
        .await
        .context("creating the Kubernetes client")?;

    let registry = Arc::new(metrics::create_and_register_metrics()?);
    info!("Custom metrics registered.");

    let workshops = Api::<Workshop>::all(client.clone());
    let metrics_addr = config.metrics_addr;
    let context = Arc::new(Context {
        gateway: KubeGateway::new(client.clone(), config.field_manager.clone()),
        engine: Engine::standard(),
        config,
    });

    info!(components = ?context.engine.component_names(), "Workshop operator starting...");

    tokio::join!(
        run_metrics_server(registry.clone(), metrics_addr),
        Controller::new(workshops, watcher::Config::default())
            .owns(Api::<Deployment>::all(client.clone()), watcher::Config::default())
            .owns(Api::<Service>::all(client.clone()), watcher::Config::default())
            .owns(Api::<ConfigMap>::all(client.clone()), watcher::Config::default())
            .shutdown_on_signal()
            .run(
                workshop_controller::reconcile,
                workshop_controller::on_error,
                context.clone(),
            )
            .for_each(|res| async move {
                match res {
                    Ok(o) => info!("Reconciled Workshop: {:?}", o),
                    Err(e) => error!("Workshop reconcile error: {}", e),
                }
            }),
    );

    info!("Workshop operator shutting down.");
    global::shutdown_tracer_provider();

    Ok(())
}
