pub mod controller;
pub mod coordination;
pub mod crd;
pub mod resources;

pub use controller::{
    error_policy, reconcile, BackoffConfig, Context, ControllerConfig, Error, Result,
    STORAGE_FINALIZER,
};
pub use crd::{SolrCluster, ZookeeperCluster};

use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Secret, Service};
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;

/// Helper to create a namespaced or cluster-wide API based on scope.
fn scoped_api<T>(client: Client, namespace: Option<&str>) -> Api<T>
where
    T: Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    <T as Resource>::DynamicType: Default,
    T: Clone + DeserializeOwned + std::fmt::Debug,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

/// Run the operator controller (cluster-wide).
///
/// This is the main controller loop that watches SolrCluster resources and
/// reconciles them. It can be called from main.rs or spawned as a
/// background task during tests.
pub async fn run_controller(client: Client, config: ControllerConfig) {
    run_controller_scoped(client, config, None).await
}

/// Run the operator controller with optional namespace scoping.
///
/// When `namespace` is `Some(ns)`, only watches resources in that namespace.
/// When `namespace` is `None`, watches resources cluster-wide.
pub async fn run_controller_scoped(
    client: Client,
    config: ControllerConfig,
    namespace: Option<&str>,
) {
    let scope_msg = namespace.unwrap_or("cluster-wide");
    tracing::info!(
        "Starting controller for SolrCluster resources (scope: {})",
        scope_msg
    );

    let use_zookeeper_crd = config.use_zookeeper_crd;
    let ctx = Arc::new(Context::new(client.clone(), config));

    // Set up APIs for the controller (namespaced or cluster-wide)
    let clusters: Api<SolrCluster> = scoped_api(client.clone(), namespace);
    let statefulsets: Api<StatefulSet> = scoped_api(client.clone(), namespace);
    let services: Api<Service> = scoped_api(client.clone(), namespace);
    let configmaps: Api<ConfigMap> = scoped_api(client.clone(), namespace);
    let secrets: Api<Secret> = scoped_api(client.clone(), namespace);
    let ingresses: Api<Ingress> = scoped_api(client.clone(), namespace);

    // Configure watcher to handle dynamic resource creation
    let watcher_config = WatcherConfig::default().any_semantic();

    // Watch SolrCluster and all owned resources to trigger reconciliation
    let mut controller = Controller::new(clusters, watcher_config.clone())
        .owns(statefulsets, watcher_config.clone())
        .owns(services, watcher_config.clone())
        .owns(secrets, watcher_config.clone())
        .owns(ingresses, watcher_config.clone())
        .owns(configmaps.clone(), watcher_config.clone());

    if use_zookeeper_crd {
        let zk_clusters: Api<ZookeeperCluster> = scoped_api(client.clone(), namespace);
        controller = controller.owns(zk_clusters, watcher_config.clone());
    }

    // User-provided ConfigMaps are not owned; map them back to the clusters
    // referencing them so config edits re-trigger reconciliation
    let store = controller.store();
    let controller = controller.watches(configmaps, watcher_config, move |config_map| {
        let config_map_name = config_map.name_any();
        let config_map_ns = config_map.namespace();
        store
            .state()
            .into_iter()
            .filter(|cluster| {
                cluster.namespace() == config_map_ns
                    && cluster.spec.provided_config_map.as_deref() == Some(config_map_name.as_str())
            })
            .map(|cluster| ObjectRef::from_obj(cluster.as_ref()))
            .collect::<Vec<_>>()
    });

    controller
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => {
                    tracing::debug!("Reconciled: {}", obj.name);
                }
                Err(e) => {
                    // NotFound errors are expected after deletion when
                    // related watch events trigger reconciliation for a
                    // deleted object; log those at debug level
                    let is_not_found = format!("{:?}", e).contains("NotFound");
                    if is_not_found {
                        tracing::debug!("Object no longer exists (likely deleted): {:?}", e);
                    } else {
                        tracing::error!("Reconciliation error: {:?}", e);
                    }
                }
            }
        })
        .await;

    // This should never complete in normal operation
    tracing::error!("Controller stream ended unexpectedly");
}
