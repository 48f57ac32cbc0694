//! Storage lifecycle management
//!
//! Ownership-based garbage collection is deliberately bypassed for data
//! volumes: the StatefulSet owns its claims only loosely, and scale-down
//! leaves orphans behind. A finalizer on the SolrCluster guards deletion so
//! claims can be removed exactly when the user asked for Delete reclaim
//! semantics, and never before the cluster has settled.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams};
use kube::{Api, ResourceExt};
use tracing::{error, info};

use crate::controller::context::Context;
use crate::controller::error::Result;
use crate::controller::update::pod_ordinal;
use crate::crd::{SolrCluster, VolumeReclaimPolicy};
use crate::resources::common::{label_selector_string, FIELD_MANAGER};

/// Finalizer guarding persistent volume claims with Delete reclaim policy
pub const STORAGE_FINALIZER: &str = "solr.example.com/storage-finalizer";

/// A claim is orphaned when its ordinal is at or past the desired replica
/// count
pub fn is_pvc_orphan(pvc_name: &str, replicas: i32) -> bool {
    pod_ordinal(pvc_name).map(|ord| ord >= replicas).unwrap_or(false)
}

fn has_finalizer(cluster: &SolrCluster) -> bool {
    cluster
        .metadata
        .finalizers
        .as_ref()
        .map(|f| f.iter().any(|name| name == STORAGE_FINALIZER))
        .unwrap_or(false)
}

/// Drive the finalizer state machine and claim cleanup for one pass.
///
/// `pvc_selector` comes from the live StatefulSet's selector; callers must
/// not invoke this with an empty selector or cleanup could match every
/// claim in the namespace.
pub async fn reconcile_storage_finalizer(
    ctx: &Context,
    cluster: &SolrCluster,
    pvc_selector: &BTreeMap<String, String>,
) -> Result<()> {
    let uses_delete_reclaim = cluster
        .spec
        .storage_options
        .persistent_storage
        .as_ref()
        .map(|storage| storage.volume_reclaim_policy == VolumeReclaimPolicy::Delete)
        .unwrap_or(false);

    if uses_delete_reclaim {
        if cluster.metadata.deletion_timestamp.is_none() {
            if !has_finalizer(cluster) {
                add_finalizer(ctx, cluster).await?;
            }
            cleanup_orphan_pvcs(ctx, cluster, pvc_selector).await?;
        } else if has_finalizer(cluster) {
            info!("Deleting PVCs for {}", cluster.name_any());
            cleanup_all_pvcs(ctx, cluster, pvc_selector).await?;
            info!("Deleted PVCs for {}", cluster.name_any());
            remove_finalizer(ctx, cluster).await?;
        }
    } else if has_finalizer(cluster) {
        // Delete reclaim semantics no longer configured; stop guarding
        info!("Removing storage finalizer for {}", cluster.name_any());
        remove_finalizer(ctx, cluster).await?;
    }

    Ok(())
}

async fn add_finalizer(ctx: &Context, cluster: &SolrCluster) -> Result<()> {
    let mut finalizers = cluster.metadata.finalizers.clone().unwrap_or_default();
    finalizers.push(STORAGE_FINALIZER.to_string());
    patch_finalizers(ctx, cluster, finalizers).await?;
    info!("Added storage finalizer to {}", cluster.name_any());
    Ok(())
}

async fn remove_finalizer(ctx: &Context, cluster: &SolrCluster) -> Result<()> {
    let finalizers: Vec<String> = cluster
        .metadata
        .finalizers
        .clone()
        .unwrap_or_default()
        .into_iter()
        .filter(|name| name != STORAGE_FINALIZER)
        .collect();
    patch_finalizers(ctx, cluster, finalizers).await?;
    info!("Removed storage finalizer from {}", cluster.name_any());
    Ok(())
}

async fn patch_finalizers(
    ctx: &Context,
    cluster: &SolrCluster,
    finalizers: Vec<String>,
) -> Result<()> {
    let ns = cluster.namespace().unwrap_or_default();
    let api: Api<SolrCluster> = Api::namespaced(ctx.client.clone(), &ns);

    let patch = serde_json::json!({
        "metadata": {
            "finalizers": finalizers
        }
    });
    api.patch(
        &cluster.name_any(),
        &PatchParams::apply(FIELD_MANAGER),
        &Patch::Merge(&patch),
    )
    .await?;
    Ok(())
}

/// Delete claims left behind by a scale-down.
///
/// Runs only when every replica is ready: a pod still scaling down may yet
/// come back for its claim.
async fn cleanup_orphan_pvcs(
    ctx: &Context,
    cluster: &SolrCluster,
    pvc_selector: &BTreeMap<String, String>,
) -> Result<()> {
    let status = match cluster.status.as_ref() {
        Some(status) => status,
        None => return Ok(()),
    };
    if status.ready_replicas != status.replicas {
        return Ok(());
    }

    let pvcs = list_pvcs(ctx, cluster, pvc_selector).await?;
    if pvcs.len() as i32 > cluster.spec.replicas {
        for pvc in &pvcs {
            if is_pvc_orphan(&pvc.name_any(), cluster.spec.replicas) {
                delete_pvc(ctx, pvc).await;
            }
        }
    }
    Ok(())
}

/// Delete every claim matching the selector; runs on cluster deletion
async fn cleanup_all_pvcs(
    ctx: &Context,
    cluster: &SolrCluster,
    pvc_selector: &BTreeMap<String, String>,
) -> Result<()> {
    let pvcs = list_pvcs(ctx, cluster, pvc_selector).await?;
    for pvc in &pvcs {
        delete_pvc(ctx, pvc).await;
    }
    Ok(())
}

async fn list_pvcs(
    ctx: &Context,
    cluster: &SolrCluster,
    pvc_selector: &BTreeMap<String, String>,
) -> Result<Vec<PersistentVolumeClaim>> {
    let ns = cluster.namespace().unwrap_or_default();
    let api: Api<PersistentVolumeClaim> = Api::namespaced(ctx.client.clone(), &ns);
    let params = ListParams::default().labels(&label_selector_string(pvc_selector));
    Ok(api.list(&params).await?.items)
}

/// Best effort per claim; one stuck claim must not block the rest of the
/// batch
async fn delete_pvc(ctx: &Context, pvc: &PersistentVolumeClaim) {
    let ns = pvc.namespace().unwrap_or_default();
    let api: Api<PersistentVolumeClaim> = Api::namespaced(ctx.client.clone(), &ns);
    let name = pvc.name_any();

    info!("Deleting PVC {}/{}", ns, name);
    if let Err(e) = api.delete(&name, &DeleteParams::default()).await {
        error!("Error deleting PVC {}/{}: {}", ns, name, e);
    }
}
