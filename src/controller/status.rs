//! Status aggregation for SolrCluster resources
//!
//! The status is a pure function of the spec, the live pods, and the live
//! StatefulSet status; it is rebuilt from scratch every pass and written
//! back only when it structurally differs from what is stored. Aggregation
//! also classifies pods for the rolling-update coordinator, since both views
//! derive from the same revision comparison.

use k8s_openapi::api::apps::v1::StatefulSetStatus;
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::{Api, ResourceExt};

use crate::controller::context::Context;
use crate::controller::error::Result;
use crate::crd::{image_version, SolrCluster, SolrClusterStatus, SolrNodeStatus};
use crate::resources::common::{
    label_selector_string, node_selector_labels, BACKUP_RESTORE_VOLUME, SOLR_NODE_CONTAINER,
};

/// Pods grouped for the rolling-update coordinator
#[derive(Debug, Default)]
pub struct PodClassification {
    /// Out-of-date pods whose search container has started; these must
    /// respect the availability bound
    pub out_of_date: Vec<Pod>,
    /// Out-of-date pods whose search container never started; safe to
    /// terminate unconditionally
    pub out_of_date_not_started: Vec<Pod>,
    /// Pods both up to date and ready
    pub available_updated_count: i32,
}

/// List the cluster's pods and recompute the status snapshot
pub async fn reconcile_cluster_status(
    ctx: &Context,
    cluster: &SolrCluster,
    new_status: &mut SolrClusterStatus,
    sts_status: &StatefulSetStatus,
) -> Result<PodClassification> {
    let ns = cluster.namespace().unwrap_or_default();
    let pods_api: Api<Pod> = Api::namespaced(ctx.client.clone(), &ns);

    let selector = label_selector_string(&node_selector_labels(&cluster.name_any()));
    let pods = pods_api
        .list(&ListParams::default().labels(&selector))
        .await?
        .items;

    Ok(aggregate_status(cluster, pods, new_status, sts_status))
}

/// Recompute the status from an observed pod set. Pure; drives the tests.
pub fn aggregate_status(
    cluster: &SolrCluster,
    mut pods: Vec<Pod>,
    new_status: &mut SolrClusterStatus,
    sts_status: &StatefulSetStatus,
) -> PodClassification {
    // Name order fixes both the node list and which "other" version wins
    // below
    pods.sort_by_key(|pod| pod.name_any());

    let update_revision = sts_status.update_revision.clone().unwrap_or_default();
    let external = cluster.spec.addressability.external.as_ref();
    let desired_tag = &cluster.spec.image.tag;

    new_status.replicas = sts_status.replicas;
    new_status.ready_replicas = sts_status.ready_replicas.unwrap_or(0);
    new_status.up_to_date_nodes = 0;

    let mut classification = PodClassification::default();
    let mut other_versions: Vec<String> = Vec::new();
    let mut backup_ready_pods = 0;
    let mut nodes = Vec::with_capacity(pods.len());

    for pod in &pods {
        let name = pod.name_any();
        let mut node = SolrNodeStatus {
            name: name.clone(),
            node_name: pod
                .spec
                .as_ref()
                .and_then(|spec| spec.node_name.clone())
                .unwrap_or_default(),
            internal_address: format!("http://{}", cluster.internal_node_address(&name)),
            external_address: external
                .filter(|ext| !ext.hide_nodes)
                .map(|_| format!("http://{}", cluster.external_node_address(&name))),
            ..Default::default()
        };

        let container_statuses = pod
            .status
            .as_ref()
            .and_then(|status| status.container_statuses.as_deref())
            .unwrap_or_default();

        // The first container always runs the search node
        if !container_statuses.is_empty() {
            if let Some(image) = pod
                .spec
                .as_ref()
                .and_then(|spec| spec.containers.first())
                .and_then(|c| c.image.as_deref())
            {
                node.version = image_version(image).to_string();
                if node.version != *desired_tag {
                    other_versions.push(node.version.clone());
                }
            }
        }

        node.ready = pod
            .status
            .as_ref()
            .and_then(|status| status.conditions.as_ref())
            .map(|conditions| {
                conditions
                    .iter()
                    .any(|c| c.type_ == "Ready" && c.status == "True")
            })
            .unwrap_or(false);

        if cluster.spec.storage_options.backup_restore_options.is_some() {
            let has_backup_volume = pod
                .spec
                .as_ref()
                .and_then(|spec| spec.volumes.as_ref())
                .map(|volumes| volumes.iter().any(|v| v.name == BACKUP_RESTORE_VOLUME))
                .unwrap_or(false);
            if has_backup_volume {
                backup_ready_pods += 1;
            }
        }

        let revision = pod
            .labels()
            .get("controller-revision-hash")
            .cloned()
            .unwrap_or_default();
        node.spec_up_to_date = revision == update_revision;

        if node.spec_up_to_date {
            new_status.up_to_date_nodes += 1;
            if node.ready {
                classification.available_updated_count += 1;
            }
        } else {
            let mut container_not_started = false;
            if !node.ready {
                // Without a status for the search container, assume it
                // never came up; such pods are replaceable without any
                // availability impact
                container_not_started = true;
                for cs in container_statuses {
                    if cs.name == SOLR_NODE_CONTAINER {
                        container_not_started = cs.started != Some(true);
                    }
                }
            }
            if container_not_started {
                classification.out_of_date_not_started.push(pod.clone());
            } else {
                classification.out_of_date.push(pod.clone());
            }
        }

        nodes.push(node);
    }

    new_status.solr_nodes = nodes;

    new_status.backup_restore_ready =
        backup_ready_pods > 0 && backup_ready_pods == cluster.spec.replicas;

    // During a rollout the first differing version stands in for "the"
    // running version; true multi-version skew is not represented
    if let Some(running) = other_versions.first() {
        new_status.target_version = desired_tag.clone();
        new_status.version = running.clone();
    } else {
        new_status.target_version = String::new();
        new_status.version = desired_tag.clone();
    }

    new_status.internal_common_address = format!("http://{}", cluster.internal_common_address());
    new_status.external_common_address = external
        .filter(|ext| !ext.hide_common)
        .map(|ext| format!("http://{}", cluster.external_common_address(&ext.domain_name)));

    classification
}
