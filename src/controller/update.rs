//! Managed rolling updates
//!
//! When the update strategy is Managed, the StatefulSet runs with the
//! OnDelete strategy and this module decides which out-of-date pods may be
//! terminated. Pods whose search container never started are killed
//! unconditionally (no client traffic can reach them); started pods are
//! killed within the availability bound.

use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, Preconditions};
use kube::{Api, ResourceExt};

use crate::controller::context::Context;
use crate::controller::error::Result;
use crate::crd::{PodCount, SolrCluster};

/// Default bound on simultaneously unavailable pods
const DEFAULT_MAX_PODS_UNAVAILABLE_PERCENT: i32 = 25;

/// Ordinal suffix of a StatefulSet pod (or claim) name
pub fn pod_ordinal(name: &str) -> Option<i32> {
    name.rsplit_once('-')
        .and_then(|(_, ordinal)| ordinal.parse().ok())
}

/// Resolve the configured unavailability bound against the desired replica
/// count. Never less than one, so rollouts always make progress.
pub fn resolve_max_pods_unavailable(bound: Option<&PodCount>, total: i32) -> i32 {
    let resolved = match bound {
        Some(PodCount::Count(count)) => *count,
        Some(PodCount::Percent(percent)) => {
            let percent = percent
                .trim_end_matches('%')
                .parse::<i32>()
                .unwrap_or(DEFAULT_MAX_PODS_UNAVAILABLE_PERCENT);
            total * percent / 100
        }
        None => total * DEFAULT_MAX_PODS_UNAVAILABLE_PERCENT / 100,
    };
    resolved.max(1)
}

/// Select which out-of-date-but-started pods may be taken down this pass.
///
/// Inputs follow the availability-policy contract: desired replica count,
/// ready count, pods already up to date and available, and how many
/// never-started pods are already being terminated this pass. Returns the
/// selected pods (highest ordinal first, the order the StatefulSet
/// controller itself rolls in) and whether a later retry is needed because
/// out-of-date pods remain.
pub fn determine_pods_safe_to_update<'a>(
    cluster: &SolrCluster,
    out_of_date: &'a [Pod],
    total_pods: i32,
    ready_pods: i32,
    available_updated_pods: i32,
    not_started_being_killed: usize,
) -> (Vec<&'a Pod>, bool) {
    let bound = cluster
        .spec
        .update_strategy
        .managed
        .as_ref()
        .and_then(|m| m.max_pods_unavailable.as_ref());
    let max_unavailable = resolve_max_pods_unavailable(bound, total_pods);

    // Not-yet-started pods are already unready and already counted here
    let unavailable = total_pods - ready_pods;
    let budget = (max_unavailable - unavailable).max(0) as usize;

    tracing::debug!(
        max_unavailable,
        unavailable,
        budget,
        available_updated_pods,
        not_started_being_killed,
        "Selecting pods for managed update"
    );

    let mut candidates: Vec<&Pod> = out_of_date.iter().collect();
    candidates.sort_by_key(|pod| std::cmp::Reverse(pod_ordinal(&pod.name_any()).unwrap_or(-1)));

    let selected: Vec<&Pod> = candidates.into_iter().take(budget).collect();
    let retry_later = selected.len() < out_of_date.len();

    (selected, retry_later)
}

/// Delete a pod only if it is still the pod that was observed; a concurrent
/// replacement must not be collateral damage
pub async fn delete_pod_with_precondition(ctx: &Context, pod: &Pod) -> Result<()> {
    let ns = pod.namespace().unwrap_or_default();
    let pods: Api<Pod> = Api::namespaced(ctx.client.clone(), &ns);

    let params = DeleteParams {
        preconditions: Some(Preconditions {
            uid: pod.uid(),
            resource_version: None,
        }),
        ..Default::default()
    };
    pods.delete(&pod.name_any(), &params).await?;
    Ok(())
}
