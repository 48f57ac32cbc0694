//! Reconciliation logic for SolrCluster resources
//!
//! One pass recomputes everything from scratch: resolve the ensemble, sync
//! services and configuration, drive TLS issuance, sync the StatefulSet
//! (or skip it while its inputs are unresolvable), manage storage, rebuild
//! the status, select pods for a managed rollout, and finally write the
//! status back if it changed. No state survives between passes.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use k8s_openapi::api::apps::v1::{StatefulSet, StatefulSetStatus};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::{Api, ResourceExt};
use tracing::{error, info, instrument, warn};

use crate::controller::context::Context;
use crate::controller::error::{BackoffConfig, Error, Result};
use crate::controller::status::reconcile_cluster_status;
use crate::controller::storage::reconcile_storage_finalizer;
use crate::controller::sync::sync;
use crate::controller::tls::{self, TlsSecretProbe};
use crate::controller::update;
use crate::controller::validation::validate_custom_config_map;
use crate::controller::zookeeper::reconcile_zookeeper;
use crate::coordination;
use crate::crd::{ExternalMethod, SolrCluster, SolrClusterStatus, UpdateStrategyMethod};
use crate::resources::common::FIELD_MANAGER;
use crate::resources::configmap::{self, SOLR_XML_KEY};
use crate::resources::statefulset::{generate_statefulset, StatefulSetInputs};
use crate::resources::{ingress, service};

/// Main reconciliation function
#[instrument(skip(cluster, ctx), fields(name = %cluster.name_any(), namespace = cluster.namespace().unwrap_or_default()))]
pub async fn reconcile(cluster: Arc<SolrCluster>, ctx: Arc<Context>) -> Result<Action> {
    let ns = cluster.namespace().unwrap_or_default();
    info!("Reconciling SolrCluster");

    // The pending requeue delay; individual steps may tighten it
    let mut requeue_after: Option<Duration> = None;
    // Built fresh, committed once at the end
    let mut new_status = SolrClusterStatus::default();
    let mut block_statefulset = false;

    reconcile_zookeeper(&ctx, &cluster, &mut new_status).await?;

    sync(&ctx.client, &service::generate_common_service(&cluster)).await?;

    let node_names = cluster.all_node_names();
    let mut host_ip_overrides = BTreeMap::new();
    if cluster.uses_individual_node_services() {
        let use_external_address = cluster
            .spec
            .addressability
            .external
            .as_ref()
            .map(|ext| ext.use_external_address)
            .unwrap_or(false);
        for node_name in &node_names {
            let (_, live) =
                sync(&ctx.client, &service::generate_node_service(&cluster, node_name)).await?;
            if use_external_address {
                // Advertised hostnames resolve through pod hostAliases, so
                // every node service needs an IP before the StatefulSet can
                // be written
                let ip = live
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.cluster_ip.clone())
                    .unwrap_or_default();
                if ip.is_empty() {
                    block_statefulset = true;
                } else {
                    host_ip_overrides.insert(cluster.advertised_node_host(node_name), ip);
                }
            }
        }
    }

    if cluster.uses_headless_service() {
        sync(&ctx.client, &service::generate_headless_service(&cluster)).await?;
    }

    // Resolve the effective solr.xml ConfigMap and its content digest
    let mut config_map_name = cluster.config_map_name();
    let config_digest;
    if let Some(provided) = cluster.spec.provided_config_map.as_ref() {
        let config_maps: Api<ConfigMap> = Api::namespaced(ctx.client.clone(), &ns);
        // A named ConfigMap must exist
        let found = config_maps.get(provided).await?;
        let solr_xml = validate_custom_config_map(provided, &found)?;
        config_digest = configmap::config_file_digest(solr_xml);
        config_map_name = provided.clone();
    } else {
        let (_, live) = sync(&ctx.client, &configmap::generate_config_map(&cluster)).await?;
        config_digest = live
            .data
            .as_ref()
            .and_then(|data| data.get(SOLR_XML_KEY))
            .map(|xml| configmap::config_file_digest(xml))
            .unwrap_or_default();
    }

    // Without a resolvable ensemble there is no connection string to embed
    // in the StatefulSet, and no point driving TLS for nodes that cannot
    // start; the watch on the managed ensemble re-triggers the pass
    let ensemble_resolvable = new_status.zookeeper_connection_info.is_resolvable();
    if !ensemble_resolvable {
        block_statefulset = true;
    }

    // The urlScheme property must be pushed once per cluster; the latch
    // carries over from the stored status even on passes that skip TLS
    if cluster.spec.solr_tls.is_some() {
        new_status.url_scheme_cluster_property = cluster
            .status
            .as_ref()
            .map(|status| status.url_scheme_cluster_property)
            .unwrap_or(false);
    }

    let mut tls_probe = TlsSecretProbe::default();
    if let Some(tls_spec) = cluster.spec.solr_tls.as_ref().filter(|_| ensemble_resolvable) {
        if let Some(auto_create) = tls_spec.auto_create.as_ref() {
            let tls_ready = tls::reconcile_auto_create_tls(&ctx, &cluster)
                .await
                .map_err(|e| {
                    error!("Reconcile TLS certificate failed: {}", e);
                    e
                })?;
            if !tls_ready {
                // Self-signed issuance is near-instant; external issuers can
                // take minutes
                let wait = if auto_create.issuer_ref.is_none() {
                    Duration::from_secs(2)
                } else {
                    Duration::from_secs(30)
                };
                info!("Certificate is not ready, will requeue after brief wait");
                return Ok(Action::requeue(wait));
            }
        }

        // The secret's shape and version feed StatefulSet generation
        tls_probe = tls::probe_tls_secret(&ctx, &cluster).await?;

        if !new_status.url_scheme_cluster_property {
            let updated =
                coordination::ensure_url_scheme_property(&new_status.zookeeper_connection_info)
                    .await?;
            if !updated {
                // The ensemble hosts have not come online yet
                return Ok(Action::requeue(Duration::from_secs(5)));
            }
            new_status.url_scheme_cluster_property = true;
        }
    }

    let mut pvc_selector: BTreeMap<String, String> = BTreeMap::new();
    let mut sts_status = StatefulSetStatus::default();

    if !block_statefulset {
        let inputs = StatefulSetInputs {
            zk_connection: Some(&new_status.zookeeper_connection_info),
            host_ip_overrides,
            config_map_name,
            config_digest,
            needs_pkcs12_init_container: tls_probe.needs_pkcs12_init_container,
            tls_secret_version: tls_probe.secret_version.clone(),
        };
        let desired = generate_statefulset(&cluster, &inputs);
        let (_, live) = sync(&ctx.client, &desired).await?;
        sts_status = live.status.clone().unwrap_or_default();
        pvc_selector = live
            .spec
            .as_ref()
            .and_then(|spec| spec.selector.match_labels.clone())
            .unwrap_or_default();
    } else {
        // Blocked; still gather what exists for status and the storage
        // finalizer
        let sts_api: Api<StatefulSet> = Api::namespaced(ctx.client.clone(), &ns);
        if let Some(found) = sts_api.get_opt(&cluster.statefulset_name()).await? {
            sts_status = found.status.clone().unwrap_or_default();
            pvc_selector = found
                .spec
                .as_ref()
                .and_then(|spec| spec.selector.match_labels.clone())
                .unwrap_or_default();
        }
    }

    // Without known claim labels, cleanup could match every claim in the
    // namespace; skip until a StatefulSet exists
    if !pvc_selector.is_empty() {
        if let Err(e) = reconcile_storage_finalizer(&ctx, &cluster, &pvc_selector).await {
            warn!("Storage finalizer reconciliation failed, will retry: {}", e);
            return Ok(Action::requeue(Duration::from_secs(10)));
        }
    }

    let classification =
        reconcile_cluster_status(&ctx, &cluster, &mut new_status, &sts_status).await?;

    let out_of_date_total =
        classification.out_of_date.len() + classification.out_of_date_not_started.len();
    if cluster.spec.update_strategy.method == UpdateStrategyMethod::Managed && out_of_date_total > 0
    {
        for pod in &classification.out_of_date_not_started {
            info!(
                "Pod {} killed for update: the search container has not started, so it is safe to replace",
                pod.name_any()
            );
        }

        let (additional, retry_later) = update::determine_pods_safe_to_update(
            &cluster,
            &classification.out_of_date,
            cluster.spec.replicas,
            new_status.ready_replicas,
            classification.available_updated_count,
            classification.out_of_date_not_started.len(),
        );

        let mut delete_failed = false;
        for pod in classification
            .out_of_date_not_started
            .iter()
            .chain(additional)
        {
            if let Err(e) = update::delete_pod_with_precondition(&ctx, pod).await {
                // One stuck pod must not block the rest of the rollout
                error!("Error while killing pod {} for update: {}", pod.name_any(), e);
                delete_failed = true;
            }
        }

        if delete_failed || retry_later {
            tighten_requeue(&mut requeue_after, Duration::from_secs(15));
        }
    }

    let uses_ingress = cluster
        .spec
        .addressability
        .external
        .as_ref()
        .map(|ext| ext.method == ExternalMethod::Ingress)
        .unwrap_or(false);
    if uses_ingress {
        let desired =
            ingress::generate_ingress(&cluster, &node_names, &ctx.config.ingress_base_domain);
        sync(&ctx.client, &desired).await?;
    }

    // Commit the status only when it structurally differs from what is
    // stored, to avoid write loops on no-op passes
    let stored_status = cluster.status.clone().unwrap_or_default();
    if stored_status != new_status {
        info!("Updating SolrCluster status");
        let api: Api<SolrCluster> = Api::namespaced(ctx.client.clone(), &ns);
        let patch = serde_json::json!({ "status": new_status });
        api.patch_status(
            &cluster.name_any(),
            &PatchParams::apply(FIELD_MANAGER),
            &Patch::Merge(&patch),
        )
        .await?;
    }

    Ok(match requeue_after {
        Some(delay) => Action::requeue(delay),
        None => Action::await_change(),
    })
}

/// Tighten the pending requeue to at most `bound`, never loosening a
/// shorter one
fn tighten_requeue(requeue_after: &mut Option<Duration>, bound: Duration) {
    match requeue_after {
        Some(existing) if *existing <= bound => {}
        _ => *requeue_after = Some(bound),
    }
}

/// Error policy for the controller with exponential backoff
pub fn error_policy(cluster: Arc<SolrCluster>, error: &Error, _ctx: Arc<Context>) -> Action {
    let name = cluster.name_any();
    let backoff = BackoffConfig::default();

    let delay = backoff.delay_for_error(error, 0);

    if error.is_retryable() {
        warn!(
            "Retryable error for {}: {}, requeuing in {:?}",
            name, error, delay
        );
    } else {
        error!(
            "Non-retryable error for {}: {}, requeuing in {:?} for manual intervention",
            name, error, delay
        );
    }

    Action::requeue(delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tighten_requeue_sets_when_unset() {
        let mut requeue = None;
        tighten_requeue(&mut requeue, Duration::from_secs(15));
        assert_eq!(requeue, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_tighten_requeue_shortens_longer_delay() {
        let mut requeue = Some(Duration::from_secs(30));
        tighten_requeue(&mut requeue, Duration::from_secs(15));
        assert_eq!(requeue, Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_tighten_requeue_keeps_shorter_delay() {
        let mut requeue = Some(Duration::from_secs(5));
        tighten_requeue(&mut requeue, Duration::from_secs(15));
        assert_eq!(requeue, Some(Duration::from_secs(5)));
    }
}
