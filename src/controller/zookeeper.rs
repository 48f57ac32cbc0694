//! Coordination-ensemble resolution
//!
//! Produces the `ZookeeperConnectionInfo` the rest of the pass runs on.
//! Until the connection info is resolvable, StatefulSet reconciliation is
//! blocked downstream.

use kube::ResourceExt;
use tracing::info;

use crate::controller::context::Context;
use crate::controller::error::{Error, Result};
use crate::controller::sync::{sync, SyncOutcome};
use crate::crd::zookeeper::ZK_CLIENT_PORT;
use crate::crd::{SolrCluster, SolrClusterStatus, ZookeeperConnectionInfo};
use crate::resources::zookeeper::generate_zookeeper_cluster;

/// Resolve the ensemble reference into connection info on the new status
///
/// Externally supplied connection info is copied verbatim. A provided
/// ensemble is synced as a ZookeeperCluster resource; while it has just been
/// created its connection string is not yet derivable and the status is left
/// unresolvable.
pub async fn reconcile_zookeeper(
    ctx: &Context,
    cluster: &SolrCluster,
    new_status: &mut SolrClusterStatus,
) -> Result<()> {
    let zk_ref = cluster
        .spec
        .zookeeper_ref
        .as_ref()
        .ok_or_else(|| Error::InvalidConfig("no ZooKeeper reference provided".to_string()))?;

    if let Some(info) = zk_ref.connection_info.as_ref() {
        new_status.zookeeper_connection_info = info.clone();
        return Ok(());
    }

    let provided = zk_ref.provided.as_ref().ok_or_else(|| {
        Error::InvalidConfig(
            "ZooKeeper reference has neither connection info nor a provided ensemble".to_string(),
        )
    })?;

    if !ctx.config.use_zookeeper_crd {
        return Err(Error::InvalidConfig(
            "cannot provision a ZooKeeper ensemble: the operator is not configured to use the ZooKeeper CRD"
                .to_string(),
        ));
    }

    let desired = generate_zookeeper_cluster(cluster, provided);
    let (outcome, live) = sync(&ctx.client, &desired).await?;

    if outcome == SyncOutcome::Created {
        // Freshly created; members are not addressable until the ZooKeeper
        // operator brings them up
        info!(
            "Created ZookeeperCluster {} for {}",
            desired.name_any(),
            cluster.name_any()
        );
        return Ok(());
    }

    let zk_name = live.name_any();
    let zk_ns = live.namespace().unwrap_or_default();
    let internal: Vec<String> = (0..live.spec.replicas)
        .map(|i| {
            format!(
                "{}-{}.{}-headless.{}:{}",
                zk_name, i, zk_name, zk_ns, ZK_CLIENT_PORT
            )
        })
        .collect();

    let external = live
        .status
        .as_ref()
        .map(|s| s.external_client_endpoint.clone())
        .filter(|endpoint| !endpoint.is_empty());

    new_status.zookeeper_connection_info = ZookeeperConnectionInfo {
        internal_connection_string: internal.join(","),
        external_connection_string: external,
        chroot: provided.chroot.clone(),
    };

    Ok(())
}
