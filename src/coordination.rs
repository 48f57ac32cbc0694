//! Direct interaction with the coordination ensemble
//!
//! TLS-enabled clusters need the `urlScheme` cluster property set to
//! `https` in the ensemble before nodes register themselves. The connection
//! is opened per need with a short timeout and dropped before the pass
//! continues; writes are optimistic, version-checked against the node's
//! stat.

use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};
use zookeeper_client as zk;

use crate::controller::error::{Error, Result};
use crate::crd::ZookeeperConnectionInfo;

const CLUSTER_PROPS_PATH: &str = "/clusterprops.json";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Ensure `urlScheme=https` is present in the ensemble's cluster properties.
///
/// Returns `Ok(false)` when the ensemble is not reachable yet (not an
/// error; the caller requeues); `Ok(true)` once the property is in place.
/// Failures after a successful connect are fatal for the pass.
pub async fn ensure_url_scheme_property(zk_info: &ZookeeperConnectionInfo) -> Result<bool> {
    let hosts = &zk_info.internal_connection_string;
    let props_path = zk_info.chrooted_path(CLUSTER_PROPS_PATH);

    info!("Connecting to ZooKeeper at {}", hosts);
    let client = match tokio::time::timeout(CONNECT_TIMEOUT, zk::Client::connect(hosts)).await {
        Ok(Ok(client)) => client,
        Ok(Err(e)) => {
            warn!(
                "ZooKeeper at {} not reachable yet, will retry after a brief wait: {}",
                hosts, e
            );
            return Ok(false);
        }
        Err(_) => {
            warn!(
                "ZooKeeper connection to {} timed out, will retry after a brief wait",
                hosts
            );
            return Ok(false);
        }
    };

    let result = set_url_scheme(&client, zk_info, &props_path).await;
    drop(client);
    result
}

async fn set_url_scheme(
    client: &zk::Client,
    zk_info: &ZookeeperConnectionInfo,
    props_path: &str,
) -> Result<bool> {
    match client.get_data(props_path).await {
        Ok((data, stat)) => {
            let mut props: serde_json::Map<String, Value> = match serde_json::from_slice(&data) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!("Failed to parse {}, rewriting it", props_path);
                    serde_json::Map::new()
                }
            };

            if props.get("urlScheme").and_then(Value::as_str) == Some("https") {
                info!("urlScheme is already set to https, cluster properties reconciled");
                return Ok(true);
            }

            props.insert("urlScheme".to_string(), Value::String("https".to_string()));
            let payload = serde_json::to_vec(&Value::Object(props))?;
            client
                .set_data(props_path, &payload, Some(stat.version))
                .await
                .map_err(|e| {
                    Error::ZookeeperError(format!("failed to update {}: {}", props_path, e))
                })?;
            info!("Updated urlScheme=https in {}", props_path);
            Ok(true)
        }
        Err(zk::Error::NoNode) => {
            create_parent_paths(client, zk_info).await?;

            let props = serde_json::json!({ "urlScheme": "https" });
            let payload = serde_json::to_vec(&props)?;
            let options = zk::CreateMode::Persistent.with_acls(zk::Acls::anyone_all());
            client
                .create(props_path, &payload, &options)
                .await
                .map_err(|e| {
                    Error::ZookeeperError(format!(
                        "failed to create {} to set urlScheme=https: {}",
                        props_path, e
                    ))
                })?;
            info!("Set urlScheme to https in {}", props_path);
            Ok(true)
        }
        Err(e) => Err(Error::ZookeeperError(format!(
            "failed to read {}: {}",
            props_path, e
        ))),
    }
}

/// Create each chroot path component with open ACLs if absent
async fn create_parent_paths(client: &zk::Client, zk_info: &ZookeeperConnectionInfo) -> Result<()> {
    let chroot = zk_info.chroot.trim_end_matches('/');
    if chroot.is_empty() {
        return Ok(());
    }

    let mut path = String::new();
    for component in chroot.split('/').filter(|c| !c.is_empty()) {
        path.push('/');
        path.push_str(component);
        let options = zk::CreateMode::Persistent.with_acls(zk::Acls::anyone_all());
        match client.create(&path, &[], &options).await {
            Ok(_) => info!("Created ZooKeeper path {}", path),
            Err(zk::Error::NodeExists) => {}
            Err(e) => {
                return Err(Error::ZookeeperError(format!(
                    "failed to create ZooKeeper path {}: {}",
                    path, e
                )));
            }
        }
    }
    Ok(())
}
