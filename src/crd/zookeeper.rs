//! Minimal typed view of the ZooKeeper operator's ZookeeperCluster CRD
//!
//! Only the fields this operator reads or writes are modeled; everything
//! else is left to the ZooKeeper operator.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Client port every ensemble member listens on
pub const ZK_CLIENT_PORT: i32 = 2181;

/// ZookeeperCluster resource managed by the ZooKeeper operator
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq)]
#[kube(
    group = "zookeeper.pravega.io",
    version = "v1beta1",
    kind = "ZookeeperCluster",
    plural = "zookeeperclusters",
    namespaced,
    status = "ZookeeperClusterStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ZookeeperClusterSpec {
    /// Ensemble size
    #[serde(default)]
    pub replicas: i32,

    /// ZooKeeper container image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ZookeeperImage>,

    /// Persistent storage for each member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence: Option<ZookeeperPersistence>,
}

#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZookeeperImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZookeeperPersistence {
    /// Requested volume size, e.g. "5Gi"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

/// Status written by the ZooKeeper operator
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ZookeeperClusterStatus {
    /// Members currently ready
    #[serde(default)]
    pub ready_replicas: i32,

    /// Endpoint for clients outside the cluster, when exposed
    #[serde(default)]
    pub external_client_endpoint: String,
}
