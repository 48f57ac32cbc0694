//! Common utilities for Kubernetes resource generation
//!
//! Shared labels, constants, and the owner reference every generated
//! resource carries so garbage collection tracks the SolrCluster.

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::ResourceExt;

use crate::crd::SolrCluster;

/// API version for the SolrCluster CRD
pub const API_VERSION: &str = "solr.example.com/v1beta1";

/// Kind for the SolrCluster CRD
pub const KIND: &str = "SolrCluster";

/// Field manager / managed-by identity for this operator
pub const FIELD_MANAGER: &str = "solr-operator";

/// Label marking pods that run the search technology itself, as opposed to
/// auxiliary pods sharing the cluster labels
pub const TECHNOLOGY_LABEL: &str = "technology";

/// Value of [`TECHNOLOGY_LABEL`] on search-node pods
pub const TECHNOLOGY_SOLR_CLOUD: &str = "solr-cloud";

/// Name of the shared backup/restore volume mounted into every node
pub const BACKUP_RESTORE_VOLUME: &str = "backup-restore";

/// Name of the search container within node pods
pub const SOLR_NODE_CONTAINER: &str = "solrcloud-node";

/// Generate an owner reference for a SolrCluster
pub fn owner_reference(cluster: &SolrCluster) -> OwnerReference {
    OwnerReference {
        api_version: API_VERSION.to_string(),
        kind: KIND.to_string(),
        name: cluster.name_any(),
        uid: cluster.metadata.uid.clone().unwrap_or_default(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Labels shared by every resource belonging to a SolrCluster
pub fn shared_labels(cluster_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "app.kubernetes.io/name".to_string(),
            cluster_name.to_string(),
        ),
        (
            "app.kubernetes.io/managed-by".to_string(),
            FIELD_MANAGER.to_string(),
        ),
        (
            "solr.example.com/cluster".to_string(),
            cluster_name.to_string(),
        ),
    ])
}

/// Labels selecting the cluster's search-node pods
pub fn node_selector_labels(cluster_name: &str) -> BTreeMap<String, String> {
    let mut labels = shared_labels(cluster_name);
    labels.insert(
        TECHNOLOGY_LABEL.to_string(),
        TECHNOLOGY_SOLR_CLOUD.to_string(),
    );
    labels
}

/// Comma-joined `k=v` selector string for label-filtered list calls
pub fn label_selector_string(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
