//! ConfigMap generation for the node configuration file
//!
//! Nodes read a solr.xml at startup. The generated file advertises host and
//! port through variable placeholders so the same ConfigMap serves every
//! pod; the `hostPort` placeholder in particular is substituted with the
//! externally assigned port at pod start.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ConfigMap;
use kube::core::ObjectMeta;
use kube::ResourceExt;

use crate::crd::SolrCluster;
use crate::resources::common::{owner_reference, shared_labels};

/// Key the configuration file is stored under
pub const SOLR_XML_KEY: &str = "solr.xml";

/// Placeholder a usable configuration file must contain so the externally
/// assigned port can be substituted in
pub const HOST_PORT_PLACEHOLDER: &str = "${hostPort:";

/// Generate the solr.xml ConfigMap
pub fn generate_config_map(cluster: &SolrCluster) -> ConfigMap {
    let cluster_name = cluster.name_any();

    ConfigMap {
        metadata: ObjectMeta {
            name: Some(cluster.config_map_name()),
            namespace: cluster.namespace(),
            labels: Some(shared_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)]),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            SOLR_XML_KEY.to_string(),
            default_solr_xml(),
        )])),
        ..Default::default()
    }
}

/// The stock configuration file
fn default_solr_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" ?>
<solr>
  <solrcloud>
    <str name="host">${host:}</str>
    <int name="hostPort">${hostPort:80}</int>
    <str name="hostContext">${hostContext:solr}</str>
    <bool name="genericCoreNodeNames">${genericCoreNodeNames:true}</bool>
    <int name="zkClientTimeout">${zkClientTimeout:30000}</int>
    <int name="distribUpdateSoTimeout">${distribUpdateSoTimeout:600000}</int>
    <int name="distribUpdateConnTimeout">${distribUpdateConnTimeout:60000}</int>
    <str name="zkCredentialsProvider">${zkCredentialsProvider:org.apache.solr.common.cloud.DefaultZkCredentialsProvider}</str>
    <str name="zkACLProvider">${zkACLProvider:org.apache.solr.common.cloud.DefaultZkACLProvider}</str>
  </solrcloud>
  <shardHandlerFactory name="shardHandlerFactory" class="HttpShardHandlerFactory">
    <int name="socketTimeout">${socketTimeout:600000}</int>
    <int name="connTimeout">${connTimeout:60000}</int>
  </shardHandlerFactory>
</solr>
"#
    .to_string()
}

/// MD5 digest of a configuration file, stored as a pod-template annotation
/// so config changes roll the nodes
pub fn config_file_digest(contents: &str) -> String {
    format!("{:x}", md5::compute(contents.as_bytes()))
}
