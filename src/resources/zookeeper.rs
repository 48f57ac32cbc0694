//! Managed ZookeeperCluster generation
//!
//! When the user asks for a provided ensemble, the operator creates a
//! ZookeeperCluster resource and leaves the heavy lifting to the ZooKeeper
//! operator.

use kube::core::ObjectMeta;
use kube::ResourceExt;

use crate::crd::zookeeper::{
    ZookeeperCluster, ZookeeperClusterSpec, ZookeeperImage, ZookeeperPersistence,
};
use crate::crd::{ProvidedZookeeper, SolrCluster};
use crate::resources::common::{owner_reference, shared_labels};

/// Name of the managed ensemble for a cluster
pub fn zookeeper_name(cluster: &SolrCluster) -> String {
    format!("{}-zookeeper", cluster.name_any())
}

/// Generate the managed ZookeeperCluster resource
pub fn generate_zookeeper_cluster(
    cluster: &SolrCluster,
    provided: &ProvidedZookeeper,
) -> ZookeeperCluster {
    let cluster_name = cluster.name_any();

    let image = provided.image.as_ref().map(|image| {
        let (repository, tag) = match image.rsplit_once(':') {
            Some((repo, tag)) => (Some(repo.to_string()), Some(tag.to_string())),
            None => (Some(image.clone()), None),
        };
        ZookeeperImage { repository, tag }
    });

    ZookeeperCluster {
        metadata: ObjectMeta {
            name: Some(zookeeper_name(cluster)),
            namespace: cluster.namespace(),
            labels: Some(shared_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)]),
            ..Default::default()
        },
        spec: ZookeeperClusterSpec {
            replicas: provided.replicas,
            image,
            persistence: provided
                .persistence_size
                .as_ref()
                .map(|size| ZookeeperPersistence {
                    size: Some(size.clone()),
                }),
        },
        status: None,
    }
}
