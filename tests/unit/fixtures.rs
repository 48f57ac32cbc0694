//! Shared fixture builders for unit tests

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::StatefulSetStatus;
use k8s_openapi::api::core::v1::{
    Container, ContainerStatus, Pod, PodCondition, PodSpec, PodStatus, Volume,
};
use kube::core::ObjectMeta;

use solr_operator::crd::{
    AddressabilitySpec, BackupRestoreOptions, ImageSpec, SolrCluster, SolrClusterSpec,
    StorageOptions, UpdateStrategySpec,
};
use solr_operator::resources::{BACKUP_RESTORE_VOLUME, SOLR_NODE_CONTAINER};

pub fn cluster(replicas: i32) -> SolrCluster {
    let mut cluster = SolrCluster::new(
        "search",
        SolrClusterSpec {
            replicas,
            image: ImageSpec {
                repository: "solr".to_string(),
                tag: "8.11".to_string(),
            },
            addressability: AddressabilitySpec::default(),
            zookeeper_ref: None,
            solr_tls: None,
            storage_options: StorageOptions::default(),
            update_strategy: UpdateStrategySpec::default(),
            provided_config_map: None,
        },
    );
    cluster.metadata = ObjectMeta {
        name: Some("search".to_string()),
        namespace: Some("prod".to_string()),
        uid: Some("uid-1234".to_string()),
        ..Default::default()
    };
    cluster
}

pub fn cluster_with_backup(replicas: i32) -> SolrCluster {
    let mut cluster = cluster(replicas);
    cluster.spec.storage_options.backup_restore_options = Some(BackupRestoreOptions {
        pvc_name: "search-backups".to_string(),
    });
    cluster
}

/// Configurable pod builder
pub struct PodBuilder {
    name: String,
    ready: bool,
    revision: String,
    image: String,
    started: Option<bool>,
    with_backup_volume: bool,
}

impl PodBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ready: true,
            revision: "rev-2".to_string(),
            image: "solr:8.11".to_string(),
            started: Some(true),
            with_backup_volume: false,
        }
    }

    pub fn ready(mut self, ready: bool) -> Self {
        self.ready = ready;
        self
    }

    pub fn revision(mut self, revision: &str) -> Self {
        self.revision = revision.to_string();
        self
    }

    pub fn image(mut self, image: &str) -> Self {
        self.image = image.to_string();
        self
    }

    pub fn started(mut self, started: Option<bool>) -> Self {
        self.started = started;
        self
    }

    pub fn with_backup_volume(mut self) -> Self {
        self.with_backup_volume = true;
        self
    }

    pub fn build(self) -> Pod {
        let labels = BTreeMap::from([
            ("controller-revision-hash".to_string(), self.revision),
            ("technology".to_string(), "solr-cloud".to_string()),
        ]);

        let volumes = self.with_backup_volume.then(|| {
            vec![Volume {
                name: BACKUP_RESTORE_VOLUME.to_string(),
                ..Default::default()
            }]
        });

        Pod {
            metadata: ObjectMeta {
                name: Some(self.name),
                namespace: Some("prod".to_string()),
                labels: Some(labels),
                uid: Some("pod-uid".to_string()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                node_name: Some("worker-1".to_string()),
                containers: vec![Container {
                    name: SOLR_NODE_CONTAINER.to_string(),
                    image: Some(self.image),
                    ..Default::default()
                }],
                volumes,
                ..Default::default()
            }),
            status: Some(PodStatus {
                conditions: Some(vec![PodCondition {
                    type_: "Ready".to_string(),
                    status: if self.ready { "True" } else { "False" }.to_string(),
                    ..Default::default()
                }]),
                container_statuses: Some(vec![ContainerStatus {
                    name: SOLR_NODE_CONTAINER.to_string(),
                    started: self.started,
                    ..Default::default()
                }]),
                ..Default::default()
            }),
        }
    }
}

pub fn sts_status(replicas: i32, ready: i32, update_revision: &str) -> StatefulSetStatus {
    StatefulSetStatus {
        replicas,
        ready_replicas: Some(ready),
        update_revision: Some(update_revision.to_string()),
        ..Default::default()
    }
}
