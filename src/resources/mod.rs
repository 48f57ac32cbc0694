pub mod certificate;
pub mod common;
pub mod configmap;
pub mod ingress;
pub mod secret;
pub mod service;
pub mod statefulset;
pub mod zookeeper;

pub use common::{
    label_selector_string, node_selector_labels, owner_reference, shared_labels, API_VERSION,
    BACKUP_RESTORE_VOLUME, FIELD_MANAGER, KIND, SOLR_NODE_CONTAINER, TECHNOLOGY_LABEL,
    TECHNOLOGY_SOLR_CLOUD,
};
pub use statefulset::{StatefulSetInputs, CONFIG_DIGEST_ANNOTATION};
