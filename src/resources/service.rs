//! Service generation for SolrCluster resources
//!
//! Three service shapes exist:
//! - the common service, load-balancing client traffic across ready nodes
//! - an optional headless service for direct pod DNS
//! - optional per-node services, one per pod, used when nodes are exposed
//!   individually through an Ingress

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::core::ObjectMeta;
use kube::ResourceExt;

use crate::crd::SolrCluster;
use crate::resources::common::{node_selector_labels, owner_reference, shared_labels};

/// Generate the common (load-balanced) service
pub fn generate_common_service(cluster: &SolrCluster) -> Service {
    let cluster_name = cluster.name_any();

    Service {
        metadata: ObjectMeta {
            name: Some(cluster.common_service_name()),
            namespace: cluster.namespace(),
            labels: Some(shared_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)]),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(node_selector_labels(&cluster_name)),
            ports: Some(vec![ServicePort {
                name: Some("solr-client".to_string()),
                port: cluster.spec.addressability.common_service_port,
                target_port: Some(IntOrString::Int(cluster.spec.addressability.pod_port)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Generate the headless service used for pod discovery
///
/// Not-yet-ready pods are published so nodes can find each other while the
/// cluster bootstraps.
pub fn generate_headless_service(cluster: &SolrCluster) -> Service {
    let cluster_name = cluster.name_any();

    Service {
        metadata: ObjectMeta {
            name: Some(cluster.headless_service_name()),
            namespace: cluster.namespace(),
            labels: Some(shared_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)]),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(node_selector_labels(&cluster_name)),
            ports: Some(vec![ServicePort {
                name: Some("solr-client".to_string()),
                port: cluster.spec.addressability.pod_port,
                target_port: Some(IntOrString::Int(cluster.spec.addressability.pod_port)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            cluster_ip: Some("None".to_string()),
            publish_not_ready_addresses: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Generate a service targeting one specific node pod
pub fn generate_node_service(cluster: &SolrCluster, node_name: &str) -> Service {
    let cluster_name = cluster.name_any();

    // StatefulSet pods carry their own name as a label, which is the only
    // selector that isolates a single ordinal
    let selector = BTreeMap::from([
        (
            "statefulset.kubernetes.io/pod-name".to_string(),
            node_name.to_string(),
        ),
        (
            "solr.example.com/cluster".to_string(),
            cluster_name.clone(),
        ),
    ]);

    Service {
        metadata: ObjectMeta {
            name: Some(node_name.to_string()),
            namespace: cluster.namespace(),
            labels: Some(shared_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)]),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(selector),
            ports: Some(vec![ServicePort {
                name: Some("solr-client".to_string()),
                port: cluster.spec.addressability.pod_port,
                target_port: Some(IntOrString::Int(cluster.spec.addressability.pod_port)),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}
