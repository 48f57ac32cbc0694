//! Ingress generation for externally exposed clusters
//!
//! One Ingress carries a rule for the common endpoint plus one rule per
//! node, each backed by that node's individual service.

use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
    IngressServiceBackend, IngressSpec, ServiceBackendPort,
};
use kube::core::ObjectMeta;
use kube::ResourceExt;

use crate::crd::SolrCluster;
use crate::resources::common::{owner_reference, shared_labels};

/// Generate the Ingress for a cluster exposed via the Ingress method
///
/// `base_domain` is the operator-wide domain used when the cluster does not
/// declare its own.
pub fn generate_ingress(
    cluster: &SolrCluster,
    node_names: &[String],
    base_domain: &str,
) -> Ingress {
    let cluster_name = cluster.name_any();
    let ns = cluster.namespace().unwrap_or_default();
    let ext = cluster.spec.addressability.external.as_ref();

    let domain = ext
        .map(|e| e.domain_name.as_str())
        .filter(|d| !d.is_empty())
        .unwrap_or(base_domain);

    let mut rules = Vec::new();

    let hide_common = ext.map(|e| e.hide_common).unwrap_or(false);
    if !hide_common {
        rules.push(rule(
            cluster.external_common_address(domain),
            cluster.common_service_name(),
            cluster.spec.addressability.common_service_port,
        ));
    }

    let hide_nodes = ext.map(|e| e.hide_nodes).unwrap_or(false);
    if !hide_nodes {
        for node_name in node_names {
            rules.push(rule(
                format!("{}-{}.{}", ns, node_name, domain),
                node_name.clone(),
                cluster.spec.addressability.pod_port,
            ));
        }
    }

    Ingress {
        metadata: ObjectMeta {
            name: Some(format!("{}-ingress", cluster_name)),
            namespace: cluster.namespace(),
            labels: Some(shared_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)]),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(rules),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn rule(host: String, service_name: String, port: i32) -> IngressRule {
    IngressRule {
        host: Some(host),
        http: Some(HTTPIngressRuleValue {
            paths: vec![HTTPIngressPath {
                path: Some("/".to_string()),
                path_type: "Prefix".to_string(),
                backend: IngressBackend {
                    service: Some(IngressServiceBackend {
                        name: service_name,
                        port: Some(ServiceBackendPort {
                            number: Some(port),
                            ..Default::default()
                        }),
                    }),
                    ..Default::default()
                },
            }],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        AddressabilitySpec, ExternalAddressability, ExternalMethod, ImageSpec, SolrClusterSpec,
        StorageOptions, UpdateStrategySpec,
    };
    use kube::core::ObjectMeta;

    fn cluster(hide_common: bool, hide_nodes: bool) -> SolrCluster {
        let mut cluster = SolrCluster::new(
            "search",
            SolrClusterSpec {
                replicas: 2,
                image: ImageSpec::default(),
                addressability: AddressabilitySpec {
                    external: Some(ExternalAddressability {
                        method: ExternalMethod::Ingress,
                        domain_name: "example.com".to_string(),
                        use_external_address: false,
                        hide_nodes,
                        hide_common,
                    }),
                    ..Default::default()
                },
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
            ..Default::default()
        };
        cluster
    }

    #[test]
    fn test_one_rule_per_node_plus_common() {
        let cluster = cluster(false, false);
        let nodes = cluster.all_node_names();
        let ingress = generate_ingress(&cluster, &nodes, "");
        let rules = ingress.spec.unwrap().rules.unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(
            rules[0].host.as_deref(),
            Some("prod-search-common.example.com")
        );
        assert_eq!(rules[1].host.as_deref(), Some("prod-search-0.example.com"));
    }

    #[test]
    fn test_hidden_nodes_leave_only_common_rule() {
        let cluster = cluster(false, true);
        let nodes = cluster.all_node_names();
        let ingress = generate_ingress(&cluster, &nodes, "");
        let rules = ingress.spec.unwrap().rules.unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_base_domain_fallback() {
        let mut cluster = cluster(true, false);
        cluster
            .spec
            .addressability
            .external
            .as_mut()
            .unwrap()
            .domain_name = String::new();
        let nodes = cluster.all_node_names();
        let ingress = generate_ingress(&cluster, &nodes, "ing.example.org");
        let rules = ingress.spec.unwrap().rules.unwrap();
        assert!(rules[0]
            .host
            .as_deref()
            .unwrap()
            .ends_with("ing.example.org"));
    }
}
