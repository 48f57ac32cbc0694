//! StatefulSet generation for the search-node pods
//!
//! The StatefulSet is the one resource whose generation depends on the rest
//! of the pass: the resolved ensemble connection, the effective ConfigMap
//! and its content digest, hostname overrides gathered from node services,
//! and the TLS probe results.

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::{
    StatefulSet, StatefulSetSpec, StatefulSetUpdateStrategy,
};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, ContainerPort, EmptyDirVolumeSource, EnvVar, EnvVarSource,
    HTTPGetAction, HostAlias, KeyToPath, ObjectFieldSelector, PersistentVolumeClaim,
    PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec, Probe,
    ResourceRequirements, SecretKeySelector, SecretVolumeSource, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::core::ObjectMeta;
use kube::ResourceExt;

use crate::crd::{SolrCluster, UpdateStrategyMethod, ZookeeperConnectionInfo};
use crate::resources::common::{
    node_selector_labels, owner_reference, shared_labels, BACKUP_RESTORE_VOLUME,
    SOLR_NODE_CONTAINER,
};
use crate::resources::configmap::SOLR_XML_KEY;

/// Pod-template annotation carrying the configuration file digest, so a
/// config change rolls the nodes
pub const CONFIG_DIGEST_ANNOTATION: &str = "solr.example.com/solrXmlMd5";

/// Pass-dependent inputs to StatefulSet generation
#[derive(Debug, Default)]
pub struct StatefulSetInputs<'a> {
    /// Resolved ensemble connection
    pub zk_connection: Option<&'a ZookeeperConnectionInfo>,
    /// Hostname -> service IP overrides, advertised through pod hostAliases
    pub host_ip_overrides: BTreeMap<String, String>,
    /// Name of the effective solr.xml ConfigMap (generated or user-provided)
    pub config_map_name: String,
    /// Content digest of the effective configuration file
    pub config_digest: String,
    /// The TLS secret lacks a ready-made keystore; build one at pod start
    pub needs_pkcs12_init_container: bool,
    /// resourceVersion of the TLS secret, threaded into the pod template to
    /// restart nodes on certificate rotation
    pub tls_secret_version: Option<String>,
}

/// Generate the search-node StatefulSet
pub fn generate_statefulset(cluster: &SolrCluster, inputs: &StatefulSetInputs) -> StatefulSet {
    let cluster_name = cluster.name_any();
    let ns = cluster.namespace().unwrap_or_default();
    let port = cluster.spec.addressability.pod_port;
    let labels = node_selector_labels(&cluster_name);
    let tls = cluster.spec.solr_tls.as_ref();

    let mut annotations = BTreeMap::new();
    if !inputs.config_digest.is_empty() {
        annotations.insert(
            CONFIG_DIGEST_ANNOTATION.to_string(),
            inputs.config_digest.clone(),
        );
    }

    let mut env = vec![
        EnvVar {
            name: "POD_NAME".to_string(),
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    field_path: "metadata.name".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
        EnvVar {
            name: "SOLR_HOST".to_string(),
            value: Some(node_host_template(cluster, &ns)),
            ..Default::default()
        },
        EnvVar {
            name: "SOLR_PORT".to_string(),
            value: Some(port.to_string()),
            ..Default::default()
        },
        EnvVar {
            name: "ZK_HOST".to_string(),
            value: Some(
                inputs
                    .zk_connection
                    .map(|zk| zk.connection_string())
                    .unwrap_or_default(),
            ),
            ..Default::default()
        },
    ];

    let mut volume_mounts = vec![
        VolumeMount {
            name: "data".to_string(),
            mount_path: "/var/solr/data".to_string(),
            ..Default::default()
        },
        VolumeMount {
            name: "solr-xml".to_string(),
            mount_path: "/var/solr/config".to_string(),
            read_only: Some(true),
            ..Default::default()
        },
    ];

    let mut volumes = vec![Volume {
        name: "solr-xml".to_string(),
        config_map: Some(ConfigMapVolumeSource {
            name: Some(inputs.config_map_name.clone()),
            items: Some(vec![KeyToPath {
                key: SOLR_XML_KEY.to_string(),
                path: SOLR_XML_KEY.to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }];

    let persistent = cluster.spec.storage_options.persistent_storage.as_ref();
    if persistent.is_none() {
        volumes.push(Volume {
            name: "data".to_string(),
            empty_dir: Some(EmptyDirVolumeSource::default()),
            ..Default::default()
        });
    }

    if let Some(backup) = cluster.spec.storage_options.backup_restore_options.as_ref() {
        volumes.push(Volume {
            name: BACKUP_RESTORE_VOLUME.to_string(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: backup.pvc_name.clone(),
                ..Default::default()
            }),
            ..Default::default()
        });
        volume_mounts.push(VolumeMount {
            name: BACKUP_RESTORE_VOLUME.to_string(),
            mount_path: "/var/solr/backup-restore".to_string(),
            ..Default::default()
        });
    }

    let mut init_containers = Vec::new();
    if let Some(tls) = tls {
        env.push(EnvVar {
            name: "SOLR_SSL_ENABLED".to_string(),
            value: Some("true".to_string()),
            ..Default::default()
        });
        env.push(EnvVar {
            name: "SOLR_SSL_KEY_STORE".to_string(),
            value: Some(format!("/var/solr/tls/{}", cluster.tls_secret_key())),
            ..Default::default()
        });
        env.push(EnvVar {
            name: "SOLR_SSL_KEY_STORE_PASSWORD".to_string(),
            value_from: Some(EnvVarSource {
                secret_key_ref: Some(SecretKeySelector {
                    name: Some(cluster.keystore_password_secret_name()),
                    key: cluster.keystore_password_secret_key(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        });
        if tls.restart_on_tls_secret_update {
            if let Some(version) = inputs.tls_secret_version.as_ref() {
                env.push(EnvVar {
                    name: "SOLR_TLS_SECRET_VERSION".to_string(),
                    value: Some(version.clone()),
                    ..Default::default()
                });
            }
        }

        volume_mounts.push(VolumeMount {
            name: "keystore".to_string(),
            mount_path: "/var/solr/tls".to_string(),
            read_only: Some(true),
            ..Default::default()
        });

        if inputs.needs_pkcs12_init_container {
            // The issued secret only holds PEM material; convert it into a
            // pkcs12 keystore in a shared emptyDir before the node starts.
            volumes.push(Volume {
                name: "keystore".to_string(),
                empty_dir: Some(EmptyDirVolumeSource::default()),
                ..Default::default()
            });
            volumes.push(Volume {
                name: "tls-pem".to_string(),
                secret: Some(SecretVolumeSource {
                    secret_name: Some(cluster.tls_secret_name()),
                    ..Default::default()
                }),
                ..Default::default()
            });
            init_containers.push(Container {
                name: "gen-pkcs12-keystore".to_string(),
                image: Some(cluster.spec.image.full_image()),
                command: Some(vec!["sh".to_string(), "-c".to_string()]),
                args: Some(vec![format!(
                    "openssl pkcs12 -export -in /var/solr/tls-pem/tls.crt -inkey /var/solr/tls-pem/tls.key -out /var/solr/tls/{} -passout pass:$SOLR_SSL_KEY_STORE_PASSWORD",
                    cluster.tls_secret_key()
                )]),
                env: Some(vec![EnvVar {
                    name: "SOLR_SSL_KEY_STORE_PASSWORD".to_string(),
                    value_from: Some(EnvVarSource {
                        secret_key_ref: Some(SecretKeySelector {
                            name: Some(cluster.keystore_password_secret_name()),
                            key: cluster.keystore_password_secret_key(),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                volume_mounts: Some(vec![
                    VolumeMount {
                        name: "keystore".to_string(),
                        mount_path: "/var/solr/tls".to_string(),
                        ..Default::default()
                    },
                    VolumeMount {
                        name: "tls-pem".to_string(),
                        mount_path: "/var/solr/tls-pem".to_string(),
                        read_only: Some(true),
                        ..Default::default()
                    },
                ]),
                ..Default::default()
            });
        } else {
            volumes.push(Volume {
                name: "keystore".to_string(),
                secret: Some(SecretVolumeSource {
                    secret_name: Some(cluster.tls_secret_name()),
                    ..Default::default()
                }),
                ..Default::default()
            });
        }
    }

    let probe_scheme = if tls.is_some() { "HTTPS" } else { "HTTP" };
    let probe = |initial_delay: i32| Probe {
        http_get: Some(HTTPGetAction {
            path: Some("/solr/admin/info/system".to_string()),
            port: IntOrString::Int(port),
            scheme: Some(probe_scheme.to_string()),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay),
        period_seconds: Some(10),
        ..Default::default()
    };

    let mut host_aliases: Vec<HostAlias> = inputs
        .host_ip_overrides
        .iter()
        .map(|(hostname, ip)| HostAlias {
            ip: Some(ip.clone()),
            hostnames: Some(vec![hostname.clone()]),
        })
        .collect();
    host_aliases.sort_by(|a, b| a.ip.cmp(&b.ip));

    let update_strategy = match cluster.spec.update_strategy.method {
        // The operator deletes pods itself during managed updates; the
        // StatefulSet controller must not race it.
        UpdateStrategyMethod::Managed => "OnDelete",
        UpdateStrategyMethod::StatefulSet => "RollingUpdate",
    };

    let service_name = if cluster.uses_headless_service() {
        cluster.headless_service_name()
    } else {
        cluster.common_service_name()
    };

    StatefulSet {
        metadata: ObjectMeta {
            name: Some(cluster.statefulset_name()),
            namespace: cluster.namespace(),
            labels: Some(labels.clone()),
            owner_references: Some(vec![owner_reference(cluster)]),
            ..Default::default()
        },
        spec: Some(StatefulSetSpec {
            replicas: Some(cluster.spec.replicas),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            service_name,
            pod_management_policy: Some("Parallel".to_string()),
            update_strategy: Some(StatefulSetUpdateStrategy {
                type_: Some(update_strategy.to_string()),
                rolling_update: None,
            }),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    annotations: if annotations.is_empty() {
                        None
                    } else {
                        Some(annotations)
                    },
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    host_aliases: if host_aliases.is_empty() {
                        None
                    } else {
                        Some(host_aliases)
                    },
                    init_containers: if init_containers.is_empty() {
                        None
                    } else {
                        Some(init_containers)
                    },
                    containers: vec![Container {
                        name: SOLR_NODE_CONTAINER.to_string(),
                        image: Some(cluster.spec.image.full_image()),
                        ports: Some(vec![ContainerPort {
                            container_port: port,
                            name: Some("solr-client".to_string()),
                            ..Default::default()
                        }]),
                        env: Some(env),
                        volume_mounts: Some(volume_mounts),
                        readiness_probe: Some(probe(15)),
                        liveness_probe: Some(probe(60)),
                        ..Default::default()
                    }],
                    volumes: Some(volumes),
                    ..Default::default()
                }),
            },
            volume_claim_templates: persistent.map(|storage| {
                vec![PersistentVolumeClaim {
                    metadata: ObjectMeta {
                        name: Some("data".to_string()),
                        labels: Some(shared_labels(&cluster_name)),
                        ..Default::default()
                    },
                    spec: Some(PersistentVolumeClaimSpec {
                        access_modes: Some(vec!["ReadWriteOnce".to_string()]),
                        storage_class_name: storage.storage_class.clone(),
                        resources: Some(ResourceRequirements {
                            requests: Some(BTreeMap::from([(
                                "storage".to_string(),
                                Quantity(storage.size.clone()),
                            )])),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// SOLR_HOST template, resolved per pod through `$(POD_NAME)` substitution
fn node_host_template(cluster: &SolrCluster, ns: &str) -> String {
    let external = cluster.spec.addressability.external.as_ref();
    if external.map(|e| e.use_external_address).unwrap_or(false) {
        cluster.advertised_node_host("$(POD_NAME)")
    } else if cluster.uses_headless_service() {
        format!("$(POD_NAME).{}.{}", cluster.headless_service_name(), ns)
    } else {
        format!("$(POD_NAME).{}", ns)
    }
}
