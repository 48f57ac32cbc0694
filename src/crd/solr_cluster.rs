use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// SolrCluster is the Schema for the solrclusters API
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[kube(
    group = "solr.example.com",
    version = "v1beta1",
    kind = "SolrCluster",
    plural = "solrclusters",
    shortname = "solr",
    namespaced,
    status = "SolrClusterStatus",
    printcolumn = r#"{"name":"Version", "type":"string", "jsonPath":".status.version"}"#,
    printcolumn = r#"{"name":"TargetVersion", "type":"string", "jsonPath":".status.targetVersion"}"#,
    printcolumn = r#"{"name":"DesiredNodes", "type":"integer", "jsonPath":".spec.replicas"}"#,
    printcolumn = r#"{"name":"ReadyNodes", "type":"integer", "jsonPath":".status.readyReplicas"}"#,
    printcolumn = r#"{"name":"UpToDateNodes", "type":"integer", "jsonPath":".status.upToDateNodes"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SolrClusterSpec {
    /// Number of search nodes to run
    #[serde(default = "default_replicas")]
    pub replicas: i32,

    /// Container image for the search nodes
    #[serde(default)]
    pub image: ImageSpec,

    /// How the cluster is addressed, internally and externally
    #[serde(default)]
    pub addressability: AddressabilitySpec,

    /// Reference to the ZooKeeper ensemble the cluster coordinates through.
    /// Either an external connection string or a managed ensemble; exactly
    /// one must be set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zookeeper_ref: Option<ZookeeperRef>,

    /// TLS configuration for node-to-node and client traffic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solr_tls: Option<TlsSpec>,

    /// Data storage configuration
    #[serde(default)]
    pub storage_options: StorageOptions,

    /// How pod template changes are rolled out
    #[serde(default)]
    pub update_strategy: UpdateStrategySpec,

    /// Name of a user-provided ConfigMap carrying solr.xml. When set, the
    /// operator does not generate its own ConfigMap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provided_config_map: Option<String>,
}

fn default_replicas() -> i32 {
    3
}

/// Container image coordinates
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageSpec {
    /// Image repository
    #[serde(default = "default_image_repository")]
    pub repository: String,

    /// Image tag, also the version the cluster is considered to run
    #[serde(default = "default_image_tag")]
    pub tag: String,
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self {
            repository: default_image_repository(),
            tag: default_image_tag(),
        }
    }
}

fn default_image_repository() -> String {
    "solr".to_string()
}

fn default_image_tag() -> String {
    "8.11".to_string()
}

impl ImageSpec {
    pub fn full_image(&self) -> String {
        format!("{}:{}", self.repository, self.tag)
    }
}

/// Addressability of the cluster
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressabilitySpec {
    /// Port the search container listens on
    #[serde(default = "default_pod_port")]
    pub pod_port: i32,

    /// Port exposed by the common (load-balanced) service
    #[serde(default = "default_common_service_port")]
    pub common_service_port: i32,

    /// External exposure; nodes stay internal-only when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalAddressability>,
}

impl Default for AddressabilitySpec {
    fn default() -> Self {
        Self {
            pod_port: default_pod_port(),
            common_service_port: default_common_service_port(),
            external: None,
        }
    }
}

fn default_pod_port() -> i32 {
    8983
}

fn default_common_service_port() -> i32 {
    80
}

/// External exposure settings
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExternalAddressability {
    /// Mechanism used to expose the cluster outside of Kubernetes
    #[serde(default)]
    pub method: ExternalMethod,

    /// Domain all external addresses live under
    pub domain_name: String,

    /// Advertise the external address to the ensemble instead of the
    /// pod-internal one. Requires resolvable node service IPs.
    #[serde(default)]
    pub use_external_address: bool,

    /// Do not expose individual nodes externally
    #[serde(default)]
    pub hide_nodes: bool,

    /// Do not expose the common endpoint externally
    #[serde(default)]
    pub hide_common: bool,
}

/// Supported external exposure mechanisms
#[derive(Serialize, Deserialize, Clone, Copy, Debug, JsonSchema, Default, PartialEq, Eq)]
pub enum ExternalMethod {
    /// A single Ingress fronting per-node and common services
    #[default]
    Ingress,
    /// DNS records managed outside the operator, pointing at node services
    ExternalDns,
}

/// Reference to the coordination ensemble
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ZookeeperRef {
    /// Connection details for an externally managed ensemble
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_info: Option<ZookeeperConnectionInfo>,

    /// Ensemble provisioned and owned by this operator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provided: Option<ProvidedZookeeper>,
}

/// Where and how to reach a ZooKeeper ensemble
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZookeeperConnectionInfo {
    /// Comma-separated host:port list reachable from inside the cluster
    #[serde(default)]
    pub internal_connection_string: String,

    /// Host:port list reachable from outside the cluster, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_connection_string: Option<String>,

    /// Root path all cluster data lives under
    #[serde(default = "default_chroot")]
    pub chroot: String,
}

impl Default for ZookeeperConnectionInfo {
    fn default() -> Self {
        Self {
            internal_connection_string: String::new(),
            external_connection_string: None,
            chroot: default_chroot(),
        }
    }
}

fn default_chroot() -> String {
    "/".to_string()
}

impl ZookeeperConnectionInfo {
    /// Full connection string handed to search nodes, chroot included
    pub fn connection_string(&self) -> String {
        format!("{}{}", self.internal_connection_string, self.chroot)
    }

    /// Whether enough information exists to actually connect somewhere
    pub fn is_resolvable(&self) -> bool {
        self.internal_connection_string.contains(':')
    }

    /// Prefix a ZooKeeper path with the configured chroot
    pub fn chrooted_path(&self, path: &str) -> String {
        match self.chroot.trim_end_matches('/') {
            "" => path.to_string(),
            root => format!("{}{}", root, path),
        }
    }
}

/// A ZooKeeper ensemble provisioned for the cluster
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvidedZookeeper {
    /// Ensemble size
    #[serde(default = "default_zk_replicas")]
    pub replicas: i32,

    /// Override for the ZooKeeper image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Root path the search cluster chroots into
    #[serde(default = "default_chroot")]
    pub chroot: String,

    /// Persistent volume size for each ensemble member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_size: Option<String>,
}

fn default_zk_replicas() -> i32 {
    3
}

/// TLS configuration
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsSpec {
    /// Secret and key holding the pkcs12 keystore. Defaults to the secret
    /// backing the auto-created certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pkcs12_secret: Option<SecretRef>,

    /// Secret and key holding the keystore password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_store_password_secret: Option<SecretRef>,

    /// Roll the StatefulSet whenever the TLS secret's resourceVersion moves
    /// (certificate renewal)
    #[serde(default)]
    pub restart_on_tls_secret_update: bool,

    /// Have the operator drive certificate issuance instead of requiring a
    /// pre-existing secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_create: Option<CreateCertificateSpec>,
}

/// A key within a named secret
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    pub name: String,
    pub key: String,
}

/// Options for the auto-created certificate
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertificateSpec {
    /// Name of the Certificate object; defaults to `<cluster>-solr-tls`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Issuer to request the certificate from. A self-signed issuer is
    /// provisioned when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_ref: Option<IssuerRefSpec>,
}

/// Reference to a cert-manager issuer
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssuerRefSpec {
    pub name: String,
    /// "Issuer" or "ClusterIssuer"
    #[serde(default = "default_issuer_kind")]
    pub kind: String,
}

fn default_issuer_kind() -> String {
    "Issuer".to_string()
}

/// Data storage configuration
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct StorageOptions {
    /// Persistent volume claims per node; ephemeral emptyDir storage when
    /// unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_storage: Option<PersistentStorageSpec>,

    /// Shared volume for backup/restore operations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_restore_options: Option<BackupRestoreOptions>,
}

/// Persistent storage settings
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersistentStorageSpec {
    /// What happens to the claims when the cluster shrinks or is deleted
    #[serde(default)]
    pub volume_reclaim_policy: VolumeReclaimPolicy,

    /// Size of each node's data volume
    #[serde(default = "default_storage_size")]
    pub size: String,

    /// Storage class; cluster default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

impl Default for PersistentStorageSpec {
    fn default() -> Self {
        Self {
            volume_reclaim_policy: VolumeReclaimPolicy::default(),
            size: default_storage_size(),
            storage_class: None,
        }
    }
}

fn default_storage_size() -> String {
    "1Gi".to_string()
}

/// Reclaim policy for node data volumes
#[derive(Serialize, Deserialize, Clone, Copy, Debug, JsonSchema, Default, PartialEq, Eq)]
pub enum VolumeReclaimPolicy {
    /// Claims outlive the cluster object
    #[default]
    Retain,
    /// Claims are deleted when orphaned by scale-down or cluster deletion
    Delete,
}

/// Backup/restore volume settings
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupRestoreOptions {
    /// Existing ReadWriteMany claim mounted into every node
    pub pvc_name: String,
}

/// How pod template changes are rolled out
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStrategySpec {
    /// Who drives the rollout
    #[serde(default)]
    pub method: UpdateStrategyMethod,

    /// Options for the managed rollout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub managed: Option<ManagedUpdateOptions>,
}

/// Rollout driver
#[derive(Serialize, Deserialize, Clone, Copy, Debug, JsonSchema, Default, PartialEq, Eq)]
pub enum UpdateStrategyMethod {
    /// The operator selects which pods may be taken down, bounded by the
    /// availability policy
    #[default]
    Managed,
    /// The StatefulSet controller's own rolling update
    StatefulSet,
}

/// Options for operator-managed rollouts
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ManagedUpdateOptions {
    /// Upper bound on simultaneously unavailable pods, as an absolute count
    /// or a percentage of desired replicas. Defaults to 25%.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pods_unavailable: Option<PodCount>,
}

/// An absolute pod count or a percentage of the desired replica count
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, PartialEq)]
#[serde(untagged)]
pub enum PodCount {
    Count(i32),
    Percent(String),
}

/// Status of the SolrCluster, fully recomputed on every reconciliation pass
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolrClusterStatus {
    /// Per-node status, sorted by node name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub solr_nodes: Vec<SolrNodeStatus>,

    /// Total pods the StatefulSet accounts for
    #[serde(default)]
    pub replicas: i32,

    /// Pods passing their readiness check
    #[serde(default)]
    pub ready_replicas: i32,

    /// Pods running the current pod template revision
    #[serde(default)]
    pub up_to_date_nodes: i32,

    /// Common endpoint reachable inside the cluster
    #[serde(default)]
    pub internal_common_address: String,

    /// Common endpoint reachable outside the cluster, if exposed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_common_address: Option<String>,

    /// Version the cluster is running
    #[serde(default)]
    pub version: String,

    /// Version the cluster is rolling towards; empty outside of a rollout
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_version: String,

    /// Resolved ensemble connection details
    #[serde(default)]
    pub zookeeper_connection_info: ZookeeperConnectionInfo,

    /// Every desired node has the backup volume mounted
    #[serde(default)]
    pub backup_restore_ready: bool,

    /// The https urlScheme property has been pushed to the ensemble
    #[serde(default)]
    pub url_scheme_cluster_property: bool,
}

/// Status of a single search node
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolrNodeStatus {
    /// Pod name
    #[serde(default)]
    pub name: String,

    /// Kubernetes node the pod is scheduled on
    #[serde(default)]
    pub node_name: String,

    /// Address reachable inside the cluster
    #[serde(default)]
    pub internal_address: String,

    /// Address reachable outside the cluster, if exposed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_address: Option<String>,

    /// Version derived from the running container image
    #[serde(default)]
    pub version: String,

    /// Pod readiness per its Ready condition
    #[serde(default)]
    pub ready: bool,

    /// Pod runs the StatefulSet's current template revision
    #[serde(default)]
    pub spec_up_to_date: bool,
}

/// Version tag of a container image reference
pub fn image_version(image: &str) -> &str {
    match image.rsplit_once(':') {
        Some((_, tag)) => tag,
        None => image,
    }
}

impl SolrCluster {
    fn ns(&self) -> String {
        self.namespace().unwrap_or_default()
    }

    pub fn statefulset_name(&self) -> String {
        self.name_any()
    }

    pub fn common_service_name(&self) -> String {
        format!("{}-common", self.name_any())
    }

    pub fn headless_service_name(&self) -> String {
        format!("{}-headless", self.name_any())
    }

    pub fn config_map_name(&self) -> String {
        format!("{}-solrxml", self.name_any())
    }

    pub fn selfsigned_issuer_name(&self) -> String {
        format!("{}-selfsigned-issuer", self.name_any())
    }

    /// Name of the auto-created Certificate object
    pub fn tls_cert_name(&self) -> String {
        self.spec
            .solr_tls
            .as_ref()
            .and_then(|tls| tls.auto_create.as_ref())
            .filter(|c| !c.name.is_empty())
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("{}-solr-tls", self.name_any()))
    }

    /// Name of the secret holding the pkcs12 keystore
    pub fn tls_secret_name(&self) -> String {
        self.spec
            .solr_tls
            .as_ref()
            .and_then(|tls| tls.pkcs12_secret.as_ref())
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("{}-solr-tls", self.name_any()))
    }

    /// Key within the TLS secret holding the pkcs12 keystore
    pub fn tls_secret_key(&self) -> String {
        self.spec
            .solr_tls
            .as_ref()
            .and_then(|tls| tls.pkcs12_secret.as_ref())
            .map(|s| s.key.clone())
            .unwrap_or_else(|| "keystore.p12".to_string())
    }

    pub fn keystore_password_secret_name(&self) -> String {
        self.spec
            .solr_tls
            .as_ref()
            .and_then(|tls| tls.key_store_password_secret.as_ref())
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("{}-keystore-pass", self.name_any()))
    }

    pub fn keystore_password_secret_key(&self) -> String {
        self.spec
            .solr_tls
            .as_ref()
            .and_then(|tls| tls.key_store_password_secret.as_ref())
            .map(|s| s.key.clone())
            .unwrap_or_else(|| "password".to_string())
    }

    pub fn node_name(&self, ordinal: i32) -> String {
        format!("{}-{}", self.statefulset_name(), ordinal)
    }

    /// Names of all desired node pods, ordinal order
    pub fn all_node_names(&self) -> Vec<String> {
        (0..self.spec.replicas).map(|i| self.node_name(i)).collect()
    }

    /// Individual node services exist only for ingress-exposed nodes
    pub fn uses_individual_node_services(&self) -> bool {
        self.spec
            .addressability
            .external
            .as_ref()
            .map(|e| e.method == ExternalMethod::Ingress && !e.hide_nodes)
            .unwrap_or(false)
    }

    pub fn uses_headless_service(&self) -> bool {
        !self.uses_individual_node_services()
    }

    /// Node address reachable inside the cluster
    pub fn internal_node_address(&self, node_name: &str) -> String {
        let port = self.spec.addressability.pod_port;
        if self.uses_headless_service() {
            format!(
                "{}.{}.{}:{}",
                node_name,
                self.headless_service_name(),
                self.ns(),
                port
            )
        } else {
            format!("{}.{}:{}", node_name, self.ns(), port)
        }
    }

    /// External hostname for a node, without a port
    pub fn advertised_node_host(&self, node_name: &str) -> String {
        match self.spec.addressability.external.as_ref() {
            Some(ext) if ext.method == ExternalMethod::Ingress => {
                format!("{}-{}.{}", self.ns(), node_name, ext.domain_name)
            }
            Some(ext) => format!("{}.{}.{}", node_name, self.ns(), ext.domain_name),
            None => self.internal_node_address(node_name),
        }
    }

    /// Node address reachable outside the cluster
    pub fn external_node_address(&self, node_name: &str) -> String {
        match self.spec.addressability.external.as_ref() {
            Some(ext) if ext.method == ExternalMethod::Ingress => {
                self.advertised_node_host(node_name)
            }
            _ => format!(
                "{}:{}",
                self.advertised_node_host(node_name),
                self.spec.addressability.pod_port
            ),
        }
    }

    pub fn internal_common_address(&self) -> String {
        format!(
            "{}.{}:{}",
            self.common_service_name(),
            self.ns(),
            self.spec.addressability.common_service_port
        )
    }

    pub fn external_common_address(&self, domain: &str) -> String {
        format!("{}-{}.{}", self.ns(), self.common_service_name(), domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ObjectMeta;

    fn cluster() -> SolrCluster {
        let mut cluster = SolrCluster::new(
            "search",
            SolrClusterSpec {
                replicas: 3,
                image: ImageSpec::default(),
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
            ..Default::default()
        };
        cluster
    }

    #[test]
    fn test_internal_node_address_uses_headless_service() {
        let cluster = cluster();
        assert_eq!(
            cluster.internal_node_address("search-0"),
            "search-0.search-headless.prod:8983"
        );
    }

    #[test]
    fn test_node_services_only_for_ingress_exposure() {
        let mut cluster = cluster();
        assert!(!cluster.uses_individual_node_services());
        assert!(cluster.uses_headless_service());

        cluster.spec.addressability.external = Some(ExternalAddressability {
            method: ExternalMethod::Ingress,
            domain_name: "example.com".to_string(),
            use_external_address: false,
            hide_nodes: false,
            hide_common: false,
        });
        assert!(cluster.uses_individual_node_services());
        assert!(!cluster.uses_headless_service());

        cluster.spec.addressability.external.as_mut().unwrap().hide_nodes = true;
        assert!(!cluster.uses_individual_node_services());
    }

    #[test]
    fn test_external_node_address_per_method() {
        let mut cluster = cluster();
        cluster.spec.addressability.external = Some(ExternalAddressability {
            method: ExternalMethod::Ingress,
            domain_name: "example.com".to_string(),
            use_external_address: false,
            hide_nodes: false,
            hide_common: false,
        });
        assert_eq!(
            cluster.external_node_address("search-0"),
            "prod-search-0.example.com"
        );

        cluster.spec.addressability.external.as_mut().unwrap().method =
            ExternalMethod::ExternalDns;
        assert_eq!(
            cluster.external_node_address("search-0"),
            "search-0.prod.example.com:8983"
        );
    }

    #[test]
    fn test_connection_string_includes_chroot() {
        let info = ZookeeperConnectionInfo {
            internal_connection_string: "zk-0.zk-headless.prod:2181".to_string(),
            external_connection_string: None,
            chroot: "/search".to_string(),
        };
        assert_eq!(
            info.connection_string(),
            "zk-0.zk-headless.prod:2181/search"
        );
        assert!(info.is_resolvable());
        assert_eq!(info.chrooted_path("/clusterprops.json"), "/search/clusterprops.json");
    }

    #[test]
    fn test_root_chroot_does_not_prefix_paths() {
        let info = ZookeeperConnectionInfo {
            internal_connection_string: "zk:2181".to_string(),
            external_connection_string: None,
            chroot: "/".to_string(),
        };
        assert_eq!(info.chrooted_path("/clusterprops.json"), "/clusterprops.json");
        assert_eq!(info.connection_string(), "zk:2181/");
    }

    #[test]
    fn test_unresolvable_without_port() {
        let info = ZookeeperConnectionInfo::default();
        assert!(!info.is_resolvable());
    }

    #[test]
    fn test_image_version() {
        assert_eq!(image_version("solr:8.11"), "8.11");
        assert_eq!(image_version("registry.example.com:5000/solr:9.0"), "9.0");
        assert_eq!(image_version("solr"), "solr");
    }

    #[test]
    fn test_tls_names_default_from_cluster_name() {
        let mut cluster = cluster();
        cluster.spec.solr_tls = Some(TlsSpec {
            pkcs12_secret: None,
            key_store_password_secret: None,
            restart_on_tls_secret_update: false,
            auto_create: Some(CreateCertificateSpec::default()),
        });
        assert_eq!(cluster.tls_cert_name(), "search-solr-tls");
        assert_eq!(cluster.tls_secret_name(), "search-solr-tls");
        assert_eq!(cluster.tls_secret_key(), "keystore.p12");
        assert_eq!(cluster.keystore_password_secret_name(), "search-keystore-pass");

        cluster.spec.solr_tls.as_mut().unwrap().pkcs12_secret = Some(SecretRef {
            name: "my-tls".to_string(),
            key: "store.p12".to_string(),
        });
        assert_eq!(cluster.tls_secret_name(), "my-tls");
        assert_eq!(cluster.tls_secret_key(), "store.p12");
    }

    #[test]
    fn test_all_node_names_ordinal_order() {
        let cluster = cluster();
        assert_eq!(
            cluster.all_node_names(),
            vec!["search-0", "search-1", "search-2"]
        );
    }
}
