pub mod certmanager;
pub mod solr_cluster;
pub mod zookeeper;

pub use certmanager::{
    CertIssuerRef, Certificate, CertificateKeystores, CertificateSpec, CertificateStatus, Issuer,
    IssuerSpec, KeystorePasswordRef, Pkcs12Keystore, SelfSignedIssuer,
};
pub use solr_cluster::{
    image_version, AddressabilitySpec, BackupRestoreOptions, CreateCertificateSpec,
    ExternalAddressability, ExternalMethod, ImageSpec, IssuerRefSpec, ManagedUpdateOptions,
    PersistentStorageSpec, PodCount, ProvidedZookeeper, SecretRef, SolrCluster, SolrClusterSpec,
    SolrClusterStatus, SolrNodeStatus, StorageOptions, TlsSpec, UpdateStrategyMethod,
    UpdateStrategySpec, VolumeReclaimPolicy, ZookeeperConnectionInfo, ZookeeperRef,
};
pub use zookeeper::{ZookeeperCluster, ZookeeperClusterSpec, ZookeeperClusterStatus, ZK_CLIENT_PORT};
