use kube::Client;

/// Process-level settings, passed in at construction time so tests can vary
/// them per case
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Whether the ZooKeeper operator's CRD is available for provisioning
    /// managed ensembles
    pub use_zookeeper_crd: bool,

    /// Domain externally exposed endpoints are created under when the
    /// cluster does not declare its own
    pub ingress_base_domain: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            use_zookeeper_crd: true,
            ingress_base_domain: String::new(),
        }
    }
}

/// Shared context for the controller
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client
    pub client: Client,
    /// Process-level settings
    pub config: ControllerConfig,
}

impl Context {
    pub fn new(client: Client, config: ControllerConfig) -> Self {
        Self { client, config }
    }
}
