//! Keystore password secret generation

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use kube::core::ObjectMeta;
use kube::ResourceExt;
use rand::Rng;

use crate::crd::SolrCluster;
use crate::resources::common::{owner_reference, shared_labels};

/// Generate a random password
fn generate_password(len: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Generate the secret holding the pkcs12 keystore password
///
/// Created once and never rotated by the operator; cert-manager reads it
/// when materializing the keystore into the TLS secret.
pub fn generate_keystore_secret(cluster: &SolrCluster) -> Secret {
    let cluster_name = cluster.name_any();

    let string_data = BTreeMap::from([(
        cluster.keystore_password_secret_key(),
        generate_password(32),
    )]);

    Secret {
        metadata: ObjectMeta {
            name: Some(cluster.keystore_password_secret_name()),
            namespace: cluster.namespace(),
            labels: Some(shared_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)]),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        string_data: Some(string_data),
        ..Default::default()
    }
}
