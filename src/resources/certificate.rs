//! cert-manager Certificate and Issuer generation
//!
//! The Certificate asks cert-manager to issue TLS material into a secret,
//! with a pkcs12 keystore materialized alongside it so nodes can consume it
//! directly.

use kube::core::ObjectMeta;
use kube::ResourceExt;

use crate::crd::certmanager::{
    CertIssuerRef, Certificate, CertificateKeystores, CertificateSpec, Issuer, IssuerSpec,
    KeystorePasswordRef, Pkcs12Keystore, SelfSignedIssuer,
};
use crate::crd::SolrCluster;
use crate::resources::common::{owner_reference, shared_labels};

/// Generate the Certificate for a cluster with auto-created TLS
pub fn generate_certificate(cluster: &SolrCluster) -> Certificate {
    let cluster_name = cluster.name_any();
    let ns = cluster.namespace().unwrap_or_default();

    let issuer_ref = cluster
        .spec
        .solr_tls
        .as_ref()
        .and_then(|tls| tls.auto_create.as_ref())
        .and_then(|ac| ac.issuer_ref.as_ref())
        .map(|r| CertIssuerRef {
            name: r.name.clone(),
            kind: r.kind.clone(),
            group: Some("cert-manager.io".to_string()),
        })
        .unwrap_or_else(|| CertIssuerRef {
            name: cluster.selfsigned_issuer_name(),
            kind: "Issuer".to_string(),
            group: Some("cert-manager.io".to_string()),
        });

    let mut dns_names = vec![
        format!("{}.{}", cluster.common_service_name(), ns),
        format!("{}.{}.svc.cluster.local", cluster.common_service_name(), ns),
        format!("*.{}.{}", cluster.headless_service_name(), ns),
        format!(
            "*.{}.{}.svc.cluster.local",
            cluster.headless_service_name(),
            ns
        ),
    ];
    if let Some(ext) = cluster.spec.addressability.external.as_ref() {
        dns_names.push(format!("*.{}", ext.domain_name));
    }

    Certificate {
        metadata: ObjectMeta {
            name: Some(cluster.tls_cert_name()),
            namespace: cluster.namespace(),
            labels: Some(shared_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)]),
            ..Default::default()
        },
        spec: CertificateSpec {
            secret_name: cluster.tls_secret_name(),
            issuer_ref,
            common_name: Some(format!("{}.{}", cluster.common_service_name(), ns)),
            dns_names,
            keystores: Some(CertificateKeystores {
                pkcs12: Some(Pkcs12Keystore {
                    create: true,
                    password_secret_ref: KeystorePasswordRef {
                        name: cluster.keystore_password_secret_name(),
                        key: cluster.keystore_password_secret_key(),
                    },
                }),
            }),
        },
        status: None,
    }
}

/// Generate a self-signed Issuer for clusters without an issuer reference
pub fn generate_selfsigned_issuer(cluster: &SolrCluster, issuer_name: &str) -> Issuer {
    let cluster_name = cluster.name_any();

    Issuer {
        metadata: ObjectMeta {
            name: Some(issuer_name.to_string()),
            namespace: cluster.namespace(),
            labels: Some(shared_labels(&cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)]),
            ..Default::default()
        },
        spec: IssuerSpec {
            self_signed: Some(SelfSignedIssuer {}),
        },
    }
}

/// Copy the create-time fields of a desired Certificate onto the live one.
///
/// Returns whether anything changed. A change here means the issued secret
/// must be deleted before the Certificate is updated, since the issuer only
/// re-issues into an absent secret.
pub fn copy_create_certificate_fields(desired: &Certificate, live: &mut Certificate) -> bool {
    let mut changed = false;

    if live.spec.secret_name != desired.spec.secret_name {
        live.spec.secret_name = desired.spec.secret_name.clone();
        changed = true;
    }
    if live.spec.issuer_ref != desired.spec.issuer_ref {
        live.spec.issuer_ref = desired.spec.issuer_ref.clone();
        changed = true;
    }
    if live.spec.dns_names != desired.spec.dns_names {
        live.spec.dns_names = desired.spec.dns_names.clone();
        changed = true;
    }
    if live.spec.common_name != desired.spec.common_name {
        live.spec.common_name = desired.spec.common_name.clone();
        changed = true;
    }
    if live.spec.keystores != desired.spec.keystores {
        live.spec.keystores = desired.spec.keystores.clone();
        changed = true;
    }

    changed
}
