//! TLS certificate coordination
//!
//! Drives cert-manager through issuance of the node TLS certificate:
//! keystore-password secret, optional self-signed issuer, the Certificate
//! object itself, and re-issuance when the desired certificate drifts from
//! the live one.
//!
//! Certificate readiness is the existence of its backing secret, not a
//! status condition: conditions can flip before the secret materializes,
//! and the secret is what the StatefulSet actually mounts.

use k8s_openapi::api::core::v1::Secret;
use kube::api::{DeleteParams, PostParams};
use kube::{Api, ResourceExt};
use tracing::{error, info, warn};

use crate::controller::context::Context;
use crate::controller::error::Result;
use crate::crd::{Certificate, Issuer, SolrCluster};
use crate::resources::certificate::{
    copy_create_certificate_fields, generate_certificate, generate_selfsigned_issuer,
};
use crate::resources::common::owner_reference;
use crate::resources::secret::generate_keystore_secret;

/// Facts about the TLS secret needed for StatefulSet generation
#[derive(Debug, Default, Clone)]
pub struct TlsSecretProbe {
    /// The secret lacks a ready-made pkcs12 keystore; pods must build one
    pub needs_pkcs12_init_container: bool,
    /// resourceVersion of the secret, when restarts on rotation are wanted
    pub secret_version: Option<String>,
}

/// Reconcile the auto-created TLS certificate. Returns whether the
/// certificate is ready for use.
pub async fn reconcile_auto_create_tls(ctx: &Context, cluster: &SolrCluster) -> Result<bool> {
    let ns = cluster.namespace().unwrap_or_default();
    let certs: Api<Certificate> = Api::namespaced(ctx.client.clone(), &ns);
    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), &ns);

    // Steady-state short circuit: issuance can take minutes, so skip the
    // bootstrap checks entirely once a cert and its secret exist
    if let Some(found_cert) = certs.get_opt(&cluster.tls_cert_name()).await? {
        if let Some(found_secret) = certificate_ready_secret(&secrets, &found_cert).await {
            let desired = generate_certificate(cluster);
            return after_certificate_ready(ctx, cluster, &desired, found_cert, found_secret)
                .await;
        }
    }

    info!("Reconciling TLS config for {}", cluster.name_any());

    // Keystore password secret first; cert-manager needs it to build the
    // pkcs12 keystore
    let keystore_secret = generate_keystore_secret(cluster);
    let keystore_name = keystore_secret.name_any();
    if secrets.get_opt(&keystore_name).await?.is_none() {
        info!("Creating keystore secret {}/{}", ns, keystore_name);
        secrets
            .create(&PostParams::default(), &keystore_secret)
            .await?;
    }

    // Provision a self-signed issuer when none was referenced
    let has_issuer_ref = cluster
        .spec
        .solr_tls
        .as_ref()
        .and_then(|tls| tls.auto_create.as_ref())
        .map(|ac| ac.issuer_ref.is_some())
        .unwrap_or(false);
    if !has_issuer_ref {
        let issuers: Api<Issuer> = Api::namespaced(ctx.client.clone(), &ns);
        let issuer_name = cluster.selfsigned_issuer_name();
        if issuers.get_opt(&issuer_name).await?.is_none() {
            info!("Creating self-signed certificate issuer {}", issuer_name);
            let issuer = generate_selfsigned_issuer(cluster, &issuer_name);
            issuers.create(&PostParams::default(), &issuer).await?;
        }
    }

    // Create or find the Certificate
    let desired = generate_certificate(cluster);
    match certs.get_opt(&desired.name_any()).await? {
        None => {
            info!("Creating Certificate {}", desired.name_any());
            certs.create(&PostParams::default(), &desired).await?;
            Ok(false)
        }
        Some(found_cert) => {
            match certificate_ready_secret(&secrets, &found_cert).await {
                Some(found_secret) => {
                    let ready =
                        after_certificate_ready(ctx, cluster, &desired, found_cert, found_secret)
                            .await?;
                    if ready {
                        info!("TLS certificate reconciled for {}", cluster.name_any());
                    }
                    Ok(ready)
                }
                None => {
                    info!(
                        "Certificate {} not ready, waiting for its secret",
                        found_cert.name_any()
                    );
                    Ok(false)
                }
            }
        }
    }
}

/// The secret backing an issued certificate, or None while issuance is
/// still in flight
async fn certificate_ready_secret(secrets: &Api<Secret>, cert: &Certificate) -> Option<Secret> {
    let secret_name = &cert.spec.secret_name;
    let found = match secrets.get_opt(secret_name).await {
        Ok(Some(secret)) => Some(secret),
        Ok(None) => {
            info!("TLS secret {} not found yet", secret_name);
            None
        }
        Err(e) => {
            error!("TLS secret {} lookup failed: {}", secret_name, e);
            None
        }
    };

    if found.is_none() {
        if let Some(status) = cert.status.as_ref() {
            if let Some(cond) = status.conditions.iter().find(|c| c.type_ == "Issuing") {
                info!(
                    "Certificate {} is still issuing (status {})",
                    cert.name_any(),
                    cond.status
                );
            }
        }
    }

    found
}

/// Apply drift handling and ownership once the certificate's secret exists.
/// Returns whether TLS is ready for StatefulSet generation.
async fn after_certificate_ready(
    ctx: &Context,
    cluster: &SolrCluster,
    desired: &Certificate,
    mut found_cert: Certificate,
    found_secret: Secret,
) -> Result<bool> {
    let ns = cluster.namespace().unwrap_or_default();
    let certs: Api<Certificate> = Api::namespaced(ctx.client.clone(), &ns);
    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), &ns);

    if copy_create_certificate_fields(desired, &mut found_cert) {
        warn!(
            "Certificate {} fields changed, forcing re-issue",
            found_cert.name_any()
        );
        // The issuer only re-issues into an absent secret, so the secret
        // must go before the Certificate update
        let secret_name = found_secret.name_any();
        secrets.delete(&secret_name, &DeleteParams::default()).await?;
        info!(
            "Deleted TLS secret {} so it gets re-created after the certificate update",
            secret_name
        );

        certs
            .replace(
                &found_cert.name_any(),
                &PostParams::default(),
                &found_cert,
            )
            .await?;

        // Just updated; let the next pass observe eventual readiness
        return Ok(false);
    }

    // The issuer created the secret, so it carries no owner reference; add
    // one so it is garbage collected with the cluster
    if found_secret
        .metadata
        .owner_references
        .as_ref()
        .map(|refs| refs.is_empty())
        .unwrap_or(true)
    {
        let mut secret = found_secret;
        secret.metadata.owner_references = Some(vec![owner_reference(cluster)]);
        secrets
            .replace(&secret.name_any(), &PostParams::default(), &secret)
            .await?;
    }

    Ok(true)
}

/// Inspect the TLS secret for StatefulSet generation. The secret must exist
/// by the time this is called.
pub async fn probe_tls_secret(ctx: &Context, cluster: &SolrCluster) -> Result<TlsSecretProbe> {
    let ns = cluster.namespace().unwrap_or_default();
    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), &ns);

    let secret = secrets.get(&cluster.tls_secret_name()).await?;

    let has_keystore = secret
        .data
        .as_ref()
        .map(|data| data.contains_key(&cluster.tls_secret_key()))
        .unwrap_or(false);

    let restart_on_update = cluster
        .spec
        .solr_tls
        .as_ref()
        .map(|tls| tls.restart_on_tls_secret_update)
        .unwrap_or(false);

    Ok(TlsSecretProbe {
        needs_pkcs12_init_container: !has_keystore,
        secret_version: restart_on_update.then(|| secret.resource_version()).flatten(),
    })
}
