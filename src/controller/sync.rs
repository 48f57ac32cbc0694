//! Create-or-update synchronization of owned resources
//!
//! Every owned resource kind goes through the same motions: look up the
//! live object, create the desired one if absent, otherwise merge the
//! desired object's significant fields into the live copy and update only
//! when something actually changed. Field merging is deliberately selective:
//! comparing whole objects against the API server's defaulted copies would
//! report spurious drift on every pass.
//!
//! The synchronizer never retries; a failed call aborts the pass and the
//! controller's requeue handles the rest.

use std::collections::BTreeMap;
use std::fmt::Debug;

use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, Service, Volume};
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::PostParams;
use kube::core::ObjectMeta;
use kube::{Api, Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::controller::error::Result;
use crate::crd::ZookeeperCluster;

/// What the synchronizer did for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

/// A resource kind that knows which of its fields the operator owns
pub trait Diffable {
    /// Merge the desired object's significant fields into self (the live
    /// object), returning whether anything changed.
    fn merge_from(&mut self, desired: &Self) -> bool;
}

/// Create the desired resource, or update the live one if its significant
/// fields drifted. Returns the outcome and the resulting live object.
pub async fn sync<K>(client: &Client, desired: &K) -> Result<(SyncOutcome, K)>
where
    K: Resource<Scope = k8s_openapi::NamespaceResourceScope>
        + Diffable
        + Clone
        + Serialize
        + DeserializeOwned
        + Debug,
    <K as Resource>::DynamicType: Default,
{
    let dt = K::DynamicType::default();
    let kind = K::kind(&dt);
    let ns = desired.namespace().unwrap_or_default();
    let name = desired.name_any();
    let api: Api<K> = Api::namespaced(client.clone(), &ns);

    match api.get_opt(&name).await? {
        None => {
            info!("Creating {} {}/{}", kind, ns, name);
            let created = api.create(&PostParams::default(), desired).await?;
            Ok((SyncOutcome::Created, created))
        }
        Some(mut live) => {
            if live.merge_from(desired) {
                info!("Updating {} {}/{}", kind, ns, name);
                let updated = api.replace(&name, &PostParams::default(), &live).await?;
                Ok((SyncOutcome::Updated, updated))
            } else {
                debug!("{} {}/{} unchanged", kind, ns, name);
                Ok((SyncOutcome::Unchanged, live))
            }
        }
    }
}

/// Overwrite `live` with `desired` when they differ
fn merge_field<T: PartialEq + Clone>(live: &mut T, desired: &T) -> bool {
    if live != desired {
        *live = desired.clone();
        true
    } else {
        false
    }
}

/// Ensure every desired label is present with the desired value; labels set
/// by other controllers are left alone
fn merge_labels(live: &mut ObjectMeta, desired: &ObjectMeta) -> bool {
    let mut changed = false;
    if let Some(desired_labels) = desired.labels.as_ref() {
        let live_labels = live.labels.get_or_insert_with(BTreeMap::new);
        for (k, v) in desired_labels {
            if live_labels.get(k) != Some(v) {
                live_labels.insert(k.clone(), v.clone());
                changed = true;
            }
        }
    }
    changed
}

/// Ensure every desired annotation is present with the desired value
fn merge_annotations(live: &mut ObjectMeta, desired: &ObjectMeta) -> bool {
    let mut changed = false;
    if let Some(desired_annotations) = desired.annotations.as_ref() {
        let live_annotations = live.annotations.get_or_insert_with(BTreeMap::new);
        for (k, v) in desired_annotations {
            if live_annotations.get(k) != Some(v) {
                live_annotations.insert(k.clone(), v.clone());
                changed = true;
            }
        }
    }
    changed
}

impl Diffable for Service {
    fn merge_from(&mut self, desired: &Self) -> bool {
        let mut changed = merge_labels(&mut self.metadata, &desired.metadata);

        let desired_spec = desired.spec.clone().unwrap_or_default();
        let live_spec = self.spec.get_or_insert_with(Default::default);
        changed |= merge_field(&mut live_spec.ports, &desired_spec.ports);
        changed |= merge_field(&mut live_spec.selector, &desired_spec.selector);
        // cluster_ip and the rest belong to the API server

        changed
    }
}

impl Diffable for ConfigMap {
    fn merge_from(&mut self, desired: &Self) -> bool {
        let mut changed = merge_labels(&mut self.metadata, &desired.metadata);
        changed |= merge_field(&mut self.data, &desired.data);
        changed
    }
}

/// The identity a pod volume resolves to, ignoring server-defaulted knobs
/// like file modes
fn volume_identity(volume: &Volume) -> (String, Option<String>, Option<String>, Option<String>, bool) {
    (
        volume.name.clone(),
        volume.config_map.as_ref().and_then(|s| s.name.clone()),
        volume.secret.as_ref().and_then(|s| s.secret_name.clone()),
        volume
            .persistent_volume_claim
            .as_ref()
            .map(|s| s.claim_name.clone()),
        volume.empty_dir.is_some(),
    )
}

impl Diffable for StatefulSet {
    fn merge_from(&mut self, desired: &Self) -> bool {
        let mut changed = merge_labels(&mut self.metadata, &desired.metadata);

        let desired_spec = desired.spec.clone().unwrap_or_default();
        let live_spec = self.spec.get_or_insert_with(Default::default);

        changed |= merge_field(&mut live_spec.replicas, &desired_spec.replicas);

        // Only the strategy type is operator-owned; rollingUpdate knobs get
        // server defaults
        let desired_strategy_type = desired_spec
            .update_strategy
            .as_ref()
            .and_then(|s| s.type_.clone());
        let live_strategy = live_spec.update_strategy.get_or_insert_with(Default::default);
        if live_strategy.type_ != desired_strategy_type {
            live_strategy.type_ = desired_strategy_type;
            live_strategy.rolling_update = None;
            changed = true;
        }

        let desired_template = &desired_spec.template;
        let live_template = &mut live_spec.template;

        let desired_meta = desired_template.metadata.clone().unwrap_or_default();
        let live_meta = live_template.metadata.get_or_insert_with(Default::default);
        changed |= merge_labels(live_meta, &desired_meta);
        changed |= merge_annotations(live_meta, &desired_meta);

        if let (Some(desired_pod), Some(live_pod)) =
            (desired_template.spec.as_ref(), live_template.spec.as_mut())
        {
            changed |= merge_field(&mut live_pod.host_aliases, &desired_pod.host_aliases);

            if let (Some(desired_container), Some(live_container)) =
                (desired_pod.containers.first(), live_pod.containers.first_mut())
            {
                changed |= merge_field(&mut live_container.image, &desired_container.image);
                changed |= merge_field(&mut live_container.env, &desired_container.env);
                changed |= merge_field(
                    &mut live_container.volume_mounts,
                    &desired_container.volume_mounts,
                );
            }

            // Init containers: presence and content are operator-owned
            let desired_inits: Vec<_> = desired_pod
                .init_containers
                .iter()
                .flatten()
                .map(|c| (c.name.clone(), c.image.clone(), c.args.clone()))
                .collect();
            let live_inits: Vec<_> = live_pod
                .init_containers
                .iter()
                .flatten()
                .map(|c| (c.name.clone(), c.image.clone(), c.args.clone()))
                .collect();
            if desired_inits != live_inits {
                live_pod.init_containers = desired_pod.init_containers.clone();
                changed = true;
            }

            // Volumes: compare what they resolve to, not server-defaulted
            // file modes
            let desired_volumes: Vec<_> = desired_pod
                .volumes
                .iter()
                .flatten()
                .map(volume_identity)
                .collect();
            let live_volumes: Vec<_> = live_pod
                .volumes
                .iter()
                .flatten()
                .map(volume_identity)
                .collect();
            if desired_volumes != live_volumes {
                live_pod.volumes = desired_pod.volumes.clone();
                changed = true;
            }
        }

        changed
    }
}

impl Diffable for Ingress {
    fn merge_from(&mut self, desired: &Self) -> bool {
        let mut changed = merge_labels(&mut self.metadata, &desired.metadata);

        let desired_spec = desired.spec.clone().unwrap_or_default();
        let live_spec = self.spec.get_or_insert_with(Default::default);
        changed |= merge_field(&mut live_spec.rules, &desired_spec.rules);

        changed
    }
}

impl Diffable for ZookeeperCluster {
    fn merge_from(&mut self, desired: &Self) -> bool {
        let mut changed = merge_labels(&mut self.metadata, &desired.metadata);
        changed |= merge_field(&mut self.spec, &desired.spec);
        changed
    }
}
