// Test code is allowed to panic on failure
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Property-based tests for pod classification and claim orphan detection
//!
//! These verify structural invariants over arbitrary pod sets:
//! 1. up-to-date + out-of-date = total, with out-of-date pods partitioned
//!    disjointly into started and not-started
//! 2. orphan detection is exactly `ordinal >= replicas`
//! 3. update selection never exceeds the availability budget

use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::StatefulSetStatus;
use k8s_openapi::api::core::v1::{
    Container, ContainerStatus, Pod, PodCondition, PodSpec, PodStatus,
};
use kube::core::ObjectMeta;
use proptest::prelude::*;

use solr_operator::controller::{
    aggregate_status, determine_pods_safe_to_update, is_pvc_orphan,
};
use solr_operator::crd::{
    AddressabilitySpec, ImageSpec, ManagedUpdateOptions, PodCount, SolrCluster, SolrClusterSpec,
    SolrClusterStatus, StorageOptions, UpdateStrategySpec,
};
use solr_operator::resources::SOLR_NODE_CONTAINER;

fn cluster(replicas: i32) -> SolrCluster {
    let mut cluster = SolrCluster::new(
        "search",
        SolrClusterSpec {
            replicas,
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

#[derive(Debug, Clone)]
struct PodShape {
    ordinal: usize,
    ready: bool,
    up_to_date: bool,
    started: Option<bool>,
}

fn pod_shape() -> impl Strategy<Value = PodShape> {
    (
        0usize..16,
        any::<bool>(),
        any::<bool>(),
        prop_oneof![
            Just(None),
            Just(Some(false)),
            Just(Some(true)),
        ],
    )
        .prop_map(|(ordinal, ready, up_to_date, started)| PodShape {
            ordinal,
            ready,
            up_to_date,
            started,
        })
}

fn build_pod(shape: &PodShape) -> Pod {
    let revision = if shape.up_to_date { "rev-2" } else { "rev-1" };
    Pod {
        metadata: ObjectMeta {
            name: Some(format!("search-{}", shape.ordinal)),
            namespace: Some("prod".to_string()),
            labels: Some(BTreeMap::from([(
                "controller-revision-hash".to_string(),
                revision.to_string(),
            )])),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: SOLR_NODE_CONTAINER.to_string(),
                image: Some("solr:8.11".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }),
        status: Some(PodStatus {
            conditions: Some(vec![PodCondition {
                type_: "Ready".to_string(),
                status: if shape.ready { "True" } else { "False" }.to_string(),
                ..Default::default()
            }]),
            container_statuses: Some(vec![ContainerStatus {
                name: SOLR_NODE_CONTAINER.to_string(),
                started: shape.started,
                ..Default::default()
            }]),
            ..Default::default()
        }),
    }
}

proptest! {
    #[test]
    fn prop_classification_partitions_pod_set(shapes in prop::collection::vec(pod_shape(), 0..16)) {
        let cluster = cluster(shapes.len() as i32);
        let pods: Vec<Pod> = shapes.iter().map(build_pod).collect();
        let total = pods.len();

        let mut status = SolrClusterStatus::default();
        let sts_status = StatefulSetStatus {
            replicas: total as i32,
            ready_replicas: Some(shapes.iter().filter(|s| s.ready).count() as i32),
            update_revision: Some("rev-2".to_string()),
            ..Default::default()
        };
        let classification = aggregate_status(&cluster, pods, &mut status, &sts_status);

        // Disjoint partition covering every observed pod
        prop_assert_eq!(
            status.up_to_date_nodes as usize
                + classification.out_of_date.len()
                + classification.out_of_date_not_started.len(),
            total
        );

        // Available-updated pods are a subset of up-to-date pods
        prop_assert!(classification.available_updated_count <= status.up_to_date_nodes);

        // Node list stays name-sorted
        let names: Vec<_> = status.solr_nodes.iter().map(|n| n.name.clone()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        prop_assert_eq!(names, sorted);
    }

    #[test]
    fn prop_orphan_detection_matches_ordinal_rule(ordinal in 0i32..64, replicas in 1i32..32) {
        let name = format!("data-search-{}", ordinal);
        prop_assert_eq!(is_pvc_orphan(&name, replicas), ordinal >= replicas);
    }

    #[test]
    fn prop_update_selection_respects_budget(
        out_of_date_count in 0usize..12,
        ready in 0i32..12,
        max_unavailable in 1i32..6,
    ) {
        let total = 12i32;
        let ready = ready.min(total);
        let mut cluster = cluster(total);
        cluster.spec.update_strategy.managed = Some(ManagedUpdateOptions {
            max_pods_unavailable: Some(PodCount::Count(max_unavailable)),
        });

        let out_of_date: Vec<Pod> = (0..out_of_date_count)
            .map(|i| build_pod(&PodShape {
                ordinal: i,
                ready: true,
                up_to_date: false,
                started: Some(true),
            }))
            .collect();

        let (selected, retry) =
            determine_pods_safe_to_update(&cluster, &out_of_date, total, ready, 0, 0);

        let budget = (max_unavailable - (total - ready)).max(0) as usize;
        prop_assert!(selected.len() <= budget);
        prop_assert_eq!(retry, selected.len() < out_of_date.len());
    }
}
