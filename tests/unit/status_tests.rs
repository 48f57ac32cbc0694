//! Status aggregation and pod classification tests

use solr_operator::controller::aggregate_status;
use solr_operator::crd::SolrClusterStatus;

use crate::fixtures::{cluster, cluster_with_backup, sts_status, PodBuilder};

#[test]
fn test_counts_come_from_statefulset_status() {
    let cluster = cluster(3);
    let pods = vec![
        PodBuilder::new("search-0").build(),
        PodBuilder::new("search-1").build(),
        PodBuilder::new("search-2").ready(false).build(),
    ];
    let mut status = SolrClusterStatus::default();
    aggregate_status(&cluster, pods, &mut status, &sts_status(3, 2, "rev-2"));

    // Replica accounting mirrors the platform's own bookkeeping, not a
    // recount of the pod list
    assert_eq!(status.replicas, 3);
    assert_eq!(status.ready_replicas, 2);
    assert_eq!(status.up_to_date_nodes, 3);
}

#[test]
fn test_node_statuses_sorted_by_name() {
    let cluster = cluster(3);
    let pods = vec![
        PodBuilder::new("search-2").build(),
        PodBuilder::new("search-0").build(),
        PodBuilder::new("search-1").build(),
    ];
    let mut status = SolrClusterStatus::default();
    aggregate_status(&cluster, pods, &mut status, &sts_status(3, 3, "rev-2"));

    let names: Vec<_> = status.solr_nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["search-0", "search-1", "search-2"]);
}

#[test]
fn test_status_structurally_equal_regardless_of_pod_order() {
    let cluster = cluster(3);
    let build = || {
        vec![
            PodBuilder::new("search-0").build(),
            PodBuilder::new("search-1").ready(false).build(),
            PodBuilder::new("search-2").image("solr:8.9").build(),
        ]
    };
    let forward = build();
    let mut reversed = build();
    reversed.reverse();

    let mut status_a = SolrClusterStatus::default();
    aggregate_status(&cluster, forward, &mut status_a, &sts_status(3, 2, "rev-2"));
    let mut status_b = SolrClusterStatus::default();
    aggregate_status(&cluster, reversed, &mut status_b, &sts_status(3, 2, "rev-2"));

    // Differently ordered observations converge to the same status, so the
    // write-back comparison sees no change
    assert_eq!(status_a, status_b);
}

#[test]
fn test_partition_of_out_of_date_pods() {
    let cluster = cluster(5);
    let pods = vec![
        PodBuilder::new("search-0").build(),
        PodBuilder::new("search-1").build(),
        PodBuilder::new("search-2")
            .revision("rev-1")
            .ready(false)
            .started(Some(false))
            .build(),
        PodBuilder::new("search-3").revision("rev-1").build(),
        PodBuilder::new("search-4").revision("rev-1").build(),
    ];
    let total = pods.len();
    let mut status = SolrClusterStatus::default();
    let classification =
        aggregate_status(&cluster, pods, &mut status, &sts_status(5, 4, "rev-2"));

    // up-to-date + out-of-date = total, and out-of-date pods split
    // disjointly into started and not-started
    assert_eq!(
        status.up_to_date_nodes as usize
            + classification.out_of_date.len()
            + classification.out_of_date_not_started.len(),
        total
    );
    assert_eq!(classification.out_of_date_not_started.len(), 1);
    assert_eq!(classification.out_of_date.len(), 2);
    assert_eq!(classification.available_updated_count, 2);
}

#[test]
fn test_ready_out_of_date_pod_counts_as_started() {
    let cluster = cluster(2);
    let pods = vec![
        PodBuilder::new("search-0").build(),
        // Ready but missing a container status: readiness implies started
        PodBuilder::new("search-1")
            .revision("rev-1")
            .started(None)
            .build(),
    ];
    let mut status = SolrClusterStatus::default();
    let classification =
        aggregate_status(&cluster, pods, &mut status, &sts_status(2, 2, "rev-2"));
    assert_eq!(classification.out_of_date.len(), 1);
    assert!(classification.out_of_date_not_started.is_empty());
}

#[test]
fn test_unready_pod_without_container_status_is_not_started() {
    let cluster = cluster(2);
    let pods = vec![
        PodBuilder::new("search-0").build(),
        PodBuilder::new("search-1")
            .revision("rev-1")
            .ready(false)
            .started(None)
            .build(),
    ];
    let mut status = SolrClusterStatus::default();
    let classification =
        aggregate_status(&cluster, pods, &mut status, &sts_status(2, 1, "rev-2"));
    assert_eq!(classification.out_of_date_not_started.len(), 1);
}

#[test]
fn test_rollout_exposes_first_other_version_in_name_order() {
    let cluster = cluster(3);
    let pods = vec![
        PodBuilder::new("search-2").image("solr:8.10").build(),
        PodBuilder::new("search-0").build(),
        PodBuilder::new("search-1").image("solr:8.9").build(),
    ];
    let mut status = SolrClusterStatus::default();
    aggregate_status(&cluster, pods, &mut status, &sts_status(3, 3, "rev-2"));

    // The first differing version in name order stands in for "the" running
    // version; search-1 sorts before search-2
    assert_eq!(status.version, "8.9");
    assert_eq!(status.target_version, "8.11");
}

#[test]
fn test_no_rollout_clears_target_version() {
    let cluster = cluster(2);
    let pods = vec![
        PodBuilder::new("search-0").build(),
        PodBuilder::new("search-1").build(),
    ];
    let mut status = SolrClusterStatus::default();
    aggregate_status(&cluster, pods, &mut status, &sts_status(2, 2, "rev-2"));
    assert_eq!(status.version, "8.11");
    assert_eq!(status.target_version, "");
}

#[test]
fn test_backup_ready_requires_every_desired_replica() {
    let cluster = cluster_with_backup(3);

    // Only two live pods carry the volume; the third desired replica is
    // missing entirely, so backup is not ready
    let pods = vec![
        PodBuilder::new("search-0").with_backup_volume().build(),
        PodBuilder::new("search-1").with_backup_volume().build(),
    ];
    let mut status = SolrClusterStatus::default();
    aggregate_status(&cluster, pods, &mut status, &sts_status(3, 2, "rev-2"));
    assert!(!status.backup_restore_ready);

    let pods = vec![
        PodBuilder::new("search-0").with_backup_volume().build(),
        PodBuilder::new("search-1").with_backup_volume().build(),
        PodBuilder::new("search-2").with_backup_volume().build(),
    ];
    let mut status = SolrClusterStatus::default();
    aggregate_status(&cluster, pods, &mut status, &sts_status(3, 3, "rev-2"));
    assert!(status.backup_restore_ready);
}

#[test]
fn test_internal_addresses_on_every_node() {
    let cluster = cluster(1);
    let pods = vec![PodBuilder::new("search-0").build()];
    let mut status = SolrClusterStatus::default();
    aggregate_status(&cluster, pods, &mut status, &sts_status(1, 1, "rev-2"));

    assert_eq!(
        status.solr_nodes[0].internal_address,
        "http://search-0.search-headless.prod:8983"
    );
    assert!(status.solr_nodes[0].external_address.is_none());
    assert_eq!(
        status.internal_common_address,
        "http://search-common.prod:80"
    );
    assert!(status.external_common_address.is_none());
}
