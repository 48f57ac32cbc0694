//! Managed rolling-update selection tests

use kube::ResourceExt;

use solr_operator::controller::{aggregate_status, determine_pods_safe_to_update};
use solr_operator::crd::{ManagedUpdateOptions, PodCount, SolrClusterStatus};

use crate::fixtures::{cluster, sts_status, PodBuilder};

/// 5 replicas, 2 out-of-date-and-started, 1 out-of-date-not-started,
/// 4 ready. The not-started pod is always terminated; the bound decides how
/// many of the started ones follow.
#[test]
fn test_managed_update_scenario_five_replicas() {
    for (max_unavailable, expected_additional) in [(1, 0), (2, 1), (3, 2)] {
        let mut cluster = cluster(5);
        cluster.spec.update_strategy.managed = Some(ManagedUpdateOptions {
            max_pods_unavailable: Some(PodCount::Count(max_unavailable)),
        });

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
        let mut status = SolrClusterStatus::default();
        let classification =
            aggregate_status(&cluster, pods, &mut status, &sts_status(5, 4, "rev-2"));

        // The not-started pod is selected unconditionally
        assert_eq!(classification.out_of_date_not_started.len(), 1);
        assert_eq!(
            classification.out_of_date_not_started[0].name_any(),
            "search-2"
        );

        let (additional, _) = determine_pods_safe_to_update(
            &cluster,
            &classification.out_of_date,
            5,
            status.ready_replicas,
            classification.available_updated_count,
            classification.out_of_date_not_started.len(),
        );
        assert_eq!(
            additional.len(),
            expected_additional,
            "maxPodsUnavailable={}",
            max_unavailable
        );
    }
}

#[test]
fn test_selection_prefers_highest_ordinals() {
    let mut cluster = cluster(5);
    cluster.spec.update_strategy.managed = Some(ManagedUpdateOptions {
        max_pods_unavailable: Some(PodCount::Count(2)),
    });

    let out_of_date = vec![
        PodBuilder::new("search-1").revision("rev-1").build(),
        PodBuilder::new("search-4").revision("rev-1").build(),
        PodBuilder::new("search-3").revision("rev-1").build(),
    ];
    let (selected, retry) = determine_pods_safe_to_update(&cluster, &out_of_date, 5, 5, 2, 0);
    assert_eq!(selected.len(), 2);
    assert_eq!(selected[0].name_any(), "search-4");
    assert_eq!(selected[1].name_any(), "search-3");
    assert!(retry);
}

#[test]
fn test_percent_bound_scales_with_replicas() {
    let mut cluster = cluster(8);
    cluster.spec.update_strategy.managed = Some(ManagedUpdateOptions {
        max_pods_unavailable: Some(PodCount::Percent("50%".to_string())),
    });

    let out_of_date: Vec<_> = (0..8)
        .map(|i| {
            PodBuilder::new(&format!("search-{}", i))
                .revision("rev-1")
                .build()
        })
        .collect();
    let (selected, retry) = determine_pods_safe_to_update(&cluster, &out_of_date, 8, 8, 0, 0);
    assert_eq!(selected.len(), 4);
    assert!(retry);
}

#[test]
fn test_fully_ready_cluster_with_no_out_of_date_pods() {
    let cluster = cluster(3);
    let (selected, retry) = determine_pods_safe_to_update(&cluster, &[], 3, 3, 3, 0);
    assert!(selected.is_empty());
    assert!(!retry);
}
