//! Storage orphan detection tests

use solr_operator::controller::is_pvc_orphan;

#[test]
fn test_orphan_boundary_at_replica_count() {
    // For replica count R, a claim is orphaned iff its ordinal >= R
    for replicas in 1..6 {
        for ordinal in 0..10 {
            let name = format!("data-search-{}", ordinal);
            assert_eq!(
                is_pvc_orphan(&name, replicas),
                ordinal >= replicas,
                "replicas={} ordinal={}",
                replicas,
                ordinal
            );
        }
    }
}

#[test]
fn test_scale_down_marks_tail_claims() {
    let claims: Vec<String> = (0..5).map(|i| format!("data-search-{}", i)).collect();
    let orphaned: Vec<_> = claims
        .iter()
        .filter(|name| is_pvc_orphan(name, 3))
        .collect();
    assert_eq!(orphaned, vec!["data-search-3", "data-search-4"]);
}
