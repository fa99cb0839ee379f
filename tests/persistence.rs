//! Save/load round-trip tests for the textual index format.
//!
//! Run with: cargo test

use std::io::Write;

use tupelo::dataset::random_vectors;
use tupelo::{EuclideanSpace, IndexParams, InvProcAlg, NappHorderIndex, QueryParams, TupeloError};

fn build_small_index() -> (NappHorderIndex<EuclideanSpace>, Vec<Vec<f32>>) {
    let data = random_vectors(200, 5, 17);
    let params = IndexParams {
        num_pivot: 12,
        num_prefix: 6,
        pivot_comb_qty: 2,
        skip_val: 2,
        pivot_seed: Some(23),
        ..Default::default()
    };
    let index = NappHorderIndex::build(EuclideanSpace, data.clone(), params).unwrap();
    (index, data)
}

#[test]
fn test_round_trip_preserves_postings() {
    let (index, data) = build_small_index();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.txt");

    index.save(&path).unwrap();
    let loaded = NappHorderIndex::load(EuclideanSpace, data, &path).unwrap();

    assert_eq!(index.num_posting_lists(), loaded.num_posting_lists());
    for posting_id in 0..index.num_posting_lists() {
        assert_eq!(
            index.posting_list(posting_id as u32),
            loaded.posting_list(posting_id as u32),
            "posting list {} differs after round trip",
            posting_id
        );
    }
    assert_eq!(
        index.pivots().positions().unwrap(),
        loaded.pivots().positions().unwrap()
    );
}

#[test]
fn test_round_trip_preserves_candidates() {
    let (mut index, data) = build_small_index();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.txt");
    index.save(&path).unwrap();

    let mut loaded = NappHorderIndex::load(EuclideanSpace, data, &path).unwrap();
    let queries = random_vectors(25, 5, 18);

    for alg in [
        InvProcAlg::Scan,
        InvProcAlg::StoreSort,
        InvProcAlg::Merge,
        InvProcAlg::PriorityQueue,
    ] {
        let qp = QueryParams {
            min_times: 1,
            inv_proc_alg: alg,
            ..Default::default()
        };
        index.set_query_time_params(qp.clone()).unwrap();
        loaded.set_query_time_params(qp).unwrap();

        for query in &queries {
            assert_eq!(
                index.candidates(query).unwrap(),
                loaded.candidates(query).unwrap()
            );
            let a: Vec<_> = index
                .search_knn(query, 5)
                .unwrap()
                .iter()
                .map(|r| r.id)
                .collect();
            let b: Vec<_> = loaded
                .search_knn(query, 5)
                .unwrap()
                .iter()
                .map(|r| r.id)
                .collect();
            assert_eq!(a, b);
        }
    }
}

#[test]
fn test_load_rejects_wrong_dataset_size() {
    let (index, data) = build_small_index();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.txt");
    index.save(&path).unwrap();

    let truncated = data[..150].to_vec();
    let err = NappHorderIndex::load(EuclideanSpace, truncated, &path).unwrap_err();
    assert!(matches!(err, TupeloError::DataMismatch(_)));
}

#[test]
fn test_load_rejects_tampered_line_count() {
    let (index, data) = build_small_index();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.txt");
    index.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let tampered = text.replace("lineQty=", "lineQty=9");
    std::fs::write(&path, tampered).unwrap();

    let err = NappHorderIndex::load(EuclideanSpace, data, &path).unwrap_err();
    assert!(matches!(err, TupeloError::DataMismatch(_)));
}

#[test]
fn test_load_rejects_foreign_method() {
    let data = random_vectors(10, 2, 1);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.txt");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "methodDesc=some_other_method").unwrap();

    let err = NappHorderIndex::load(EuclideanSpace, data, &path).unwrap_err();
    assert!(matches!(err, TupeloError::DataMismatch(_)));
}

#[test]
fn test_load_rejects_truncated_file() {
    let (index, data) = build_small_index();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("index.txt");
    index.save(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let keep: Vec<&str> = text.lines().take(6).collect();
    std::fs::write(&path, keep.join("\n")).unwrap();

    let err = NappHorderIndex::load(EuclideanSpace, data, &path).unwrap_err();
    assert!(matches!(err, TupeloError::InvalidFormat(_)));
}
