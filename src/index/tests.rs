use super::*;

fn corpus() -> Vec<Vec<f32>> {
    vec![
        vec![0.0, 0.0],
        vec![1.0, 0.0],
        vec![0.0, 2.0],
        vec![3.0, 3.0],
        vec![-1.0, 0.0],
    ]
}

#[test]
fn build_records_shape() {
    let index = FlatIndex::build(&corpus()).expect("index should build");

    assert_eq!(index.dimension(), 2);
    assert_eq!(index.len(), 5);
    assert!(!index.is_empty());
    assert_eq!(index.vector(2), Some(&[0.0, 2.0][..]));
    assert_eq!(index.vector(5), None);
}

#[test]
fn build_rejects_empty_input() {
    assert_eq!(FlatIndex::build(&[]).unwrap_err(), IndexError::Empty);
}

#[test]
fn build_rejects_zero_dimension() {
    assert_eq!(
        FlatIndex::build(&[Vec::new()]).unwrap_err(),
        IndexError::ZeroDimension
    );
}

#[test]
fn build_rejects_ragged_vectors() {
    let err = FlatIndex::build(&[vec![1.0, 2.0], vec![1.0, 2.0], vec![1.0]]).unwrap_err();
    assert_eq!(
        err,
        IndexError::DimensionMismatch {
            position: 2,
            expected: 2,
            found: 1,
        }
    );
}

#[test]
fn search_returns_k_nearest_first() {
    let index = FlatIndex::build(&corpus()).expect("index should build");

    let neighbors = index.search(&[0.9, 0.1], 3).expect("search should succeed");

    let indices: Vec<usize> = neighbors.iter().map(|n| n.index).collect();
    assert_eq!(indices, vec![1, 0, 4]);
    assert!((neighbors[0].distance - 0.02).abs() < 1e-5);
    assert!((neighbors[1].distance - 0.82).abs() < 1e-5);
    assert!((neighbors[2].distance - 3.62).abs() < 1e-5);
}

#[test]
fn distances_are_non_decreasing() {
    let index = FlatIndex::build(&corpus()).expect("index should build");

    for query in [[0.0, 0.0], [2.5, 2.0], [-3.0, 1.0], [0.5, 1.5]] {
        let neighbors = index.search(&query, 5).expect("search should succeed");
        assert_eq!(neighbors.len(), 5);
        assert!(
            neighbors
                .windows(2)
                .all(|pair| pair[0].distance <= pair[1].distance)
        );
    }
}

#[test]
fn k_larger_than_corpus_returns_every_vector_once() {
    let index = FlatIndex::build(&corpus()).expect("index should build");

    let neighbors = index.search(&[0.0, 0.0], 50).expect("search should succeed");

    assert_eq!(neighbors.len(), 5);
    let mut indices: Vec<usize> = neighbors.iter().map(|n| n.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
}

#[test]
fn k_zero_returns_nothing() {
    let index = FlatIndex::build(&corpus()).expect("index should build");
    assert!(index.search(&[0.0, 0.0], 0).expect("search").is_empty());
}

#[test]
fn ties_prefer_lower_index() {
    let index = FlatIndex::build(&[vec![1.0], vec![-1.0], vec![1.0], vec![5.0]])
        .expect("index should build");

    let neighbors = index.search(&[0.0], 3).expect("search should succeed");

    let indices: Vec<usize> = neighbors.iter().map(|n| n.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn exact_match_has_zero_distance() {
    let index = FlatIndex::build(&corpus()).expect("index should build");

    let neighbors = index.search(&[3.0, 3.0], 1).expect("search should succeed");

    assert_eq!(
        neighbors,
        vec![Neighbor {
            index: 3,
            distance: 0.0
        }]
    );
}

#[test]
fn query_dimension_must_match() {
    let index = FlatIndex::build(&corpus()).expect("index should build");

    assert_eq!(
        index.search(&[1.0, 2.0, 3.0], 2).unwrap_err(),
        IndexError::QueryDimension {
            expected: 2,
            found: 3
        }
    );
}
