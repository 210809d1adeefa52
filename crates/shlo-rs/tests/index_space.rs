use shlo_rs::backend::spec::SpecErrorCode;
use shlo_rs::ops::{Coordinate, IndexSpace, MAX_RANK};

fn coords(dims: &[usize]) -> Vec<Vec<usize>> {
    IndexSpace::new(dims)
        .unwrap()
        .iter()
        .map(|c: Coordinate| c.to_vec())
        .collect()
}

#[test]
fn yields_row_major_order_last_axis_fastest() {
    assert_eq!(
        coords(&[2, 3]),
        vec![
            vec![0, 0],
            vec![0, 1],
            vec![0, 2],
            vec![1, 0],
            vec![1, 1],
            vec![1, 2],
        ]
    );
}

#[test]
fn enumeration_is_restartable() {
    let space = IndexSpace::new(&[2, 2]).unwrap();
    let first: Vec<_> = space.iter().collect();
    let second: Vec<_> = space.iter().collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), space.num_coordinates());
}

#[test]
fn scalar_space_yields_one_empty_coordinate() {
    let all = coords(&[]);
    assert_eq!(all, vec![Vec::<usize>::new()]);
}

#[test]
fn zero_extent_axis_yields_nothing() {
    assert!(coords(&[2, 0, 3]).is_empty());
    assert_eq!(IndexSpace::new(&[2, 0, 3]).unwrap().num_coordinates(), 0);
}

#[test]
fn full_rank_ceiling_is_supported() {
    let space = IndexSpace::new(&[1; MAX_RANK]).unwrap();
    assert_eq!(space.iter().count(), 1);
}

#[test]
fn rejects_rank_above_ceiling() {
    let err = IndexSpace::new(&[1; MAX_RANK + 1]).unwrap_err();
    assert_eq!(err.code, SpecErrorCode::RankCeilingExceeded);
}
