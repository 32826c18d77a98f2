use crate::geom::{FrenetOptions, Point3, PolylineError, PolylineSet, compute_frenet_frames};

/// Two branches sharing the junction point 2.
fn branching() -> PolylineSet {
    let mut set = PolylineSet::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
            Point3::new(3.0, -1.0, 0.0),
        ],
        vec![vec![0, 1, 2]],
    );
    assert_eq!(set.push_cell(vec![2, 3]), 1);
    assert_eq!(set.push_cell(vec![2, 4]), 2);
    set
}

#[test]
fn branching_set_shares_junction_between_cells() {
    let set = branching();
    assert!(set.validate().is_ok());
    assert_eq!(set.cell_count(), 3);
    assert_eq!(set.point_count(), 5);

    let junction_uses = set.cells().iter().filter(|cell| cell.contains(&2)).count();
    assert_eq!(junction_uses, 3);
    assert_eq!(set.point(2), Some(Point3::new(2.0, 0.0, 0.0)));
}

#[test]
fn accessors_return_none_past_the_end() {
    let set = branching();
    assert_eq!(set.cell(2), Some(&[2, 4][..]));
    assert!(set.cell(3).is_none());
    assert!(set.point(5).is_none());
}

#[test]
fn first_violation_in_cell_order_is_reported() {
    let mut set = branching();
    set.push_cell(vec![4]);
    set.push_cell(vec![0, 99]);

    assert_eq!(
        set.validate(),
        Err(PolylineError::InsufficientPoints { cell: 3, count: 1 })
    );
}

#[test]
fn empty_set_is_valid_and_yields_no_frames() {
    let set = PolylineSet::default();
    assert!(set.validate().is_ok());

    let (frames, diag) = compute_frenet_frames(&set, FrenetOptions::default()).expect("frames");
    assert!(frames.is_empty());
    assert_eq!(diag.cell_count, 0);
    assert_eq!(diag.computed_point_count, 0);
}

#[test]
fn non_finite_point_outside_any_cell_is_ignored() {
    let set = PolylineSet::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(f64::NAN, 0.0, 0.0),
        ],
        vec![vec![0, 1]],
    );
    assert!(set.validate().is_ok());

    let (frames, _) = compute_frenet_frames(&set, FrenetOptions::default()).expect("frames");
    assert!(frames.is_computed(1));
    assert!(!frames.is_computed(2));
}
