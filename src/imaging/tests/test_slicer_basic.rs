use crate::geom::{Point3, PolylineSet, Tolerance, Vec3};
use crate::imaging::{
    ImageSlice, PlaneOutput, ResampleError, ResliceAxes, ResliceError, SliceGeometry, SliceStage,
    SlicerConfig, SlicerError, SplineDrivenSlicer, TargetSelector, TrilinearProbe, Volume,
    VolumeResampler,
};

fn ramp(p: Point3) -> f64 {
    p.x - 0.5 * p.y + 2.0 * p.z
}

fn ramp_volume() -> Volume {
    Volume::from_fn([12, 12, 12], Point3::ORIGIN, Vec3::new(1.0, 1.0, 1.0), ramp).unwrap()
}

/// Straight path along +Z through the middle of the volume.
fn vertical_path() -> PolylineSet {
    PolylineSet::from_points((2..10).map(|z| Point3::new(5.5, 5.5, f64::from(z))).collect())
}

fn small_config() -> SlicerConfig {
    SlicerConfig::new().with_extent(4, 4)
}

#[test]
fn stack_receives_previous_image_each_call() {
    let volume = ramp_volume();
    let path = vertical_path();
    let mut slicer = SplineDrivenSlicer::new(small_config()).unwrap();
    assert!(slicer.current_image().is_empty());

    let outputs: Vec<_> = [0, 3, 1, 6, 2]
        .into_iter()
        .map(|offset| slicer.slice(&volume, &path, TargetSelector::new(0, offset)).unwrap())
        .collect();

    let stack = slicer.stack();
    assert_eq!(stack.len(), outputs.len());
    assert!(stack.get(0).unwrap().is_empty());
    for n in 1..outputs.len() {
        assert_eq!(stack.get(n), Some(&outputs[n - 1].image), "stack entry {n}");
    }
    assert_eq!(slicer.current_image(), &outputs[4].image);

    // Distinct offsets give distinct slices, so the ordering check is meaningful.
    assert_ne!(outputs[0].image, outputs[1].image);
}

#[test]
fn slice_follows_frame_at_selected_point() {
    let volume = ramp_volume();
    let path = vertical_path();
    let mut slicer = SplineDrivenSlicer::new(small_config()).unwrap();

    let output = slicer.slice(&volume, &path, TargetSelector::new(0, 2)).unwrap();
    assert_eq!(output.point, 2);
    assert_eq!(output.center, Point3::new(5.5, 5.5, 4.0));

    let tol = Tolerance::default_geom();
    assert!(tol.approx_eq_vec3(output.triad.tangent, Vec3::Z));
    assert!(tol.approx_eq_vec3(output.triad.normal, Vec3::Y));
    assert!(tol.approx_eq_vec3(output.triad.binormal, Vec3::new(-1.0, 0.0, 0.0)));

    let PlaneOutput::Geometry(plane) = output.plane else {
        panic!("probe mode is off");
    };
    assert!(tol.approx_eq_point3(plane.origin, Point3::new(7.5, 3.5, 4.0)));
    assert!(tol.approx_eq_point3(plane.point1, Point3::new(3.5, 3.5, 4.0)));
    assert!(tol.approx_eq_point3(plane.point2, Point3::new(7.5, 7.5, 4.0)));
    assert_eq!(plane.resolution, [4, 4]);

    let m = output.axes.to_matrix();
    assert!(tol.approx_eq_vec3(Vec3::new(m[0][0], m[0][1], m[0][2]), output.triad.binormal));
    assert!(tol.approx_eq_vec3(Vec3::new(m[2][0], m[2][1], m[2][2]), output.triad.tangent));

    let image = &output.image;
    assert_eq!(image.extent(), [4, 4]);
    assert_eq!(image.spacing(), [1.0, 1.0]);
    assert_eq!(image.origin(), Point3::ORIGIN);
    assert_eq!(image.name(), "ReslicedImage");
    for j in 0..4_u32 {
        for i in 0..4_u32 {
            let world = Point3::new(7.5 - f64::from(i), 3.5 + f64::from(j), 4.0);
            let value = image.value(i as usize, j as usize).unwrap();
            assert!((value - ramp(world)).abs() < 1e-9, "({i}, {j}): {value}");
        }
    }
}

#[test]
fn point_offset_is_clamped_to_last_point() {
    let volume = ramp_volume();
    let path = vertical_path();
    let mut slicer = SplineDrivenSlicer::new(small_config()).unwrap();

    let output = slicer.slice(&volume, &path, TargetSelector::new(0, 100)).unwrap();
    assert_eq!(output.point, 7);
    assert_eq!(output.center, Point3::new(5.5, 5.5, 9.0));
}

#[test]
fn invalid_cell_is_reported_without_touching_state() {
    let volume = ramp_volume();
    let path = vertical_path();
    let mut slicer = SplineDrivenSlicer::new(small_config()).unwrap();
    slicer.slice(&volume, &path, TargetSelector::new(0, 0)).unwrap();
    let current = slicer.current_image().clone();

    let err = slicer.slice(&volume, &path, TargetSelector::new(3, 0)).unwrap_err();
    assert_eq!(
        err,
        SlicerError::InvalidCell {
            cell_index: 3,
            cell_count: 1
        }
    );
    assert_eq!(err.stage(), SliceStage::TargetResolution);
    assert_eq!(slicer.stack().len(), 1);
    assert_eq!(slicer.current_image(), &current);
}

#[test]
fn degenerate_path_reports_frame_stage() {
    let volume = ramp_volume();
    let path = PolylineSet::from_points(vec![
        Point3::new(5.0, 5.0, 5.0),
        Point3::new(5.0, 5.0, 6.0),
        Point3::new(5.0, 5.0, 5.0),
    ]);
    let mut slicer = SplineDrivenSlicer::new(small_config()).unwrap();

    let err = slicer.slice(&volume, &path, TargetSelector::new(0, 0)).unwrap_err();
    assert_eq!(err.stage(), SliceStage::FrameComputation);
    assert!(slicer.stack().is_empty());
    assert!(slicer.current_image().is_empty());
}

#[derive(Debug)]
struct FailingResampler;

impl VolumeResampler for FailingResampler {
    fn reslice(
        &self,
        _volume: &Volume,
        _axes: &ResliceAxes,
        geometry: SliceGeometry,
    ) -> Result<ImageSlice, ResampleError> {
        Err(ResampleError::RasterTooLarge {
            extent: geometry.extent,
        })
    }
}

#[test]
fn resampler_failure_reports_resampling_stage() {
    let volume = ramp_volume();
    let path = vertical_path();
    let mut slicer =
        SplineDrivenSlicer::with_primitives(small_config(), FailingResampler, TrilinearProbe)
            .unwrap();

    let err = slicer.slice(&volume, &path, TargetSelector::new(0, 1)).unwrap_err();
    assert_eq!(err.stage(), SliceStage::Resampling);
    assert!(slicer.stack().is_empty());
}

#[test]
fn transform_errors_map_to_transform_stage() {
    let err = SlicerError::from(ResliceError::NonFiniteCorner);
    assert_eq!(err.stage(), SliceStage::TransformConstruction);
}

#[test]
fn probe_mode_returns_grid_vertex_samples() {
    let volume = ramp_volume();
    let path = vertical_path();
    let config = SlicerConfig::new().with_extent(3, 2).with_probe_input(true);
    let mut slicer = SplineDrivenSlicer::new(config).unwrap();

    let output = slicer.slice(&volume, &path, TargetSelector::new(0, 3)).unwrap();
    let probed = output.plane.probed().expect("probe mode is on");
    assert_eq!(probed.values.len(), (3 + 1) * (2 + 1));
    assert_eq!(probed.valid_count(), 12);

    for (point, value) in probed.plane.grid_points().iter().zip(&probed.values) {
        assert!((value - ramp(*point)).abs() < 1e-9);
    }
    // The resliced image is produced in probe mode as well.
    assert_eq!(output.image.extent(), [3, 2]);
}

#[test]
fn sweep_builds_full_stack() {
    let volume = ramp_volume();
    let path = vertical_path();
    let mut slicer = SplineDrivenSlicer::new(small_config().with_thickness(2.0)).unwrap();

    let outputs = slicer.sweep(&volume, &path, 0).unwrap();
    assert_eq!(outputs.len(), 8);
    assert_eq!(slicer.stack().len(), 8);

    let stitched = slicer.stack().to_volume().unwrap();
    assert_eq!(stitched.dimensions(), [4, 4, 7]);
    assert_eq!(stitched.spacing(), Vec3::new(1.0, 1.0, 2.0));
    assert_eq!(stitched.value(0, 0, 6), outputs[6].image.value(0, 0));

    slicer.reset_stack();
    assert!(slicer.stack().is_empty());
    assert!(slicer.current_image().is_empty());

    assert!(matches!(
        slicer.sweep(&volume, &path, 1),
        Err(SlicerError::InvalidCell { cell_index: 1, .. })
    ));
}

#[test]
fn config_loads_from_json_with_defaults() {
    let config: SlicerConfig =
        serde_json::from_str(r#"{ "slice_extent": [8, 6], "probe_input": true }"#).unwrap();
    assert_eq!(config.slice_extent, [8, 6]);
    assert!(config.probe_input);
    assert_eq!(config.slice_spacing, [1.0, 1.0]);
    assert_eq!(config.slice_thickness, 1.0);
    assert!(config.consistent_normals);

    let bad: SlicerConfig = serde_json::from_str(r#"{ "slice_spacing": [0.0, 1.0] }"#).unwrap();
    let err = SplineDrivenSlicer::new(bad).unwrap_err();
    assert_eq!(err.stage(), SliceStage::Configuration);
}
