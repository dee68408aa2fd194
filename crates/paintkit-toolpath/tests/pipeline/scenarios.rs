use crate::common::{assert_pen_discipline, seeded_config, square};
use paintkit_core::{ColorId, MotionPrimitive, Palette, Point, Rect};
use paintkit_settings::{FillSettings, TravelSettings};
use paintkit_toolpath::fill::{scan_lines, FillAlgorithm, FillJobContext};
use paintkit_toolpath::{
    resolve_occlusion, ArtPath, GeometryAdapter, JobRunner, JobState, PathRole, PlotPath,
    TravelOptimizer, VectorGeometry, WorkLayer, JOB_COMPLETE_CALLBACK,
};
use std::rc::Rc;

fn fill_square(fill_type: &str, angle: f64) -> Vec<PlotPath> {
    let mut ctx = FillJobContext::new(
        FillSettings {
            fill_type: fill_type.to_string(),
            fill_angle: angle,
            fill_spacing: 10.0,
            ..FillSettings::default()
        },
        Rect::new(0.0, 0.0, 500.0, 500.0),
        Rc::new(VectorGeometry::new()),
        Some(3),
    );
    let id = ctx.layer.insert(
        ArtPath::polygon("square", square(100.0, 100.0, 100.0)).with_fill(ColorId::Palette(2)),
    );
    let mut fill = FillAlgorithm::setup(&ctx).unwrap();
    let mut steps = 0;
    while !fill.step(&mut ctx, id).unwrap().is_done() {
        steps += 1;
        assert!(steps < 10_000);
    }
    ctx.take_output()
}

#[test]
fn test_zigzag_square_candidate_lines() {
    let bounds = Rect::new(100.0, 100.0, 100.0, 100.0);
    let diagonal = 100.0 * std::f64::consts::SQRT_2;
    let expected = (diagonal / 10.0).ceil() as usize;
    assert_eq!(scan_lines(&bounds, 45.0, 10.0).len(), expected);
    assert_eq!(scan_lines(&bounds, 30.0, 10.0).len(), expected);

    let target = ArtPath::polygon("square", square(100.0, 100.0, 100.0));
    let geometry = VectorGeometry::new();
    for (a, b) in scan_lines(&bounds, 30.0, 10.0) {
        let probe = ArtPath::polyline("probe", vec![a, b]);
        assert_eq!(geometry.intersections(&probe, &target).len(), 2);
    }
}

#[test]
fn test_zigzag_square_joins_into_at_most_two_paths() {
    let straight = fill_square("line-straight", 30.0);
    assert_eq!(straight.len(), 15);
    assert!(straight.iter().all(|p| p.points.len() == 2));

    let zigzag = fill_square("line-zigzag", 45.0);
    assert!(!zigzag.is_empty() && zigzag.len() <= 2, "got {} paths", zigzag.len());
    for path in &zigzag {
        assert_eq!(path.color, ColorId::Palette(2));
        assert_eq!(path.role, PathRole::Fill);
    }
}

#[test]
fn test_overlapping_squares_occlusion() {
    let geometry = VectorGeometry::new();
    let mut layer = WorkLayer::new("fill");
    let bottom = layer.insert(
        ArtPath::polygon("bottom", square(0.0, 0.0, 100.0)).with_fill(ColorId::Palette(1)),
    );
    let top = layer.insert(
        ArtPath::polygon("top", square(50.0, 50.0, 100.0)).with_fill(ColorId::Palette(2)),
    );

    assert_eq!(resolve_occlusion(&geometry, &mut layer), 0);
    let bottom = layer.get(bottom).unwrap();
    let top = layer.get(top).unwrap();
    assert!((bottom.area() - (10_000.0 - 2_500.0)).abs() < 1.0);
    assert!((top.area() - 10_000.0).abs() < 1e-6);
    assert_eq!(bottom.fill, ColorId::Palette(1));
}

#[test]
fn test_cancel_mid_job_parks() {
    let mut runner = JobRunner::new(seeded_config());
    runner
        .start(vec![
            ArtPath::polygon("a", square(10.0, 10.0, 80.0)).with_fill(ColorId::Palette(1)),
            ArtPath::polygon("b", square(200.0, 10.0, 80.0)).with_stroke(ColorId::Palette(5), 1.0),
        ])
        .unwrap();

    while runner.state() != JobState::Emitting {
        runner.step().unwrap();
    }
    // Emits the first of at least two plot paths.
    runner.step().unwrap();
    assert_eq!(runner.state(), JobState::Emitting);
    let mut stream = Vec::new();
    runner.buffer_mut().dispatch(&mut stream, Some(5)).unwrap();
    let sent_before_cancel = stream.len();

    assert!(runner.cancel());
    assert_eq!(runner.state(), JobState::Idle);
    runner.buffer_mut().dispatch(&mut stream, None).unwrap();

    let after = &stream[sent_before_cancel..];
    assert_eq!(after, &[MotionPrimitive::Up, MotionPrimitive::Park]);
    assert!(!stream
        .iter()
        .any(|c| *c == MotionPrimitive::callback(JOB_COMPLETE_CALLBACK)));
}

#[test]
fn test_travel_groups_colors() {
    let palette = Palette::default();
    let red = ColorId::Palette(1);
    let blue = ColorId::Palette(5);
    let line = |name: &str, color, x: f64| {
        PlotPath::new(name, PathRole::Stroke, color, vec![Point::new(x, 0.0), Point::new(x, 50.0)])
    };
    let paths = vec![line("r1", red, 0.0), line("b", blue, 10.0), line("r2", red, 20.0)];

    let mut optimizer = TravelOptimizer::new(&TravelSettings::default());
    let ordered = optimizer.optimize(paths, &palette);
    let colors: Vec<ColorId> = ordered.iter().map(|p| p.color).collect();

    let expected = if palette.paint_rank(red) < palette.paint_rank(blue) {
        vec![red, red, blue]
    } else {
        vec![blue, red, red]
    };
    assert_eq!(colors, expected);
}

#[test]
fn test_full_job_keeps_pen_discipline() {
    let stream = crate::common::run_job(
        seeded_config(),
        vec![
            ArtPath::polygon("sky", square(0.0, 0.0, 200.0)).with_fill(ColorId::Palette(5)),
            ArtPath::polygon("sun", square(120.0, 20.0, 50.0))
                .with_fill(ColorId::Palette(3))
                .with_stroke(ColorId::Palette(2), 2.0),
        ],
    );
    assert_pen_discipline(&stream);
    assert_eq!(stream.last(), Some(&MotionPrimitive::callback(JOB_COMPLETE_CALLBACK)));
    assert_eq!(stream[stream.len() - 2], MotionPrimitive::Park);
}
