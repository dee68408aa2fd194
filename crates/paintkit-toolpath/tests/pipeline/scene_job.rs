use crate::common::{assert_pen_discipline, seeded_config};
use paintkit_core::{MotionPrimitive, ToolId};
use paintkit_settings::MediaMode;
use paintkit_toolpath::{JobRunner, JobState, SceneDocument, Scheduler};
use std::io::Write;

const SCENE: &str = r##"{
    "canvas": { "width": 600, "height": 400, "margin": 5 },
    "items": [
        { "name": "field", "d": "M20 200 H400 V380 H20 Z", "fill": "#01a638" },
        {
            "name": "pond",
            "d": "M100 250 h120 v80 h-120 z",
            "fill": "#0066ff",
            "stroke": "#1b1b1b"
        },
        {
            "name": "mist",
            "d": "M20 20 L300 20 L300 120 L20 120 Z",
            "fill": "#ffffff",
            "opacity": 0.4
        },
        {
            "name": "sun",
            "d": "M450 100 a50 50 0 1 0 100 0 a50 50 0 1 0 -100 0 z",
            "stroke": "#1b1b1b"
        },
        { "name": "broken", "d": "M0 0 X 5" }
    ]
}"##;

fn load_scene() -> SceneDocument {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.json");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(SCENE.as_bytes()).unwrap();
    SceneDocument::load(&path).unwrap()
}

fn tools(stream: &[MotionPrimitive]) -> Vec<ToolId> {
    stream
        .iter()
        .filter_map(|c| match c {
            MotionPrimitive::Tool { tool } => Some(*tool),
            _ => None,
        })
        .collect()
}

#[test]
fn test_scene_file_runs_to_completion() {
    let scene = load_scene();
    let mut config = seeded_config();
    if let Some(canvas) = scene.canvas.clone() {
        config.canvas = canvas;
    }
    let paths = scene.to_art_paths(&config.palette);
    assert_eq!(paths.len(), 4);
    assert!(paths.iter().any(|p| p.name == "sun" && p.length() > 300.0));

    let scheduler = Scheduler::new(config.job.iteration_multiplier);
    let mut runner = JobRunner::new(config);
    runner.start(paths).unwrap();
    let mut stream = Vec::new();
    let ticks = scheduler
        .run_to_completion(&mut runner, &mut stream, Some(100_000))
        .unwrap();

    assert!(ticks > 1);
    assert_eq!(runner.state(), JobState::Idle);
    assert_pen_discipline(&stream);

    let used = tools(&stream);
    assert!(used.contains(&ToolId::Color(4)));
    assert!(used.contains(&ToolId::Color(5)));
    assert!(used.contains(&ToolId::Color(0)));
    assert!(used.iter().any(|t| matches!(t, ToolId::Water(_))));
    // One tool change per paint group.
    let distinct: std::collections::HashSet<_> = used.iter().collect();
    assert_eq!(distinct.len(), used.len());
}

#[test]
fn test_pen_mode_scene_skips_water() {
    let scene = load_scene();
    let mut config = seeded_config();
    config.job.media_mode = MediaMode::Pen;
    let paths = scene.to_art_paths(&config.palette);

    let scheduler = Scheduler::default();
    let mut runner = JobRunner::new(config);
    runner.start(paths).unwrap();
    let mut stream = Vec::new();
    scheduler.run_to_completion(&mut runner, &mut stream, None).unwrap();

    assert!(!tools(&stream).iter().any(|t| matches!(t, ToolId::Water(_))));
    assert!(!stream.iter().any(|c| matches!(c, MotionPrimitive::Wash { .. })));
}

#[test]
fn test_tick_budget_cancels_job() {
    let scene = load_scene();
    let config = seeded_config();
    let paths = scene.to_art_paths(&config.palette);

    let scheduler = Scheduler::new(1);
    let mut runner = JobRunner::new(config);
    runner.start(paths).unwrap();
    let mut stream = Vec::new();
    assert!(scheduler
        .run_to_completion(&mut runner, &mut stream, Some(3))
        .is_err());
    assert_eq!(runner.state(), JobState::Idle);
    assert_eq!(
        &stream[stream.len() - 2..],
        &[MotionPrimitive::Up, MotionPrimitive::Park]
    );
}
