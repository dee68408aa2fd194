use paintkit_core::{MotionPrimitive, Point};
use paintkit_settings::Config;
use paintkit_toolpath::{ArtPath, JobRunner, Scheduler};

pub fn square(x: f64, y: f64, size: f64) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x + size, y),
        Point::new(x + size, y + size),
        Point::new(x, y + size),
    ]
}

pub fn seeded_config() -> Config {
    let mut config = Config::default();
    config.travel.seed = Some(7);
    config
}

/// Runs a whole job and returns everything it emitted.
pub fn run_job(config: Config, paths: Vec<ArtPath>) -> Vec<MotionPrimitive> {
    let scheduler = Scheduler::new(config.job.iteration_multiplier);
    let mut runner = JobRunner::new(config);
    runner.start(paths).unwrap();
    let mut stream = Vec::new();
    scheduler
        .run_to_completion(&mut runner, &mut stream, Some(100_000))
        .unwrap();
    stream
}

/// Checks pen discipline: no double down, and moves only inside a path.
pub fn assert_pen_discipline(stream: &[MotionPrimitive]) {
    let mut down = false;
    let mut active = false;
    for (i, command) in stream.iter().enumerate() {
        match command {
            MotionPrimitive::Down => {
                assert!(!down, "second down at {}", i);
                assert!(active, "down outside a path at {}", i);
                down = true;
            }
            MotionPrimitive::Up => down = false,
            MotionPrimitive::Move { .. } => assert!(active, "move outside a path at {}", i),
            MotionPrimitive::Status { .. } => active = true,
            MotionPrimitive::Progress { .. } => {
                assert!(!down, "path ended with the pen down at {}", i);
                active = false;
            }
            _ => {}
        }
    }
    assert!(!down, "stream ended with the pen down");
}
