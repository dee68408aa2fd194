use crate::common::{assert_pen_discipline, run_job, seeded_config, square};
use paintkit_core::{ColorId, Palette, Point, Rect};
use paintkit_settings::{FillSettings, FillType, TravelAlgorithm, TravelSettings};
use paintkit_toolpath::fill::{FillAlgorithm, FillJobContext};
use paintkit_toolpath::{
    resolve_occlusion, ArtPath, PathRole, PlotPath, TravelOptimizer, VectorGeometry, WorkLayer,
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::rc::Rc;

fn point() -> impl Strategy<Value = Point> {
    (0.0f64..300.0, 0.0f64..300.0).prop_map(|(x, y)| Point::new(x, y))
}

fn plot_paths() -> impl Strategy<Value = Vec<(usize, bool, Vec<Point>)>> {
    prop::collection::vec(
        (0usize..4, any::<bool>(), prop::collection::vec(point(), 2..5)),
        0..25,
    )
}

fn algorithm() -> impl Strategy<Value = TravelAlgorithm> {
    prop_oneof![
        Just(TravelAlgorithm::Greedy),
        Just(TravelAlgorithm::TspOpt),
        Just(TravelAlgorithm::TspAco),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn travel_covers_every_path_once_grouped_by_color(
        specs in plot_paths(),
        travel_algorithm in algorithm(),
        seed in any::<u64>(),
    ) {
        let paths: Vec<PlotPath> = specs
            .into_iter()
            .enumerate()
            .map(|(i, (color, fill, points))| {
                let role = if fill { PathRole::Fill } else { PathRole::Stroke };
                PlotPath::new(format!("p{}", i), role, ColorId::Palette(color), points)
            })
            .collect();
        let total = paths.len();

        let mut optimizer = TravelOptimizer::new(&TravelSettings {
            travel_algorithm,
            tsp_iterations: 10,
            seed: Some(seed),
        });
        let ordered = optimizer.optimize(paths, &Palette::default());

        prop_assert_eq!(ordered.len(), total);
        let names: HashSet<&str> = ordered.iter().map(|p| p.name.as_str()).collect();
        prop_assert_eq!(names.len(), total);

        let mut finished = HashSet::new();
        for pair in ordered.windows(2) {
            if pair[0].color != pair[1].color {
                prop_assert!(finished.insert(pair[0].color), "{:?} interleaved", pair[0].color);
                prop_assert!(!finished.contains(&pair[1].color));
            }
        }
    }

    #[test]
    fn emitted_stream_keeps_pen_discipline(
        strokes in prop::collection::vec((0usize..3, prop::collection::vec(point(), 2..4)), 1..6),
        water in any::<bool>(),
    ) {
        let mut paths: Vec<ArtPath> = strokes
            .into_iter()
            .enumerate()
            .map(|(i, (color, points))| {
                ArtPath::polyline(format!("s{}", i), points)
                    .with_stroke(ColorId::Palette(color), 1.0)
            })
            .collect();
        if water {
            let glaze = ArtPath::polygon("glaze", square(20.0, 20.0, 30.0));
            paths.push(glaze.with_stroke(ColorId::Water, 1.0));
        }
        let stream = run_job(seeded_config(), paths);
        assert_pen_discipline(&stream);
    }

    #[test]
    fn occlusion_leaves_disjoint_shapes_alone(
        cells in prop::collection::hash_set((0u8..6, 0u8..6), 1..8),
        size in 5.0f64..40.0,
    ) {
        let geometry = VectorGeometry::new();
        let mut layer = WorkLayer::new("fill");
        let mut expected = Vec::new();
        for (col, row) in cells {
            let path = ArtPath::polygon(
                format!("c{}_{}", col, row),
                square(col as f64 * 50.0, row as f64 * 50.0, size),
            )
            .with_fill(ColorId::Palette(0));
            expected.push((layer.insert(path), size * size));
        }

        prop_assert_eq!(resolve_occlusion(&geometry, &mut layer), 0);
        for (id, area) in expected {
            let path = layer.get(id).unwrap();
            prop_assert!((path.area() - area).abs() < 1e-3);
        }
    }

    #[test]
    fn fills_terminate(
        width in 0.0f64..120.0,
        height in 0.0f64..120.0,
        spacing in 2.0f64..20.0,
        fill_type in prop::sample::select(FillType::ALL.to_vec()),
    ) {
        let mut ctx = FillJobContext::new(
            FillSettings {
                fill_type: fill_type.as_str().to_string(),
                fill_spacing: spacing,
                fill_precision: 4.0,
                ..FillSettings::default()
            },
            Rect::new(0.0, 0.0, 400.0, 400.0),
            Rc::new(VectorGeometry::new()),
            Some(11),
        );
        let region = vec![
            Point::new(10.0, 10.0),
            Point::new(10.0 + width, 10.0),
            Point::new(10.0 + width, 10.0 + height),
            Point::new(10.0, 10.0 + height),
        ];
        let id = ctx
            .layer
            .insert(ArtPath::polygon("region", region).with_fill(ColorId::Palette(1)));
        let mut fill = FillAlgorithm::setup(&ctx).unwrap();

        // Generous bound: samples along the overlay curve dominate.
        let budget = 200_000;
        let mut steps = 0;
        while !fill.step(&mut ctx, id).unwrap().is_done() {
            steps += 1;
            prop_assert!(steps < budget, "{} fill did not finish", fill_type);
        }
    }
}
