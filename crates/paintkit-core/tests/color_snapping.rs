use paintkit_core::{ColorId, MediaColor, Palette, Rgb};
use proptest::prelude::*;

fn two_color_palette() -> Palette {
    Palette {
        name: "duo".to_string(),
        colors: vec![
            MediaColor::new("Navy", Rgb::new(0, 0, 128)),
            MediaColor::new("Crimson", Rgb::new(220, 20, 60)),
        ],
        blank: Rgb::WHITE,
    }
}

proptest! {
    #[test]
    fn snap_is_total_and_deterministic(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255) {
        let palette = Palette::default();
        let color = Rgb::new(r, g, b);
        let first = palette.snap_color_id(Some(color), 1.0);
        let second = palette.snap_color_id(Some(color), 1.0);
        prop_assert_eq!(first, second);
        match first {
            ColorId::Palette(i) => prop_assert!(i < palette.len()),
            ColorId::Blank => {}
            ColorId::Water => prop_assert!(false, "opaque color snapped to water"),
        }
    }

    #[test]
    fn translucent_always_water(
        r in 0u8..=255,
        g in 0u8..=255,
        b in 0u8..=255,
        alpha in 0.0f64..0.999,
    ) {
        let palette = two_color_palette();
        prop_assert_eq!(palette.snap_color_id(Some(Rgb::new(r, g, b)), alpha), ColorId::Water);
    }

    #[test]
    fn closest_color_is_in_range(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255) {
        let palette = two_color_palette();
        let idx = palette.closest_color(Rgb::new(r, g, b));
        prop_assert!(matches!(idx, Some(0) | Some(1)));
    }
}

#[test]
fn test_dark_red_snaps_to_crimson() {
    let palette = two_color_palette();
    assert_eq!(
        palette.snap_color_id(Some(Rgb::new(150, 10, 30)), 1.0),
        ColorId::Palette(1)
    );
}

#[test]
fn test_palette_round_trips_through_json() {
    let palette = Palette::default();
    let json = serde_json::to_string(&palette).unwrap();
    let back: Palette = serde_json::from_str(&json).unwrap();
    assert_eq!(back, palette);
}
