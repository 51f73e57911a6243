mod tests {
    use myrtio_pixel_core::color::{Color, hsb_to_rgb, rgb_to_hsb};

    fn round_trip(color: Color) -> Color {
        let (h, s, b) = rgb_to_hsb(color.r, color.g, color.b);
        Color::from_rgb24(hsb_to_rgb(h, s, b))
    }

    fn assert_close(actual: Color, expected: Color) {
        let diff = |a: u8, b: u8| a.abs_diff(b);
        assert!(
            diff(actual.r, expected.r) <= 1
                && diff(actual.g, expected.g) <= 1
                && diff(actual.b, expected.b) <= 1,
            "{actual:?} is not within 1 of {expected:?}"
        );
    }

    #[test]
    fn test_rgb_to_hsb_primaries() {
        assert_eq!(rgb_to_hsb(255, 0, 0), (0.0, 1.0, 1.0));
        let (h, s, b) = rgb_to_hsb(0, 255, 0);
        assert!((h - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!((s, b), (1.0, 1.0));
        let (h, _, _) = rgb_to_hsb(0, 0, 255);
        assert!((h - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_rgb_to_hsb_achromatic() {
        assert_eq!(rgb_to_hsb(0, 0, 0), (0.0, 0.0, 0.0));
        let (h, s, b) = rgb_to_hsb(128, 128, 128);
        assert_eq!((h, s), (0.0, 0.0));
        assert!((b - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_rgb_to_hsb_components_are_normalized() {
        for &(r, g, b) in &[(255, 128, 0), (12, 200, 99), (1, 0, 3), (250, 0, 251)] {
            let (h, s, v) = rgb_to_hsb(r, g, b);
            for component in [h, s, v] {
                assert!((0.0..=1.0).contains(&component), "{component} out of range");
            }
        }
    }

    #[test]
    fn test_hsb_to_rgb_packs_red_high() {
        assert_eq!(hsb_to_rgb(0.0, 1.0, 1.0), 0xFF0000);
        assert_eq!(hsb_to_rgb(1.0 / 3.0, 1.0, 1.0), 0x00FF00);
        assert_eq!(hsb_to_rgb(2.0 / 3.0, 1.0, 1.0), 0x0000FF);
        assert_eq!(hsb_to_rgb(0.0, 0.0, 1.0), 0xFFFFFF);
        assert_eq!(hsb_to_rgb(0.5, 1.0, 0.0), 0x000000);
    }

    #[test]
    fn test_hsb_to_rgb_saturates_out_of_range_brightness() {
        assert_eq!(hsb_to_rgb(0.0, 1.0, 1.002), 0xFF0000);
        assert_eq!(hsb_to_rgb(0.0, 0.0, 1.5), 0xFFFFFF);
        assert_eq!(hsb_to_rgb(0.0, 0.0, -0.2), 0x000000);
    }

    #[test]
    fn test_round_trip_within_one() {
        for r in (0..=255u16).step_by(15) {
            for g in (0..=255u16).step_by(17) {
                for b in (0..=255u16).step_by(51) {
                    let color = Color::rgb(r as u8, g as u8, b as u8);
                    assert_close(round_trip(color), color);
                }
            }
        }
        assert_close(round_trip(Color::rgb(255, 128, 0)), Color::rgb(255, 128, 0));
    }

    #[test]
    fn test_color_packing() {
        let color = Color::from_rgb24(0xFF8000);
        assert_eq!(color, Color::rgb(255, 128, 0));
        assert_eq!(color.rgb24(), 0xFF8000);
        assert!(Color::white(40).is_achromatic());
        assert!(!color.is_achromatic());
    }

    #[test]
    fn test_white_folds_into_rgb8() {
        let wire = Color::new(250, 10, 0, 20).to_rgb8();
        assert_eq!((wire.r, wire.g, wire.b), (255, 30, 20));
    }
}
