mod tests {
    use heapless::String;
    use myrtio_pixel_core::color::Color;
    use myrtio_pixel_core::control::{
        ControlUpdate, form_value, normalize_white, parse_animation, parse_color, status_line,
    };
    use myrtio_pixel_core::state::AnimationMode;

    #[test]
    fn test_orange_chase_update() {
        let update = ControlUpdate::from_form(b"color=%23FF8000&animation=1");
        assert_eq!(update.color, Color::new(255, 128, 0, 0));
        assert_eq!(update.mode, AnimationMode::Chase);
        assert_eq!(update.status_line().as_str(), "ff 80 00 00");
    }

    #[test]
    fn test_gray_becomes_white_channel() {
        for value in [0u8, 1, 15, 128, 255] {
            let update = ControlUpdate::from_form(
                format!("color=%23{value:02X}{value:02X}{value:02X}&animation=0").as_bytes(),
            );
            assert_eq!(update.color, Color::new(0, 0, 0, value));
        }
    }

    #[test]
    fn test_chromatic_input_keeps_white_off() {
        assert_eq!(normalize_white(Color::new(1, 2, 3, 9)), Color::new(1, 2, 3, 0));
        assert_eq!(normalize_white(Color::new(7, 7, 7, 0)), Color::new(0, 0, 0, 7));
    }

    #[test]
    fn test_out_of_range_animation_is_idle() {
        assert_eq!(parse_animation("99"), AnimationMode::Idle);
        assert_eq!(parse_animation("x"), AnimationMode::Idle);
        assert_eq!(parse_animation(""), AnimationMode::Idle);
        assert_eq!(parse_animation("2"), AnimationMode::Fade);
        assert_eq!(parse_animation("03"), AnimationMode::Random);

        let update = ControlUpdate::from_form(b"color=%23102030&animation=99");
        assert_eq!(update.mode, AnimationMode::Idle);
        assert_eq!(update.color, Color::rgb(0x10, 0x20, 0x30));
    }

    #[test]
    fn test_overlong_animation_field_is_idle() {
        let update = ControlUpdate::from_form(b"color=%23102030&animation=123");
        assert_eq!(update.mode, AnimationMode::Idle);
    }

    #[test]
    fn test_malformed_color_is_black() {
        assert_eq!(parse_color("#GG0000"), Color::BLACK);
        assert_eq!(parse_color("#FFF"), Color::BLACK);
        assert_eq!(parse_color("#FF00001"), Color::BLACK);
        assert_eq!(parse_color("xA0B0C0"), Color::rgb(0xA0, 0xB0, 0xC0));

        let update = ControlUpdate::from_form(b"animation=2");
        assert_eq!(update.color, Color::BLACK);
        assert_eq!(update.mode, AnimationMode::Fade);
    }

    #[test]
    fn test_form_value_decoding() {
        let mut out = String::<8>::new();
        assert!(form_value(b"a=1&color=%23aBcDeF", "color", &mut out));
        assert_eq!(out.as_str(), "#aBcDeF");

        assert!(form_value(b"name=a+b", "name", &mut out));
        assert_eq!(out.as_str(), "a b");

        assert!(!form_value(b"color=%2", "color", &mut out));
        assert!(out.is_empty());
        assert!(!form_value(b"other=1", "color", &mut out));
        assert!(!form_value(b"color=123456789", "color", &mut out));
    }

    #[test]
    fn test_status_line_format() {
        assert_eq!(status_line(Color::new(0, 0, 0, 15)).as_str(), "00 00 00 0f");
        assert_eq!(status_line(Color::new(1, 171, 255, 0)).as_str(), "01 ab ff 00");
    }
}
