mod tests {
    use myrtio_pixel_core::ws::{
        Opcode, WsError, accept_key, decode_frame, encode_frame, encode_text,
    };

    #[test]
    fn test_accept_key_sample() {
        assert_eq!(
            accept_key("dGhlIHNhbXBsZSBub25jZQ==").as_str(),
            "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="
        );
    }

    #[test]
    fn test_decode_masked_text() {
        let mut buf = [
            0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58, 0x00,
        ];
        let frame = decode_frame(&mut buf).unwrap().unwrap();
        assert!(frame.fin);
        assert_eq!(frame.opcode, Opcode::Text);
        assert_eq!(frame.consumed, 11);
        assert_eq!(&buf[frame.payload], b"Hello");
    }

    #[test]
    fn test_decode_incomplete() {
        let mut full = [
            0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58,
        ];
        for len in 0..full.len() {
            assert_eq!(decode_frame(&mut full[..len]), Ok(None), "prefix {len}");
        }
    }

    #[test]
    fn test_decode_rejects_bad_frames() {
        let mut unmasked = [0x81, 0x02, b'h', b'i'];
        assert_eq!(decode_frame(&mut unmasked), Err(WsError::Unmasked));

        let mut reserved = [0xC1, 0x80, 0, 0, 0, 0];
        assert_eq!(decode_frame(&mut reserved), Err(WsError::Protocol));

        let mut opcode = [0x83, 0x80, 0, 0, 0, 0];
        assert_eq!(decode_frame(&mut opcode), Err(WsError::Protocol));

        let mut huge = [0x82, 0xFF, 0, 0, 0, 0, 0, 1, 0, 0];
        assert_eq!(decode_frame(&mut huge), Err(WsError::TooLarge));
    }

    #[test]
    fn test_decode_16_bit_length() {
        let payload = [b'x'; 200];
        let mut buf = vec![0x82, 0xFE, 0x00, 200, 0, 0, 0, 0];
        buf.extend_from_slice(&payload);
        let frame = decode_frame(&mut buf).unwrap().unwrap();
        assert_eq!(frame.opcode, Opcode::Binary);
        assert_eq!(frame.payload, 8..208);
        assert_eq!(&buf[frame.payload], &payload[..]);
    }

    #[test]
    fn test_encode_text() {
        let mut out = [0u8; 16];
        let n = encode_text("ff 80 00 00", &mut out).unwrap();
        assert_eq!(n, 13);
        assert_eq!(&out[..2], &[0x81, 11]);
        assert_eq!(&out[2..n], b"ff 80 00 00");
    }

    #[test]
    fn test_encode_16_bit_length() {
        let payload = [7u8; 300];
        let mut out = [0u8; 320];
        let n = encode_frame(Opcode::Binary, &payload, &mut out).unwrap();
        assert_eq!(n, 304);
        assert_eq!(&out[..4], &[0x82, 126, 0x01, 0x2C]);

        let mut small = [0u8; 8];
        assert_eq!(
            encode_frame(Opcode::Binary, &payload, &mut small),
            Err(WsError::BufferTooSmall)
        );
    }

    #[test]
    fn test_encode_control_frames() {
        let mut out = [0u8; 4];
        assert_eq!(encode_frame(Opcode::Close, &[], &mut out), Ok(2));
        assert_eq!(&out[..2], &[0x88, 0x00]);
        assert_eq!(encode_frame(Opcode::Pong, b"ab", &mut out), Ok(4));
        assert_eq!(&out, &[0x8A, 0x02, b'a', b'b']);
        assert_eq!(encode_frame(Opcode::Ping, &[], &mut out), Ok(2));
        assert_eq!(&out[..2], &[0x89, 0x00]);
    }
}
