mod tests {
    use std::cell::RefCell;

    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use myrtio_pixel_core::color::Color;
    use myrtio_pixel_core::fanout::Fanout;
    use myrtio_pixel_core::http::RequestHead;
    use myrtio_pixel_core::server::{
        ControlServer, JOIN_ANNOUNCEMENT, PeerId, Reply, Request, ServerEvent,
    };
    use myrtio_pixel_core::state::{AnimationMode, SharedDeviceState};

    type State = SharedDeviceState<CriticalSectionRawMutex>;

    #[derive(Default)]
    struct Recorder {
        frames: RefCell<Vec<String>>,
    }

    impl Fanout for &Recorder {
        fn broadcast(&self, frame: &str) {
            self.frames.borrow_mut().push(frame.to_owned());
        }
    }

    fn request<'a>(head: &'a str, body: &'a [u8]) -> ServerEvent<'a> {
        ServerEvent::Request {
            peer: PeerId(1),
            request: Request {
                head: RequestHead::parse(head).unwrap(),
                body,
            },
        }
    }

    #[test]
    fn test_update_writes_state_and_broadcasts() {
        let state = State::new();
        let recorder = Recorder::default();
        let server = ControlServer::new(&state, &recorder);

        let body = b"color=%23FF8000&animation=1";
        let reply = block_on(server.dispatch(request(
            "POST /update HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 27\r\n",
            body,
        )));

        assert_eq!(reply, Reply::NoContent);
        let snapshot = block_on(state.read()).unwrap();
        assert_eq!(snapshot.color, Color::new(255, 128, 0, 0));
        assert_eq!(snapshot.mode, AnimationMode::Chase);
        assert_eq!(*recorder.frames.borrow(), vec!["ff 80 00 00".to_owned()]);
    }

    #[test]
    fn test_gray_update_status_line() {
        let state = State::new();
        let recorder = Recorder::default();
        let server = ControlServer::new(&state, &recorder);

        block_on(server.dispatch(request(
            "POST /update?x=1 HTTP/1.1\r\n",
            b"animation=2&color=%23808080",
        )));

        let snapshot = block_on(state.read()).unwrap();
        assert_eq!(snapshot.color, Color::white(0x80));
        assert_eq!(snapshot.mode, AnimationMode::Fade);
        assert_eq!(*recorder.frames.borrow(), vec!["00 00 00 80".to_owned()]);
    }

    #[test]
    fn test_handshake_announces_join() {
        let state = State::new();
        let recorder = Recorder::default();
        let server = ControlServer::new(&state, &recorder);

        assert_eq!(
            block_on(server.dispatch(ServerEvent::Accept { peer: PeerId(2) })),
            Reply::None
        );
        assert_eq!(
            block_on(server.dispatch(ServerEvent::HandshakeDone { peer: PeerId(2) })),
            Reply::None
        );
        assert_eq!(*recorder.frames.borrow(), vec![JOIN_ANNOUNCEMENT.to_owned()]);
    }

    #[test]
    fn test_frames_are_relayed() {
        let state = State::new();
        let recorder = Recorder::default();
        let server = ControlServer::new(&state, &recorder);

        block_on(server.dispatch(ServerEvent::Frame {
            peer: PeerId(0),
            payload: b"hello",
        }));
        block_on(server.dispatch(ServerEvent::Frame {
            peer: PeerId(0),
            payload: &[0xff, 0xfe],
        }));
        block_on(server.dispatch(ServerEvent::Close { peer: PeerId(0) }));

        assert_eq!(*recorder.frames.borrow(), vec!["hello".to_owned()]);
        assert_eq!(block_on(state.read()).unwrap().mode, AnimationMode::Idle);
    }

    #[test]
    fn test_websocket_upgrade() {
        let state = State::new();
        let recorder = Recorder::default();
        let server = ControlServer::new(&state, &recorder);

        let reply = block_on(server.dispatch(request(
            "GET /ws HTTP/1.1\r\nHost: pixel\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\nSec-WebSocket-Version: 13\r\n",
            b"",
        )));

        match reply {
            Reply::Upgrade(key) => assert_eq!(key.as_str(), "s3pPLMBiTxaQ9kYGzzhZRbK+xOo="),
            other => panic!("unexpected reply {other:?}"),
        }
        assert!(recorder.frames.borrow().is_empty());
    }

    const UPGRADE: &str = "GET / HTTP/1.1\r\nUpgrade: websocket\r\nConnection: Upgrade\r\nSec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n";

    fn upgrade_from(peer: u8) -> ServerEvent<'static> {
        ServerEvent::Request {
            peer: PeerId(peer),
            request: Request {
                head: RequestHead::parse(UPGRADE).unwrap(),
                body: b"",
            },
        }
    }

    #[test]
    fn test_upgrade_refused_when_sessions_are_full() {
        let state = State::new();
        let recorder = Recorder::default();
        let server = ControlServer::with_max_sessions(&state, &recorder, 2);

        assert!(matches!(block_on(server.dispatch(upgrade_from(0))), Reply::Upgrade(_)));
        assert!(matches!(block_on(server.dispatch(upgrade_from(1))), Reply::Upgrade(_)));
        assert_eq!(server.session_count(), 2);
        assert_eq!(block_on(server.dispatch(upgrade_from(2))), Reply::Unavailable);

        // plain requests still get through on the spare slot
        assert_eq!(
            block_on(server.dispatch(ServerEvent::Request {
                peer: PeerId(2),
                request: Request {
                    head: RequestHead::parse("GET / HTTP/1.1\r\n").unwrap(),
                    body: b"",
                },
            })),
            Reply::Static("/index.html".try_into().unwrap())
        );

        block_on(server.dispatch(ServerEvent::Close { peer: PeerId(2) }));
        assert_eq!(server.session_count(), 2);
        block_on(server.dispatch(ServerEvent::Close { peer: PeerId(0) }));
        assert_eq!(server.session_count(), 1);
        assert!(matches!(block_on(server.dispatch(upgrade_from(2))), Reply::Upgrade(_)));
    }

    #[test]
    fn test_upgrade_slot_is_per_peer() {
        let state = State::new();
        let recorder = Recorder::default();
        let server = ControlServer::with_max_sessions(&state, &recorder, 1);

        assert!(matches!(block_on(server.dispatch(upgrade_from(3))), Reply::Upgrade(_)));
        assert!(matches!(block_on(server.dispatch(upgrade_from(3))), Reply::Upgrade(_)));
        assert_eq!(server.session_count(), 1);
        assert_eq!(block_on(server.dispatch(upgrade_from(40))), Reply::Unavailable);

        let server = ControlServer::with_max_sessions(&state, &recorder, 0);
        assert_eq!(block_on(server.dispatch(upgrade_from(0))), Reply::Unavailable);
        assert_eq!(server.session_count(), 0);
    }

    #[test]
    fn test_static_routes() {
        let state = State::new();
        let recorder = Recorder::default();
        let server = ControlServer::new(&state, &recorder);
        let get = |head: &'static str| block_on(server.dispatch(request(head, b"")));

        assert_eq!(
            get("GET / HTTP/1.1\r\n"),
            Reply::Static("/index.html".try_into().unwrap())
        );
        assert_eq!(
            get("GET /app.js?v=3 HTTP/1.1\r\n"),
            Reply::Static("/app.js".try_into().unwrap())
        );
        assert_eq!(
            get("HEAD /style.css HTTP/1.1\r\n"),
            Reply::Static("/style.css".try_into().unwrap())
        );
        assert_eq!(get("GET /../secret HTTP/1.1\r\n"), Reply::NotFound);
        assert_eq!(get("GET relative HTTP/1.1\r\n"), Reply::NotFound);
        assert_eq!(get("POST /other HTTP/1.1\r\n"), Reply::NotFound);
        assert!(recorder.frames.borrow().is_empty());
    }
}
