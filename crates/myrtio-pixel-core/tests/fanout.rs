mod tests {
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use myrtio_pixel_core::fanout::{ChannelFanout, FRAME_CAPACITY, Fanout, PeerChannel};

    type Channel = PeerChannel<CriticalSectionRawMutex, 2, 3>;

    #[test]
    fn test_every_subscriber_gets_the_frame() {
        let channel = Channel::new();
        let mut first = channel.subscriber().unwrap();
        let mut second = channel.subscriber().unwrap();
        let fanout = ChannelFanout::new(&channel);

        fanout.broadcast("++ joined");

        for subscriber in [&mut first, &mut second] {
            let frame = subscriber.try_next_message_pure().unwrap();
            assert_eq!(frame.as_str(), "++ joined");
            assert!(subscriber.try_next_message_pure().is_none());
        }
    }

    #[test]
    fn test_broadcast_without_peers() {
        let channel = Channel::new();
        ChannelFanout::new(&channel).broadcast("nobody listens");
        let mut late = channel.subscriber().unwrap();
        assert!(late.try_next_message_pure().is_none());
    }

    #[test]
    fn test_oversized_frame_is_dropped() {
        let channel = Channel::new();
        let mut subscriber = channel.subscriber().unwrap();
        let fanout = ChannelFanout::new(&channel);

        fanout.broadcast(&"x".repeat(FRAME_CAPACITY + 1));
        assert!(subscriber.try_next_message_pure().is_none());

        fanout.broadcast(&"x".repeat(FRAME_CAPACITY));
        assert_eq!(subscriber.try_next_message_pure().unwrap().len(), FRAME_CAPACITY);
    }

    #[test]
    fn test_slow_peer_loses_oldest_frames() {
        let channel = Channel::new();
        let mut subscriber = channel.subscriber().unwrap();
        let fanout = ChannelFanout::new(&channel);

        for frame in ["a", "b", "c"] {
            fanout.broadcast(frame);
        }

        let mut received = Vec::new();
        while let Some(frame) = subscriber.try_next_message_pure() {
            received.push(frame);
        }
        assert_eq!(received, vec!["b", "c"]);
    }
}
