//! Broadcast of text frames to every connected WebSocket peer

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::pubsub::PubSubChannel;
use heapless::String;
use log::warn;

/// Largest text frame that can be broadcast
pub const FRAME_CAPACITY: usize = 128;

/// Text frame queued for the peers
pub type PeerFrame = String<FRAME_CAPACITY>;

/// Sends one text frame to every connected peer
pub trait Fanout {
    fn broadcast(&self, frame: &str);
}

/// Channel every WebSocket session subscribes to.
///
/// Publishing is immediate: a peer that falls behind loses its oldest
/// frames, the publisher never waits.
pub type PeerChannel<M, const CAP: usize, const SUBS: usize> =
    PubSubChannel<M, PeerFrame, CAP, SUBS, 0>;

/// [`Fanout`] over a [`PeerChannel`]
pub struct ChannelFanout<'a, M: RawMutex, const CAP: usize, const SUBS: usize> {
    channel: &'a PeerChannel<M, CAP, SUBS>,
}

impl<'a, M: RawMutex, const CAP: usize, const SUBS: usize> ChannelFanout<'a, M, CAP, SUBS> {
    pub const fn new(channel: &'a PeerChannel<M, CAP, SUBS>) -> Self {
        Self { channel }
    }
}

impl<M: RawMutex, const CAP: usize, const SUBS: usize> Fanout for ChannelFanout<'_, M, CAP, SUBS> {
    fn broadcast(&self, frame: &str) {
        let Ok(frame) = PeerFrame::try_from(frame) else {
            warn!("fanout: dropping {} byte frame", frame.len());
            return;
        };
        self.channel.immediate_publisher().publish_immediate(frame);
    }
}
