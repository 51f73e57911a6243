//! Device state shared between the render task and the network side
//!
//! The `(Color, AnimationMode)` tuple lives behind a single async mutex.
//! Both accessors give up after a bounded wait: a busy lock means the
//! caller skips its read or drops its write, it never stalls.

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, with_timeout};
use log::{debug, warn};

use crate::color::Color;

/// Default bounded wait for the state lock
pub const LOCK_TIMEOUT: Duration = Duration::from_millis(20);

/// White level the device boots with
pub const INITIAL_WHITE: u8 = 15;

/// Animation rendered by the render loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AnimationMode {
    #[default]
    Idle = 0,
    Chase = 1,
    Fade = 2,
    Random = 3,
}

impl AnimationMode {
    /// Map a wire code to a mode. Unknown codes fall back to [`AnimationMode::Idle`].
    pub const fn from_code(code: u8) -> Self {
        match code {
            1 => AnimationMode::Chase,
            2 => AnimationMode::Fade,
            3 => AnimationMode::Random,
            _ => AnimationMode::Idle,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<u8> for AnimationMode {
    fn from(value: u8) -> Self {
        Self::from_code(value)
    }
}

/// Snapshot of the shared device state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceState {
    pub color: Color,
    pub mode: AnimationMode,
}

impl DeviceState {
    /// State the device starts with: dim white, idle
    pub const fn initial() -> Self {
        Self {
            color: Color::white(INITIAL_WHITE),
            mode: AnimationMode::Idle,
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Guarded access to the process wide [`DeviceState`].
///
/// Only [`read`](Self::read) and [`write`](Self::write) touch the tuple,
/// and both copy it as a whole inside one critical section.
pub struct SharedDeviceState<M: RawMutex = CriticalSectionRawMutex> {
    pub(crate) inner: Mutex<M, DeviceState>,
    timeout: Duration,
}

impl<M: RawMutex> SharedDeviceState<M> {
    /// Create the state with the boot defaults and [`LOCK_TIMEOUT`]
    pub const fn new() -> Self {
        Self::with_timeout(LOCK_TIMEOUT)
    }

    /// Create the state with the boot defaults and a custom bounded wait
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: Mutex::new(DeviceState::initial()),
            timeout,
        }
    }

    /// Copy out the current state.
    ///
    /// Returns `None` if the lock could not be taken within the bounded wait.
    pub async fn read(&self) -> Option<DeviceState> {
        match with_timeout(self.timeout, self.inner.lock()).await {
            Ok(guard) => Some(*guard),
            Err(_) => {
                debug!("state: read skipped, lock busy");
                None
            }
        }
    }

    /// Replace the whole state.
    ///
    /// Returns `false` if the lock could not be taken within the bounded
    /// wait; the update is dropped in that case.
    pub async fn write(&self, color: Color, mode: AnimationMode) -> bool {
        match with_timeout(self.timeout, self.inner.lock()).await {
            Ok(mut guard) => {
                *guard = DeviceState { color, mode };
                true
            }
            Err(_) => {
                warn!("state: write dropped, lock busy");
                false
            }
        }
    }
}

impl<M: RawMutex> Default for SharedDeviceState<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_time::Duration;

    use super::{AnimationMode, DeviceState, SharedDeviceState};
    use crate::color::Color;

    type State = SharedDeviceState<CriticalSectionRawMutex>;

    #[test]
    fn write_fails_while_lock_is_held() {
        let state = State::with_timeout(Duration::from_millis(5));
        let guard = block_on(state.inner.lock());

        assert!(!block_on(state.write(Color::rgb(1, 2, 3), AnimationMode::Chase)));
        assert_eq!(block_on(state.read()), None);

        drop(guard);
        assert_eq!(block_on(state.read()), Some(DeviceState::initial()));
    }

    #[test]
    fn write_succeeds_once_contention_clears() {
        let state = State::with_timeout(Duration::from_millis(5));
        {
            let _guard = block_on(state.inner.lock());
            assert!(!block_on(state.write(Color::rgb(9, 9, 1), AnimationMode::Fade)));
        }

        assert!(block_on(state.write(Color::rgb(9, 9, 1), AnimationMode::Fade)));
        let snapshot = block_on(state.read()).unwrap();
        assert_eq!(snapshot.color, Color::rgb(9, 9, 1));
        assert_eq!(snapshot.mode, AnimationMode::Fade);
    }
}
