//! Render loop
//!
//! Each tick the loop copies the shared [`DeviceState`] out under the lock,
//! computes a full pixel buffer for the active [`AnimationMode`] and pushes
//! it to the output driver. The lock is never held while pushing or
//! sleeping.
//!
//! Frame computation lives in [`Animator`] so it can be driven without a
//! timer or hardware.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};
use log::{debug, error, info};
use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng as _};

use crate::color::{Color, hsb_to_rgb, rgb_to_hsb};
use crate::state::{AnimationMode, DeviceState, SharedDeviceState};

/// Pixel buffer handed to the output driver
pub type PixelBuffer<const N: usize> = [Color; N];

/// White level of the idle indicator pixel
pub const IDLE_INDICATOR_WHITE: u8 = 15;

/// Lowest brightness of the fade ramp
pub const FADE_FLOOR: f32 = 0.05;

/// Brightness increment between two fade frames
pub const FADE_STEP: f32 = 0.01;

/// Output driver failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputError {
    /// The transmission peripheral rejected the frame
    Transmit,
}

/// Output primitive pushing one frame to the LED strip
pub trait PixelDriver<const N: usize> {
    /// Push a complete frame. Called once per computed buffer.
    fn push(&mut self, pixels: PixelBuffer<N>) -> Result<(), OutputError>;
}

/// Render timings
#[derive(Debug, Clone, Copy)]
pub struct RenderTimings {
    /// Sleep after an idle, chase or random frame
    pub tick: Duration,
    /// Sleep after each fade frame
    pub fade_step: Duration,
}

impl Default for RenderTimings {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            fade_step: Duration::from_millis(10),
        }
    }
}

/// Frame generator owning the per-animation cursors
pub struct Animator<const N: usize> {
    chase_cursor: usize,
    rng: SmallRng,
}

impl<const N: usize> Animator<N> {
    /// Create an animator with a fixed random seed
    pub fn new(seed: u64) -> Self {
        Self {
            chase_cursor: 1,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Blank buffer with the dim white idle indicator on pixel 0
    pub fn idle(&self) -> PixelBuffer<N> {
        let mut pixels = [Color::BLACK; N];
        if let Some(first) = pixels.first_mut() {
            *first = Color::white(IDLE_INDICATOR_WHITE);
        }
        pixels
    }

    /// Light the pixel under the chase cursor and advance it.
    ///
    /// The cursor walks `1..N` and wraps back to 1; pixel 0 stays dark.
    pub fn chase(&mut self, color: Color) -> PixelBuffer<N> {
        let mut pixels = [Color::BLACK; N];
        if N < 2 {
            return pixels;
        }
        pixels[self.chase_cursor] = color;
        self.chase_cursor += 1;
        if self.chase_cursor >= N {
            self.chase_cursor = 1;
        }
        pixels
    }

    /// Light one uniformly chosen pixel
    pub fn random(&mut self, color: Color) -> PixelBuffer<N> {
        let mut pixels = [Color::BLACK; N];
        if N == 0 {
            return pixels;
        }
        let index = self.rng.gen_range(0..N);
        pixels[index] = color;
        pixels
    }

    /// Blank buffer with `color` on pixel 0
    pub fn fade(&self, color: Color) -> PixelBuffer<N> {
        let mut pixels = [Color::BLACK; N];
        if let Some(first) = pixels.first_mut() {
            *first = color;
        }
        pixels
    }

    /// Position of the chase cursor
    pub fn chase_cursor(&self) -> usize {
        self.chase_cursor
    }
}

#[derive(Debug, Clone, Copy)]
enum FadeTarget {
    Hsb { hue: f32, saturation: f32 },
    White,
}

/// Single fade-in/fade-out pass over one color.
///
/// Yields pixel colors with brightness rising from [`FADE_FLOOR`] to the
/// color's own brightness in [`FADE_STEP`] increments, then falling back
/// to the floor. White-only colors ramp the white channel instead.
#[derive(Debug, Clone)]
pub struct FadeRamp {
    target: FadeTarget,
    peak: f32,
    rising: usize,
    position: usize,
}

impl FadeRamp {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(color: Color) -> Self {
        let (hue, saturation, brightness) = rgb_to_hsb(color.r, color.g, color.b);
        let (target, peak) = if brightness == 0.0 && color.w > 0 {
            (FadeTarget::White, f32::from(color.w) / 255.0)
        } else {
            (FadeTarget::Hsb { hue, saturation }, brightness)
        };

        let rising = if peak < FADE_FLOOR {
            0
        } else {
            libm::ceilf((peak - FADE_FLOOR) / FADE_STEP) as usize + 1
        };

        Self {
            target,
            peak,
            rising,
            position: 0,
        }
    }

    /// Number of frames in the whole pass
    pub fn frame_count(&self) -> usize {
        if self.rising == 0 {
            0
        } else {
            self.rising * 2 - 1
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn level(&self, step: usize) -> f32 {
        let level = FADE_FLOOR + step as f32 * FADE_STEP;
        if level > self.peak { self.peak } else { level }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn color_at(&self, level: f32) -> Color {
        match self.target {
            FadeTarget::Hsb { hue, saturation } => {
                Color::from_rgb24(hsb_to_rgb(hue, saturation, level))
            }
            FadeTarget::White => Color::white((level * 255.0 + 0.5) as u8),
        }
    }
}

impl Iterator for FadeRamp {
    type Item = Color;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.frame_count() {
            return None;
        }
        let step = if self.position < self.rising {
            self.position
        } else {
            self.frame_count() - 1 - self.position
        };
        self.position += 1;
        Some(self.color_at(self.level(step)))
    }
}

/// Render loop state machine
pub struct RenderLoop<'a, D: PixelDriver<N>, M: RawMutex, const N: usize> {
    state: &'a SharedDeviceState<M>,
    driver: D,
    animator: Animator<N>,
    timings: RenderTimings,
    snapshot: DeviceState,
}

impl<'a, D: PixelDriver<N>, M: RawMutex, const N: usize> RenderLoop<'a, D, M, N> {
    /// Create a render loop starting in idle with the given random seed
    pub fn new(state: &'a SharedDeviceState<M>, driver: D, seed: u64) -> Self {
        Self {
            state,
            driver,
            animator: Animator::new(seed),
            timings: RenderTimings::default(),
            snapshot: DeviceState::initial(),
        }
    }

    /// Override the default timings
    #[must_use]
    pub fn with_timings(mut self, timings: RenderTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Last snapshot the loop rendered from
    pub fn snapshot(&self) -> DeviceState {
        self.snapshot
    }

    /// Access the output driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Run one tick: refresh the snapshot, render the active animation,
    /// sleep.
    ///
    /// A busy state lock keeps the previous snapshot for this tick.
    pub async fn tick(&mut self) -> Result<(), OutputError> {
        if let Some(snapshot) = self.state.read().await {
            if snapshot.mode != self.snapshot.mode {
                info!(
                    "render: mode {:?} -> {:?}",
                    self.snapshot.mode, snapshot.mode
                );
            }
            self.snapshot = snapshot;
        } else {
            debug!("render: reusing stale snapshot");
        }

        let DeviceState { color, mode } = self.snapshot;
        match mode {
            AnimationMode::Idle => {
                let frame = self.animator.idle();
                self.driver.push(frame)?;
                Timer::after(self.timings.tick).await;
            }
            AnimationMode::Chase => {
                let frame = self.animator.chase(color);
                self.driver.push(frame)?;
                Timer::after(self.timings.tick).await;
            }
            AnimationMode::Fade => self.fade(color).await?,
            AnimationMode::Random => {
                let frame = self.animator.random(color);
                self.driver.push(frame)?;
                Timer::after(self.timings.tick).await;
            }
        }
        Ok(())
    }

    async fn fade(&mut self, color: Color) -> Result<(), OutputError> {
        let ramp = FadeRamp::new(color);
        if ramp.frame_count() == 0 {
            self.driver.push(self.animator.fade(Color::BLACK))?;
            Timer::after(self.timings.tick).await;
            return Ok(());
        }
        for level in ramp {
            self.driver.push(self.animator.fade(level))?;
            Timer::after(self.timings.fade_step).await;
        }
        Ok(())
    }

    /// Run until the output driver fails
    pub async fn run(&mut self) -> OutputError {
        loop {
            if let Err(err) = self.tick().await {
                error!("render: output failed: {:?}", err);
                return err;
            }
        }
    }
}
