use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped so a long stall does not produce a huge step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a clock clamping dt to `[0.1 ms, 250 ms]`.
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min: Duration::from_micros(100),  // 0.0001s
            dt_max: Duration::from_millis(250),  // 0.25s
        }
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let mut dt = now.saturating_duration_since(self.last);

        if dt < self.dt_min {
            dt = self.dt_min;
        } else if dt > self.dt_max {
            dt = self.dt_max;
        }

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed frame-rate limiter.
///
/// The runtime sleeps until [`deadline`](Self::deadline) and renders once
/// [`due`](Self::due) reports true. A rate of 0 disables the limit.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Option<Duration>,
    next: Instant,
}

impl FramePacer {
    pub fn new(frame_rate: u32, now: Instant) -> Self {
        let interval = (frame_rate > 0).then(|| Duration::from_secs(1) / frame_rate);
        Self { interval, next: now }
    }

    #[inline]
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Earliest instant the next frame should start, if limited.
    #[inline]
    pub fn deadline(&self) -> Option<Instant> {
        self.interval.map(|_| self.next)
    }

    pub fn due(&self, now: Instant) -> bool {
        self.interval.is_none() || now >= self.next
    }

    /// Records a frame started at `now` and schedules the next one.
    ///
    /// When the loop falls more than one interval behind, the schedule is
    /// re-based on `now` instead of bursting to catch up.
    pub fn frame_started(&mut self, now: Instant) {
        let Some(interval) = self.interval else { return };
        self.next += interval;
        if self.next <= now {
            self.next = now + interval;
        }
    }
}
