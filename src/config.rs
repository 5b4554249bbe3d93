//! Startup configuration read from the environment

use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_SQUADS: usize = 10;
pub const DEFAULT_BROADCAST_INTERVAL_MS: u64 = 5000;
const MIN_BROADCAST_INTERVAL_MS: u64 = 100;

/// Timing of the animated reveal
#[derive(Debug, Clone, PartialEq)]
pub struct SpinTiming {
    pub frames: u32,
    pub base_delay: Duration,
    pub delay_step: Duration,
    /// Fraction of frames after which every tick gets `delay_step` slower
    pub slowdown_after: f64,
}

impl Default for SpinTiming {
    fn default() -> Self {
        Self {
            frames: 40,
            base_delay: Duration::from_millis(80),
            delay_step: Duration::from_millis(10),
            slowdown_after: 0.7,
        }
    }
}

impl SpinTiming {
    /// Zero-delay timing, for tests and headless runs
    pub fn instant(frames: u32) -> Self {
        Self {
            frames,
            base_delay: Duration::ZERO,
            delay_step: Duration::ZERO,
            slowdown_after: 0.7,
        }
    }

    /// Delay between frame `frame` (0-based) and the next one.
    ///
    /// Once more than `slowdown_after` of the frames have been emitted, the
    /// delay grows by `delay_step` per frame.
    pub fn delay_after(&self, frame: u32) -> Duration {
        let emitted = frame + 1;
        let threshold = f64::from(self.frames) * self.slowdown_after;
        let slow_frames = (1..=emitted)
            .filter(|n| f64::from(*n) > threshold)
            .count() as u32;
        self.base_delay + self.delay_step * slow_frames
    }
}

#[derive(Debug, Clone)]
pub struct WheelConfig {
    pub port: u16,
    /// Upper bound for redistribution
    pub max_squads: usize,
    /// Heartbeat snapshot interval
    pub broadcast_interval: Duration,
    pub spin: SpinTiming,
    /// Start with the built-in demo roster instead of an empty one
    pub demo_roster: bool,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_squads: DEFAULT_MAX_SQUADS,
            broadcast_interval: Duration::from_millis(DEFAULT_BROADCAST_INTERVAL_MS),
            spin: SpinTiming::default(),
            demo_roster: true,
        }
    }
}

impl WheelConfig {
    /// Load config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_parse("PORT", defaults.port, |_| true);
        let max_squads = env_parse("MAX_SQUADS", defaults.max_squads, |v| *v >= 1);
        let broadcast_ms = env_parse(
            "BROADCAST_INTERVAL_MS",
            DEFAULT_BROADCAST_INTERVAL_MS,
            |v| *v >= MIN_BROADCAST_INTERVAL_MS,
        );
        let frames = env_parse("SPIN_FRAMES", defaults.spin.frames, |v| *v >= 1);
        let base_ms = env_parse("SPIN_BASE_DELAY_MS", 80u64, |_| true);
        let step_ms = env_parse("SPIN_DELAY_STEP_MS", 10u64, |_| true);
        let demo_roster = env_parse("DEMO_ROSTER", defaults.demo_roster, |_| true);

        let config = Self {
            port,
            max_squads,
            broadcast_interval: Duration::from_millis(broadcast_ms),
            spin: SpinTiming {
                frames,
                base_delay: Duration::from_millis(base_ms),
                delay_step: Duration::from_millis(step_ms),
                slowdown_after: defaults.spin.slowdown_after,
            },
            demo_roster,
        };

        tracing::info!(
            "Config: port={}, max_squads={}, broadcast_interval={:?}, spin_frames={}",
            config.port,
            config.max_squads,
            config.broadcast_interval,
            config.spin.frames
        );
        config
    }
}

fn env_parse<T>(key: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(v) if valid(&v) => v,
        _ => {
            tracing::warn!("Invalid {}={:?}, using default {}", key, raw, default);
            default
        }
    }
}
