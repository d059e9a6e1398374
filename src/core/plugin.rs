//! CorePlugin wires the scaled, pausable simulation clock that drives session timers.
use bevy::prelude::*;
#[cfg(feature = "core_debug")]
use bevy::time::TimerMode;
use std::time::Duration;

const DEFAULT_TIME_SCALE: f32 = 1.0;
const MIN_TIME_SCALE: f32 = 0.001;
const PAUSE_KEY: KeyCode = KeyCode::Space;
const SLOWER_KEY: KeyCode = KeyCode::BracketLeft;
const FASTER_KEY: KeyCode = KeyCode::BracketRight;
const MAX_TIME_SCALE: f32 = 16.0;

#[cfg(feature = "core_debug")]
#[derive(Resource)]
struct DebugTickTimer {
    timer: Timer,
}

#[cfg(feature = "core_debug")]
impl Default for DebugTickTimer {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(1.0, TimerMode::Repeating),
        }
    }
}

/// Session time: real frame time multiplied by `time_scale`.
///
/// Paused ticks add nothing, so phase timers and the arousal tick
/// accumulator freeze with the clock.
#[derive(Resource, Debug)]
pub struct SimulationClock {
    time_scale: f32,
    paused: bool,
    last_real_delta: Duration,
    last_scaled_delta: Duration,
    elapsed: Duration,
}

impl SimulationClock {
    pub fn new(time_scale: f32) -> Self {
        Self {
            time_scale: time_scale.max(MIN_TIME_SCALE),
            paused: false,
            last_real_delta: Duration::ZERO,
            last_scaled_delta: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    /// Never drops below `MIN_TIME_SCALE`.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(MIN_TIME_SCALE);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    #[cfg_attr(not(feature = "core_debug"), allow(dead_code))]
    pub fn last_real_delta(&self) -> Duration {
        self.last_real_delta
    }

    pub fn last_scaled_delta(&self) -> Duration {
        self.last_scaled_delta
    }

    /// Session time so far. Timestamps telemetry records.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn tick(&mut self, real_delta: Duration) {
        self.last_real_delta = real_delta;
        self.last_scaled_delta = if self.paused {
            Duration::ZERO
        } else {
            real_delta.mul_f32(self.time_scale)
        };
        self.elapsed += self.last_scaled_delta;
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_SCALE)
    }
}

/// Owns the `SimulationClock` and its keyboard controls.
#[derive(Debug, Clone, Copy)]
pub struct CorePlugin {
    time_scale: f32,
}

impl CorePlugin {
    pub const fn with_time_scale(time_scale: f32) -> Self {
        Self { time_scale }
    }
}

impl Default for CorePlugin {
    fn default() -> Self {
        Self::with_time_scale(DEFAULT_TIME_SCALE)
    }
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SimulationClock::new(self.time_scale))
            .add_systems(Startup, log_startup_time_scale)
            .add_systems(
                Update,
                (
                    toggle_simulation_pause,
                    adjust_simulation_speed,
                    update_simulation_clock,
                )
                    .chain(),
            );

        #[cfg(feature = "core_debug")]
        {
            app.insert_resource(DebugTickTimer::default())
                .add_systems(Update, log_scaled_ticks.after(update_simulation_clock));
        }
    }
}

pub fn update_simulation_clock(mut clock: ResMut<SimulationClock>, time: Res<Time>) {
    clock.tick(time.delta());
}

fn toggle_simulation_pause(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut clock: ResMut<SimulationClock>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };
    if keyboard.just_pressed(PAUSE_KEY) {
        let paused = !clock.is_paused();
        clock.set_paused(paused);
        info!("Simulation {}", if paused { "paused" } else { "resumed" });
    }
}

/// Halves or doubles the session speed, capped at `MAX_TIME_SCALE`.
fn adjust_simulation_speed(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    mut clock: ResMut<SimulationClock>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };
    let factor = if keyboard.just_pressed(FASTER_KEY) {
        2.0
    } else if keyboard.just_pressed(SLOWER_KEY) {
        0.5
    } else {
        return;
    };
    let scale = (clock.time_scale() * factor).min(MAX_TIME_SCALE);
    clock.set_time_scale(scale);
    info!("Session speed x{:.3}", clock.time_scale());
}

fn log_startup_time_scale(clock: Res<SimulationClock>) {
    info!("Session clock running at x{:.3}", clock.time_scale());
}

#[cfg(feature = "core_debug")]
fn log_scaled_ticks(mut timer: ResMut<DebugTickTimer>, clock: Res<SimulationClock>) {
    if timer.timer.tick(clock.last_real_delta()).just_finished() {
        info!(
            target: "core_debug",
            "Sim elapsed: {:.2}s | scale: {:.3} | paused: {} | scaled dt: {:.4}s",
            clock.elapsed().as_secs_f32(),
            clock.time_scale(),
            clock.is_paused(),
            clock.last_scaled_delta().as_secs_f32(),
        );
    }
}
