//! Pomodoro focus timer state machine
//!
//! A deterministic two-phase countdown. The store does not own a clock;
//! callers drive [`PomodoroState::tick`] once per second and react to the
//! reported phase switch. Phase changes auto-pause so the user decides
//! when the next phase starts.
//!
//! Durations arrive from user settings and may be garbage (negative,
//! NaN, absurdly large); they are clamped rather than rejected since a
//! broken timer preference should never take the feature down.

use serde::{Deserialize, Serialize};

pub const MIN_MINUTES: f64 = 1.0;
pub const MAX_MINUTES: f64 = 180.0;

const DEFAULT_FOCUS_MINUTES: f64 = 25.0;
const DEFAULT_BREAK_MINUTES: f64 = 5.0;

/// Focus/break durations in minutes, as configured by the user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroDurations {
    #[serde(default = "default_focus_minutes")]
    pub focus_minutes: f64,
    #[serde(default = "default_break_minutes")]
    pub break_minutes: f64,
}

impl Default for PomodoroDurations {
    fn default() -> Self {
        Self {
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

fn default_focus_minutes() -> f64 {
    DEFAULT_FOCUS_MINUTES
}

fn default_break_minutes() -> f64 {
    DEFAULT_BREAK_MINUTES
}

/// Built-in duration presets offered by the shells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PomodoroPresetId {
    Quick,
    Classic,
    Deep,
}

#[derive(Debug, Clone, Copy)]
pub struct PomodoroPreset {
    pub id: PomodoroPresetId,
    pub label: &'static str,
    pub focus_minutes: f64,
    pub break_minutes: f64,
}

pub const POMODORO_PRESETS: [PomodoroPreset; 3] = [
    PomodoroPreset {
        id: PomodoroPresetId::Quick,
        label: "15/3",
        focus_minutes: 15.0,
        break_minutes: 3.0,
    },
    PomodoroPreset {
        id: PomodoroPresetId::Classic,
        label: "25/5",
        focus_minutes: 25.0,
        break_minutes: 5.0,
    },
    PomodoroPreset {
        id: PomodoroPresetId::Deep,
        label: "50/10",
        focus_minutes: 50.0,
        break_minutes: 10.0,
    },
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PomodoroPhase {
    Focus,
    Break,
}

/// Snapshot of the running timer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroState {
    pub phase: PomodoroPhase,
    pub remaining_seconds: u32,
    pub is_running: bool,
    pub completed_focus_sessions: u32,
}

/// Outcome of a one-second tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PomodoroTick {
    pub state: PomodoroState,
    pub switched_phase: bool,
    pub completed_focus_session: bool,
}

/// Clamp durations to whole minutes in `1..=180`, defaulting anything
/// non-finite
pub fn sanitize_durations(durations: &PomodoroDurations) -> PomodoroDurations {
    PomodoroDurations {
        focus_minutes: clamp_minutes(durations.focus_minutes, DEFAULT_FOCUS_MINUTES),
        break_minutes: clamp_minutes(durations.break_minutes, DEFAULT_BREAK_MINUTES),
    }
}

fn clamp_minutes(value: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.round().clamp(MIN_MINUTES, MAX_MINUTES)
}

/// Full length of a phase in seconds, after sanitizing `durations`
pub fn phase_seconds(phase: PomodoroPhase, durations: &PomodoroDurations) -> u32 {
    let sanitized = sanitize_durations(durations);
    let minutes = match phase {
        PomodoroPhase::Focus => sanitized.focus_minutes,
        PomodoroPhase::Break => sanitized.break_minutes,
    };
    minutes as u32 * 60
}

impl PomodoroState {
    /// Fresh, paused state at the full duration of `phase`
    pub fn new(
        durations: &PomodoroDurations,
        phase: PomodoroPhase,
        completed_focus_sessions: u32,
    ) -> Self {
        Self {
            phase,
            remaining_seconds: phase_seconds(phase, durations),
            is_running: false,
            completed_focus_sessions,
        }
    }

    /// Restart the current (or given) phase, keeping the session count
    pub fn reset(&self, durations: &PomodoroDurations, phase: Option<PomodoroPhase>) -> Self {
        Self::new(
            durations,
            phase.unwrap_or(self.phase),
            self.completed_focus_sessions,
        )
    }

    /// Advance the timer by one second
    ///
    /// Paused timers are a no-op. Reaching zero in focus switches to a
    /// paused break and credits a completed session; reaching zero in
    /// break switches back to a paused focus phase.
    pub fn tick(&self, durations: &PomodoroDurations) -> PomodoroTick {
        if !self.is_running {
            return PomodoroTick {
                state: *self,
                switched_phase: false,
                completed_focus_session: false,
            };
        }

        if self.remaining_seconds > 1 {
            return PomodoroTick {
                state: Self {
                    remaining_seconds: self.remaining_seconds - 1,
                    ..*self
                },
                switched_phase: false,
                completed_focus_session: false,
            };
        }

        match self.phase {
            PomodoroPhase::Focus => PomodoroTick {
                state: Self {
                    phase: PomodoroPhase::Break,
                    remaining_seconds: phase_seconds(PomodoroPhase::Break, durations),
                    is_running: false,
                    completed_focus_sessions: self.completed_focus_sessions + 1,
                },
                switched_phase: true,
                completed_focus_session: true,
            },
            PomodoroPhase::Break => PomodoroTick {
                state: Self {
                    phase: PomodoroPhase::Focus,
                    remaining_seconds: phase_seconds(PomodoroPhase::Focus, durations),
                    is_running: false,
                    completed_focus_sessions: self.completed_focus_sessions,
                },
                switched_phase: true,
                completed_focus_session: false,
            },
        }
    }
}

/// Render seconds as `MM:SS`, or `H:MM:SS` from one hour up
pub fn format_clock(total_seconds: u32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", total_seconds / 60, seconds)
    }
}
