//! Mutable state of a single bootstrap run.

use std::fmt;

/// Run mode. Only ever moves from `Normal` to `Investigation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Normal,
    /// Entered after any failure or when the staging root already existed.
    /// Version-control operations are skipped in this mode.
    Investigation,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Normal => write!(f, "normal"),
            Mode::Investigation => write!(f, "investigation"),
        }
    }
}

/// State threaded by `&mut` through every stage of a run.
#[derive(Debug, Default)]
pub struct RunState {
    mode: Mode,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_investigating(&self) -> bool {
        self.mode == Mode::Investigation
    }

    /// Switch to investigation mode. There is no way back.
    pub fn enter_investigation(&mut self) {
        if self.mode != Mode::Investigation {
            tracing::debug!("entering investigation mode");
        }
        self.mode = Mode::Investigation;
    }
}
