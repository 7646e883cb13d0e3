//! Per-bar position signals.
//!
//! A position series holds one [`Position`] per input bar, index-aligned.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Position {
    Short,
    #[default]
    Flat,
    Long,
}

pub type PositionSeries = Vec<Position>;

impl Position {
    /// Signed form: -1 short, 0 flat, 1 long.
    pub fn as_i8(self) -> i8 {
        match self {
            Position::Short => -1,
            Position::Flat => 0,
            Position::Long => 1,
        }
    }

    /// Sign of `value`; exactly zero (or NaN) maps to flat.
    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Position::Long
        } else if value < 0.0 {
            Position::Short
        } else {
            Position::Flat
        }
    }

    pub fn is_long(self) -> bool {
        self == Position::Long
    }

    pub fn is_short(self) -> bool {
        self == Position::Short
    }
}

impl From<Position> for i8 {
    fn from(p: Position) -> Self {
        p.as_i8()
    }
}

impl TryFrom<i8> for Position {
    type Error = i8;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Position::Short),
            0 => Ok(Position::Flat),
            1 => Ok(Position::Long),
            other => Err(other),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

/// Length of the trailing run of identical positions ending at the last bar.
pub fn trailing_run(series: &[Position]) -> usize {
    match series.last() {
        Some(&last) => series.iter().rev().take_while(|&&p| p == last).count(),
        None => 0,
    }
}
