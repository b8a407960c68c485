//! Task Priority
//!
//! The three fixed scheduling tiers.

use std::fmt;
use std::str::FromStr;

use crate::SchedulerError;

/// Task priority levels
///
/// Ordered so that `Realtime > Interactive > Background`.
/// Variants are declared lowest first so the derived `Ord` matches. Use
/// `u8::from` / `TaskPriority::try_from` for the raw numbering, not `as`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskPriority {
    /// Deferrable work (autosave, prefetch, thumbnails)
    Background,
    /// User-visible work (layout recompute after an edit)
    Interactive,
    /// Timing-critical work (frame render, playback cursor)
    Realtime,
}

impl TaskPriority {
    /// All tiers in dispatch order, highest first
    pub const ALL: [TaskPriority; 3] = [Self::Realtime, Self::Interactive, Self::Background];

    /// Get priority name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::Interactive => "interactive",
            Self::Background => "background",
        }
    }

    /// Position in the dispatch order (0 = dispatched first)
    pub(crate) fn tier_index(self) -> usize {
        match self {
            Self::Realtime => 0,
            Self::Interactive => 1,
            Self::Background => 2,
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw wire value, numbered in dispatch order: 0 = realtime, 1 = interactive,
/// 2 = background. Anything else is rejected.
impl TryFrom<u8> for TaskPriority {
    type Error = SchedulerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Realtime),
            1 => Ok(Self::Interactive),
            2 => Ok(Self::Background),
            other => Err(SchedulerError::UnknownPriority(other.to_string())),
        }
    }
}

impl From<TaskPriority> for u8 {
    fn from(priority: TaskPriority) -> Self {
        priority.tier_index() as u8
    }
}

impl FromStr for TaskPriority {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "realtime" => Ok(Self::Realtime),
            "interactive" => Ok(Self::Interactive),
            "background" => Ok(Self::Background),
            _ => Err(SchedulerError::UnknownPriority(s.to_string())),
        }
    }
}
