//! Anti-skip enforcement for media lessons and read-to-end detection for
//! document lessons.
//!
//! Guard corrections are expected adversarial behavior, not faults: nothing
//! in this module returns an error, and snap-backs are never surfaced to the
//! learner as one.

use crate::gating::CourseUnit;

/// Slack allowed between two position reports before a jump counts as a seek.
pub const SEEK_TOLERANCE: f64 = 0.3;

/// Intersection ratio at which a document lesson counts as read to the end.
pub const VIEW_THRESHOLD: f64 = 0.95;

/// Why a completion was signalled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionReason {
    MediaEnded,
    ViewedToEnd,
    QuizPassed,
    Manual,
}

/// A completion signal raised by one of the guards, routed to the submitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionTrigger {
    pub unit: CourseUnit,
    pub reason: CompletionReason,
}

/// Verdict on a reported playback position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionVerdict {
    /// Position accepted; playback continues.
    Accepted,
    /// Forward seek detected; the player must snap back to the given position.
    SnapBack(f64),
}

/// Narrow capability a media backend must provide for the guard to drive it.
///
/// Any player (native element, custom widget) implements this; the guard
/// never reaches into backend-specific state.
pub trait MediaHandle {
    fn position(&self) -> f64;
    fn duration(&self) -> f64;
    fn seek_to(&mut self, position: f64);
}

//
// ─── SEEK GUARD ────────────────────────────────────────────────────────────────
//

/// Monotonic position guard for one media session.
///
/// The trusted marker is the furthest point legitimately reached. Reports
/// beyond `trusted + SEEK_TOLERANCE` are rejected and the marker does not
/// move; rewinds are always accepted. The marker resets when the unit
/// changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekGuard {
    unit: CourseUnit,
    last_trusted_position: f64,
}

impl SeekGuard {
    #[must_use]
    pub fn new(unit: CourseUnit) -> Self {
        Self {
            unit,
            last_trusted_position: 0.0,
        }
    }

    #[must_use]
    pub fn unit(&self) -> CourseUnit {
        self.unit
    }

    #[must_use]
    pub fn last_trusted_position(&self) -> f64 {
        self.last_trusted_position
    }

    /// Judge a reported position. Applies the same rule to natural playback
    /// progression and programmatic seeks.
    pub fn report_position(&mut self, position: f64) -> PositionVerdict {
        if position > self.last_trusted_position + SEEK_TOLERANCE {
            return PositionVerdict::SnapBack(self.last_trusted_position);
        }
        if position > self.last_trusted_position {
            self.last_trusted_position = position;
        }
        PositionVerdict::Accepted
    }

    /// Judge the backend's current position and snap it back when rejected.
    pub fn enforce(&mut self, media: &mut dyn MediaHandle) -> PositionVerdict {
        let verdict = self.report_position(media.position());
        if let PositionVerdict::SnapBack(to) = verdict {
            media.seek_to(to);
        }
        verdict
    }

    /// Natural end of media. Bypasses the position check by design: the
    /// player only fires this when playback actually reached the end.
    #[must_use]
    pub fn media_ended(&self) -> CompletionTrigger {
        CompletionTrigger {
            unit: self.unit,
            reason: CompletionReason::MediaEnded,
        }
    }

    /// Reset for a new unit. The trusted marker starts over at zero.
    pub fn reset(&mut self, unit: CourseUnit) {
        self.unit = unit;
        self.last_trusted_position = 0.0;
    }
}

//
// ─── VIEW TRACKER ──────────────────────────────────────────────────────────────
//

/// One-shot read-to-end detection for text/document/slide lessons.
///
/// A sentinel at the end of the content reports its visible intersection
/// ratio; the first observation at or above [`VIEW_THRESHOLD`] fires the
/// completion trigger, and later observations are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTracker {
    unit: CourseUnit,
    fired: bool,
}

impl ViewTracker {
    #[must_use]
    pub fn new(unit: CourseUnit) -> Self {
        Self { unit, fired: false }
    }

    #[must_use]
    pub fn unit(&self) -> CourseUnit {
        self.unit
    }

    #[must_use]
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Observe the sentinel's intersection ratio. Returns a trigger exactly
    /// once per unit.
    pub fn observe(&mut self, intersection_ratio: f64) -> Option<CompletionTrigger> {
        if self.fired || intersection_ratio < VIEW_THRESHOLD {
            return None;
        }
        self.fired = true;
        Some(CompletionTrigger {
            unit: self.unit,
            reason: CompletionReason::ViewedToEnd,
        })
    }

    pub fn reset(&mut self, unit: CourseUnit) {
        self.unit = unit;
        self.fired = false;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
