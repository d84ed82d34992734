#![forbid(unsafe_code)]

//! Pure domain logic for the course progression engine: course definitions,
//! the in-session progress record, gating, aggregation, and playback guards.
//! No I/O lives here.

pub mod aggregate;
pub mod gating;
pub mod model;
pub mod playback;
pub mod time;

pub use gating::CourseUnit;
pub use time::Clock;
