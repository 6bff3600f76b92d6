//! Core types: time windows, slot rounding, availability grids, free-interval merging
//!
//! Nothing in this crate performs I/O. The remote plumbing lives in
//! `freetime-graph`; this crate only decides which slots are free.

pub mod attendee;
pub mod availability;
pub mod error;
pub mod time;
pub mod tracing;

pub use attendee::{ME, is_me, parse_attendees, resolve_attendee, resolve_attendees};
pub use availability::{
    AvailabilityGrid, FreeInterval, SlotStatus, decode_view, merge_free_intervals,
};
pub use error::{AvailabilityError, AvailabilityResult};
pub use time::{SlotGranularity, TimeWindow, round_to_slot};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
