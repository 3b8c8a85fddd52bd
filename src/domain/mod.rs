//! Domain layer: price readings, job payloads, and diagnostic events.
//!
//! These types are shared by the price job (which produces them) and the
//! ingest API (which accepts their wire form).

pub mod debug_event;
pub mod price_reading;

pub use debug_event::{DebugEvent, FailureKind};
pub use price_reading::{JobMetadata, JobPayload, PRICE_UPDATE_EVENT, PriceReading, parse_iso8601};
