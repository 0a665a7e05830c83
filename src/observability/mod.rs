//! Logging setup for the binary. The library itself only emits events.

pub(crate) mod tracing;

pub use self::tracing::init;
