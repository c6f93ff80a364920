//! Slow-path event macros.
//!
//! With the `tracing` feature these are the `tracing` macros. Without it they
//! expand to nothing, so the guard carries no logging cost at all.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
mod noop {
   macro_rules! trace {
      ($($arg:tt)*) => {};
   }

   macro_rules! debug {
      ($($arg:tt)*) => {};
   }

   pub(crate) use {debug, trace};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use noop::{debug, trace};
