//! Run-exactly-once guards that cache and replay their outcome.
//!
//! A guard runs the action handed to its first caller, stores whatever the
//! action returns, and gives that same stored outcome to every caller after
//! it, including the ones that were racing it. A returned failure is an
//! outcome like any other and is replayed, not retried.
//!
//! - [`Trigger`]: a side effect with no result.
//! - [`TriggerResult<E>`]: a side effect that may fail.
//! - [`TriggerValue<V>`]: a computed value.
//! - [`TriggerValueResult<V, E>`]: a computed value plus a possible failure.
//!
//! All four share one generic core, [`SingleRun<T>`].
//!
//! # Features
//!
//! - **Lock-free fast path**: once done, `run` is a single acquire load.
//! - **Blocking slow path**: callers that lose the race park on a futex until
//!   the executor finishes.
//! - **Panics are not runs**: if the action panics, nothing is cached and the
//!   next caller runs it again.
//! - **Async actions**: `run_async` with the `async-tokio` feature.
//! - **Zero setup**: every guard is `Default` and `const`-constructible.
//!
//! # Examples
//!
//! ```rust
//! use single_run::{TriggerValue, TriggerValueResult};
//!
//! static SETTINGS: TriggerValue<Vec<&str>> = TriggerValue::new();
//!
//! let settings = SETTINGS.run(|| vec!["verbose", "color"]);
//! assert_eq!(settings.len(), 2);
//!
//! let scan = TriggerValueResult::new();
//! let (value, err) = scan.run(|| ("partial", Err("timed out")));
//! assert_eq!((value, err), (&"partial", Err(&"timed out")));
//! ```
//!
//! A guard blocks forever if its action never returns; there is no timeout.

/// Generic run-once core.
mod single_run;

/// Completion flag and executor lock.
mod state;

/// The four trigger shapes.
mod trigger;

/// Slow-path event macros.
mod tracing_compat;

pub use single_run::SingleRun;
pub use trigger::{Trigger, TriggerResult, TriggerValue, TriggerValueResult};
