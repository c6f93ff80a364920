//! The four trigger shapes.
//!
//! Each one is a [`SingleRun`] with the outcome type fixed by what the action
//! returns, and a `run` signature that hands the cached outcome back in the
//! most natural borrowed form:
//!
//! | Type                       | Action returns            | `run` returns              |
//! | -------------------------- | ------------------------- | -------------------------- |
//! | [`Trigger`]                | `()`                      | `()`                       |
//! | [`TriggerResult<E>`]       | `Result<(), E>`           | `Result<(), &E>`           |
//! | [`TriggerValue<V>`]        | `V`                       | `&V`                       |
//! | [`TriggerValueResult<V,E>`]| `(V, Result<(), E>)`      | `(&V, Result<(), &E>)`     |
//!
//! A failure returned by the action is a completed run like any other: it is
//! cached and every caller gets a reference to the same `E`.

#[cfg(feature = "async-tokio")]
use core::future::Future;
use core::fmt;

use crate::single_run::SingleRun;

/// Runs a side effect once.
///
/// ```rust
/// use single_run::Trigger;
///
/// let trigger = Trigger::new();
/// let mut hits = 0;
/// trigger.run(|| hits += 1);
/// trigger.run(|| hits += 1);
/// assert_eq!(hits, 1);
/// ```
#[derive(Default)]
pub struct Trigger {
   inner: SingleRun<()>,
}

impl Trigger {
   /// Creates a trigger that has not fired.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self {
         inner: SingleRun::new(),
      }
   }

   /// Returns `true` once an action has completed.
   #[inline]
   pub fn is_done(&self) -> bool {
      self.inner.is_done()
   }

   /// Runs `f` unless an action has already completed.
   #[inline]
   pub fn run<F>(&self, f: F)
   where
      F: FnOnce(),
   {
      self.inner.run(f);
   }

   /// Async form of [`run`](Self::run). Dropping the future mid-action
   /// leaves the trigger unfired.
   #[cfg(feature = "async-tokio")]
   #[inline]
   pub async fn run_async<F, Fut>(&self, f: F)
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = ()>,
   {
      self.inner.run_async(f).await;
   }
}

impl fmt::Debug for Trigger {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Trigger")
         .field("done", &self.is_done())
         .finish()
   }
}

/// Runs a fallible side effect once and replays its failure.
///
/// ```rust
/// use single_run::TriggerResult;
///
/// let trigger = TriggerResult::new();
/// assert_eq!(trigger.run(|| Err("disk full")), Err(&"disk full"));
/// // Not retried: the failure is the outcome.
/// assert_eq!(trigger.run(|| Ok(())), Err(&"disk full"));
/// ```
pub struct TriggerResult<E> {
   inner: SingleRun<Result<(), E>>,
}

impl<E> TriggerResult<E> {
   /// Creates a trigger that has not fired.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self {
         inner: SingleRun::new(),
      }
   }

   /// Returns `true` once an action has completed, successfully or not.
   #[inline]
   pub fn is_done(&self) -> bool {
      self.inner.is_done()
   }

   /// Returns the cached result, or `None` if no action has completed.
   #[inline]
   pub fn get(&self) -> Option<Result<(), &E>> {
      self.inner.get().map(Result::as_ref).map(|r| r.copied())
   }

   /// Runs `f` unless an action has already completed and returns the cached result.
   #[inline]
   pub fn run<F>(&self, f: F) -> Result<(), &E>
   where
      F: FnOnce() -> Result<(), E>,
   {
      self.inner.run(f).as_ref().copied()
   }

   /// Async form of [`run`](Self::run).
   ///
   /// A returned `Err` is cached; a dropped future is not and the next caller
   /// runs the action again.
   #[cfg(feature = "async-tokio")]
   #[inline]
   pub async fn run_async<F, Fut>(&self, f: F) -> Result<(), &E>
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = Result<(), E>>,
   {
      self.inner.run_async(f).await.as_ref().copied()
   }
}

impl<E> Default for TriggerResult<E> {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

impl<E: fmt::Debug> fmt::Debug for TriggerResult<E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_tuple("TriggerResult").field(&self.inner).finish()
   }
}

/// Computes a value once and hands every caller the same one.
pub struct TriggerValue<V> {
   inner: SingleRun<V>,
}

impl<V> TriggerValue<V> {
   /// Creates a trigger that has not fired.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self {
         inner: SingleRun::new(),
      }
   }

   /// Returns `true` once the value has been computed.
   #[inline]
   pub fn is_done(&self) -> bool {
      self.inner.is_done()
   }

   /// Returns the cached value without computing it.
   #[inline]
   pub fn get(&self) -> Option<&V> {
      self.inner.get()
   }

   /// Computes the value with `f` unless it is already cached.
   #[inline]
   pub fn run<F>(&self, f: F) -> &V
   where
      F: FnOnce() -> V,
   {
      self.inner.run(f)
   }

   /// Computes the value with an async action unless it is already cached.
   #[cfg(feature = "async-tokio")]
   #[inline]
   pub async fn run_async<F, Fut>(&self, f: F) -> &V
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = V>,
   {
      self.inner.run_async(f).await
   }

   /// Consumes the trigger and returns the cached value, if any.
   #[inline]
   pub fn into_inner(self) -> Option<V> {
      self.inner.into_inner()
   }
}

impl<T, E> TriggerValue<Result<T, E>> {
   /// Runs an action returning `Result<T, E>` once and replays either side.
   ///
   /// An `Err` is cached like an `Ok`; the action is not retried.
   ///
   /// ```rust
   /// use single_run::TriggerValue;
   ///
   /// let port = TriggerValue::new();
   /// assert_eq!(port.try_run(|| "8080".parse::<u16>()), Ok(&8080));
   /// assert_eq!(port.try_run(|| "x".parse::<u16>()), Ok(&8080));
   /// ```
   #[inline]
   pub fn try_run<F>(&self, f: F) -> Result<&T, &E>
   where
      F: FnOnce() -> Result<T, E>,
   {
      self.inner.run(f).as_ref()
   }

   /// Async form of [`try_run`](Self::try_run).
   #[cfg(feature = "async-tokio")]
   #[inline]
   pub async fn try_run_async<F, Fut>(&self, f: F) -> Result<&T, &E>
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = Result<T, E>>,
   {
      self.inner.run_async(f).await.as_ref()
   }
}

impl<V> Default for TriggerValue<V> {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

impl<V: fmt::Debug> fmt::Debug for TriggerValue<V> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_tuple("TriggerValue").field(&self.inner).finish()
   }
}

/// Computes a value and a possible failure once, and replays both.
///
/// Unlike `TriggerValue<Result<V, E>>`, the action always produces a value,
/// even when it also reports a failure.
pub struct TriggerValueResult<V, E> {
   inner: SingleRun<(V, Result<(), E>)>,
}

impl<V, E> TriggerValueResult<V, E> {
   /// Creates a trigger that has not fired.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self {
         inner: SingleRun::new(),
      }
   }

   /// Returns `true` once an action has completed.
   #[inline]
   pub fn is_done(&self) -> bool {
      self.inner.is_done()
   }

   /// Returns the cached pair without running anything.
   #[inline]
   pub fn get(&self) -> Option<(&V, Result<(), &E>)> {
      self.inner.get().map(split)
   }

   /// Runs `f` unless an action has already completed and returns the cached pair.
   #[inline]
   pub fn run<F>(&self, f: F) -> (&V, Result<(), &E>)
   where
      F: FnOnce() -> (V, Result<(), E>),
   {
      split(self.inner.run(f))
   }

   /// Async form of [`run`](Self::run).
   #[cfg(feature = "async-tokio")]
   #[inline]
   pub async fn run_async<F, Fut>(&self, f: F) -> (&V, Result<(), &E>)
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = (V, Result<(), E>)>,
   {
      split(self.inner.run_async(f).await)
   }
}

#[inline]
fn split<V, E>(outcome: &(V, Result<(), E>)) -> (&V, Result<(), &E>) {
   (&outcome.0, outcome.1.as_ref().copied())
}

impl<V, E> Default for TriggerValueResult<V, E> {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

impl<V: fmt::Debug, E: fmt::Debug> fmt::Debug for TriggerValueResult<V, E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_tuple("TriggerValueResult")
         .field(&self.inner)
         .finish()
   }
}
