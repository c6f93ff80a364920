//! Generic run-once guard.
//!
//! [`SingleRun<T>`] runs an action at most once and caches whatever it
//! returns. Every caller, concurrent or late, gets a reference to that one
//! cached outcome. The four trigger types in this crate are thin wrappers over
//! it with `T` chosen per shape.
//!
//! The completed case is one acquire load. Until then callers take the slow
//! path: acquire the executor lock, re-check, and either run the action or
//! find that someone else already did.

use core::cell::UnsafeCell;
#[cfg(feature = "async-tokio")]
use core::future::Future;
use core::sync::atomic::Ordering;
use core::{fmt, mem};

use crate::state::RunState;

/// A guard that runs an action exactly once and replays its outcome.
///
/// Only an action that *returns* counts as a completed run. If the action
/// panics, the lock is released, nothing is cached, and the next caller runs
/// the action again.
///
/// ```rust
/// use single_run::SingleRun;
///
/// static GREETING: SingleRun<String> = SingleRun::new();
///
/// let first = GREETING.run(|| "hello".to_string());
/// let second = GREETING.run(|| unreachable!());
/// assert!(core::ptr::eq(first, second));
/// ```
pub struct SingleRun<T> {
   outcome: UnsafeCell<mem::MaybeUninit<T>>,
   state: RunState,
}

impl<T> SingleRun<T> {
   /// Creates a guard that has not run yet.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self {
         state: RunState::pending(),
         outcome: UnsafeCell::new(mem::MaybeUninit::uninit()),
      }
   }

   /// Returns `true` once an action has completed. Never blocks.
   #[inline]
   pub fn is_done(&self) -> bool {
      self.state.is_done(Ordering::Acquire)
   }

   /// Returns the cached outcome, or `None` if no action has completed yet.
   ///
   /// A run that is still in flight looks the same as one that never started.
   #[inline]
   pub fn get(&self) -> Option<&T> {
      if self.is_done() {
         // SAFETY: DONE was observed with Acquire, so the outcome is written.
         Some(unsafe { self.outcome_unchecked() })
      } else {
         None
      }
   }

   /// Consumes the guard and returns the cached outcome, if any.
   ///
   /// The outcome is never handed out mutably while the guard lives: every
   /// `run` replays exactly what the action produced.
   #[inline]
   pub fn into_inner(self) -> Option<T> {
      let mut this = mem::ManuallyDrop::new(self);
      if this.is_done() {
         // SAFETY: the outcome is written; `this` is never dropped, so it is
         // read out exactly once.
         Some(unsafe { this.outcome.get_mut().assume_init_read() })
      } else {
         None
      }
   }

   /// Runs `f` if no action has completed yet and returns the cached outcome.
   ///
   /// Concurrent callers block until the single executor finishes and then
   /// all see the same outcome. If `f` panics, the panic propagates to this
   /// caller and the guard stays pending.
   #[inline]
   pub fn run<F>(&self, f: F) -> &T
   where
      F: FnOnce() -> T,
   {
      if let Some(outcome) = self.get() {
         return outcome;
      }
      self.run_slow(f);
      // SAFETY: `run_slow` only returns once the outcome is written.
      unsafe { self.outcome_unchecked() }
   }

   /// Async form of [`run`](Self::run).
   ///
   /// Dropping the returned future while it runs `f` leaves the guard pending,
   /// the same as a panic.
   #[cfg(feature = "async-tokio")]
   #[inline]
   pub async fn run_async<F, Fut>(&self, f: F) -> &T
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = T>,
   {
      if let Some(outcome) = self.get() {
         return outcome;
      }
      self.run_slow_async(f).await;
      // SAFETY: `run_slow_async` only returns once the outcome is written.
      unsafe { self.outcome_unchecked() }
   }

   /// # Safety
   ///
   /// The outcome must be written and its DONE flag observed with `Acquire`.
   #[inline]
   unsafe fn outcome_unchecked(&self) -> &T {
      debug_assert!(self.is_done(), "outcome read before the run completed");
      (*self.outcome.get()).assume_init_ref()
   }

   #[cold]
   fn run_slow<F>(&self, f: F)
   where
      F: FnOnce() -> T,
   {
      let Some(guard) = self.state.lock() else {
         return; // Finished by another caller while we were blocked.
      };
      // If `f` unwinds, `guard` is dropped and the state goes back to pending.
      let outcome = f();
      // SAFETY: we hold the lock and DONE is unset, so nobody reads the cell.
      unsafe { (*self.outcome.get()).write(outcome) };
      guard.commit();
   }

   #[cfg(feature = "async-tokio")]
   #[cold]
   async fn run_slow_async<F, Fut>(&self, f: F)
   where
      F: FnOnce() -> Fut,
      Fut: Future<Output = T>,
   {
      let Some(guard) = self.state.lock_async().await else {
         return;
      };
      let outcome = f().await;
      // SAFETY: we hold the lock and DONE is unset, so nobody reads the cell.
      unsafe { (*self.outcome.get()).write(outcome) };
      guard.commit();
   }
}

// SAFETY: the outcome is written once under the lock and then only shared
// by reference, so sharing the guard needs `T: Sync`. It may be written by
// one thread and dropped by another, hence `T: Send`.
unsafe impl<T: Send + Sync> Sync for SingleRun<T> {}
// SAFETY: moving the guard moves the outcome with it.
unsafe impl<T: Send> Send for SingleRun<T> {}

impl<T> Default for SingleRun<T> {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

impl<T: fmt::Debug> fmt::Debug for SingleRun<T> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("SingleRun");
      match self.get() {
         Some(outcome) => d.field(outcome),
         None => d.field(&format_args!("<pending>")),
      };
      d.finish()
   }
}

impl<T> Drop for SingleRun<T> {
   #[inline]
   fn drop(&mut self) {
      if self.is_done() {
         // SAFETY: the outcome is written and nothing can observe it after drop.
         unsafe { self.outcome.get_mut().assume_init_drop() };
      }
   }
}
