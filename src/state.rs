//! Completion flag and executor lock for a run-once guard.
//!
//! Both live in one `AtomicU8` so that the completed case costs a single
//! acquire load:
//! - Bit 0: DONE - the outcome has been written
//! - Bit 1: LOCKED - a caller holds the right to execute the action
//! - Bit 2: WAITING - at least one caller is parked on the state word
//! - Bits 3-7: EPOCH - bumped on every release so a parked caller never sleeps
//!   through a state change it has not seen
//!
//! Callers that lose the race park on the address of the state word through
//! `parking_lot_core` and are woken when the executor commits or abandons.

use core::mem;
use core::sync::atomic::{AtomicU8, Ordering};

use parking_lot_core::{DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN};

use crate::tracing_compat::{debug, trace};

/// Completion flag plus executor lock.
#[repr(transparent)]
pub(crate) struct RunState(AtomicU8);

impl RunState {
   const DONE: u8 = 1;
   const LOCKED: u8 = 2;
   const WAITING: u8 = 4;
   const EPOCH_1: u8 = 8;
   const EPOCH_MASK: u8 = !(Self::DONE | Self::LOCKED | Self::WAITING);

   #[inline(always)]
   const fn next_epoch(current: u8) -> u8 {
      (current & Self::EPOCH_MASK).wrapping_add(Self::EPOCH_1) & Self::EPOCH_MASK
   }

   /// A pending state: not run, unlocked, nobody waiting.
   #[inline]
   pub(crate) const fn pending() -> Self {
      Self(AtomicU8::new(0))
   }

   /// Loads the completion flag.
   ///
   /// With `Acquire` ordering a `true` result makes the outcome written before
   /// [`RunGuard::commit`] visible to the caller.
   #[inline]
   pub(crate) fn is_done(&self, ordering: Ordering) -> bool {
      self.0.load(ordering) & Self::DONE != 0
   }

   #[inline]
   fn notify_all(&self) {
      // SAFETY: the key is the address of the state word, the same key used by `wait`.
      unsafe {
         parking_lot_core::unpark_all(self.0.as_ptr() as usize, DEFAULT_UNPARK_TOKEN);
      }
   }

   /// Parks the current thread while the state word still equals `expected`.
   #[inline]
   fn wait(&self, expected: u8) {
      trace!(target: "single_run", state = expected, "parking until the executor finishes");
      // SAFETY: see `notify_all`.
      unsafe {
         // The validate closure runs under the bucket lock, so a release that
         // happens before we sleep is never missed.
         let _ = parking_lot_core::park(
            self.0.as_ptr() as usize,
            || self.0.load(Ordering::Acquire) == expected,
            || {},
            |_, _| {},
            DEFAULT_PARK_TOKEN,
            None,
         );
      }
      // Spurious or not, the caller re-reads the state.
   }

   /// Swaps in `new` (plus a fresh epoch) and wakes parked callers if any.
   /// Returns the previous state word.
   #[inline]
   fn release(&self, new: u8) -> u8 {
      let current = self.0.load(Ordering::Relaxed);
      // Release publishes the outcome write to every later `Acquire` load.
      let prev = self.0.swap(new | Self::next_epoch(current), Ordering::Release);
      if prev & Self::WAITING != 0 {
         self.notify_all();
      }
      prev
   }

   /// One attempt at the slow path.
   ///
   /// - `Ok(None)`: already `Done`, nothing to execute.
   /// - `Ok(Some(guard))`: this caller is now the executor.
   /// - `Err(state)`: another caller holds the lock; `state` has WAITING set.
   fn lock_step(&self) -> Result<Option<RunGuard<'_>>, u8> {
      loop {
         let current = self.0.load(Ordering::Acquire);
         // Re-check: someone may have finished while we were blocked.
         if current & Self::DONE != 0 {
            return Ok(None);
         }

         if current & Self::LOCKED == 0 {
            match self.0.compare_exchange_weak(
               current,
               current | Self::LOCKED,
               Ordering::Acquire,
               Ordering::Relaxed,
            ) {
               Ok(_) => {
                  trace!(target: "single_run", "acquired run lock, executing action");
                  return Ok(Some(RunGuard { state: self }));
               }
               Err(_) => {
                  std::hint::spin_loop();
                  continue;
               }
            }
         }

         if current & Self::WAITING == 0 {
            let waiting = current | Self::WAITING;
            match self.0.compare_exchange_weak(
               current,
               waiting,
               Ordering::Relaxed,
               Ordering::Relaxed,
            ) {
               Ok(_) => return Err(waiting),
               Err(_) => {
                  std::hint::spin_loop();
                  continue;
               }
            }
         }

         return Err(current);
      }
   }

   /// Blocks until this caller is the executor or the state is `Done`.
   ///
   /// Returns `None` when another caller completed the run first.
   pub(crate) fn lock(&self) -> Option<RunGuard<'_>> {
      loop {
         match self.lock_step() {
            Ok(guard) => return guard,
            Err(observed) => self.wait(observed),
         }
      }
   }

   /// Async counterpart of [`lock`](Self::lock).
   ///
   /// Yields to the scheduler while the executor works; on a multi-thread
   /// runtime it eventually parks inside `block_in_place` instead of spinning.
   #[cfg(feature = "async-tokio")]
   pub(crate) async fn lock_async(&self) -> Option<RunGuard<'_>> {
      loop {
         for _ in 0..16 {
            let observed = match self.lock_step() {
               Ok(guard) => return guard,
               Err(observed) => observed,
            };
            for _ in 0..32 {
               tokio::task::yield_now().await;
               if self.0.load(Ordering::Relaxed) != observed {
                  break;
               }
            }
         }

         #[cfg(feature = "async-tokio-mt")]
         {
            if let Some(acquired) = self.park_in_place() {
               return acquired;
            }
         }
      }
   }

   /// Parks the worker thread until the state word changes.
   ///
   /// `block_in_place` panics on a current-thread runtime, so there this
   /// returns `None` without parking and the caller goes back to yielding.
   #[cfg(feature = "async-tokio-mt")]
   fn park_in_place(&self) -> Option<Option<RunGuard<'_>>> {
      use tokio::runtime::{Handle, RuntimeFlavor};

      let multi_thread = Handle::try_current()
         .is_ok_and(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread);
      if !multi_thread {
         return None;
      }
      match self.lock_step() {
         Ok(acquired) => Some(acquired),
         Err(observed) => {
            tokio::task::block_in_place(|| self.wait(observed));
            None
         }
      }
   }
}

/// Executor's hold on the lock.
///
/// [`commit`](Self::commit) marks the run `Done`. Dropping the guard instead
/// (the action panicked, or its future was dropped) puts the state back to
/// pending and wakes waiters so one of them can run the action.
pub(crate) struct RunGuard<'a> {
   state: &'a RunState,
}

impl RunGuard<'_> {
   /// Marks the run `Done` and wakes every parked caller.
   ///
   /// The outcome must already be written.
   #[inline]
   pub(crate) fn commit(self) {
      let prev = self.state.release(RunState::DONE);
      debug_assert!(prev & RunState::DONE == 0, "run committed twice");
      trace!(target: "single_run", "outcome committed");
      mem::forget(self);
   }
}

impl Drop for RunGuard<'_> {
   #[cold]
   fn drop(&mut self) {
      debug!(
         target: "single_run",
         panicking = std::thread::panicking(),
         "action did not complete, run left pending"
      );
      self.state.release(0);
   }
}
