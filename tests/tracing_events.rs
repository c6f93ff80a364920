#![cfg(all(feature = "tracing", panic = "unwind"))]

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use single_run::{SingleRun, TriggerValue};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone)]
struct Recorded {
   level: Level,
   target: String,
   message: String,
   fields: Vec<String>,
}

#[derive(Clone, Default)]
struct EventRecorder {
   events: Arc<Mutex<Vec<Recorded>>>,
}

struct FieldVisitor<'a>(&'a mut Recorded);

impl Visit for FieldVisitor<'_> {
   fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
      if field.name() == "message" {
         self.0.message = format!("{value:?}");
      } else {
         self.0.fields.push(format!("{}={value:?}", field.name()));
      }
   }
}

impl<S: Subscriber> Layer<S> for EventRecorder {
   fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
      let meta = event.metadata();
      let mut recorded = Recorded {
         level: *meta.level(),
         target: meta.target().to_string(),
         message: String::new(),
         fields: Vec::new(),
      };
      event.record(&mut FieldVisitor(&mut recorded));
      self.events.lock().unwrap().push(recorded);
   }
}

impl EventRecorder {
   fn messages(&self) -> Vec<String> {
      self.events
         .lock()
         .unwrap()
         .iter()
         .map(|e| e.message.clone())
         .collect()
   }

   fn find(&self, message: &str) -> Option<Recorded> {
      self.events
         .lock()
         .unwrap()
         .iter()
         .find(|e| e.message == message)
         .cloned()
   }

   fn record<R>(&self, f: impl FnOnce() -> R) -> R {
      let subscriber = tracing_subscriber::registry().with(self.clone());
      tracing::subscriber::with_default(subscriber, f)
   }
}

#[test]
fn test_executor_events() {
   let recorder = EventRecorder::default();
   let guard: SingleRun<u32> = SingleRun::new();

   recorder.record(|| {
      guard.run(|| 1);
   });
   assert_eq!(
      recorder.messages(),
      ["acquired run lock, executing action", "outcome committed"]
   );
   let acquired = recorder.find("acquired run lock, executing action").unwrap();
   assert_eq!(acquired.level, Level::TRACE);
   assert_eq!(acquired.target, "single_run");

   // Once done, the fast path emits nothing.
   recorder.record(|| {
      guard.run(|| 2);
   });
   assert_eq!(recorder.messages().len(), 2);
}

#[test]
fn test_abandoned_run_event() {
   let recorder = EventRecorder::default();
   let guard: SingleRun<u32> = SingleRun::new();

   let unwound = recorder.record(|| {
      panic::catch_unwind(AssertUnwindSafe(|| guard.run(|| panic!("action failed"))))
   });
   assert!(unwound.is_err());

   let abandoned = recorder
      .find("action did not complete, run left pending")
      .expect("abandon event recorded");
   assert_eq!(abandoned.level, Level::DEBUG);
   assert_eq!(abandoned.target, "single_run");
   assert!(abandoned.fields.contains(&"panicking=true".to_string()));
   assert!(recorder.find("outcome committed").is_none());
}

#[test]
fn test_waiter_parking_event() {
   let recorder = EventRecorder::default();
   let guard = Arc::new(TriggerValue::new());
   let (started_tx, started_rx) = mpsc::channel();

   let executor = {
      let guard = Arc::clone(&guard);
      thread::spawn(move || {
         guard.run(|| {
            started_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(50));
            "done"
         });
      })
   };

   started_rx.recv().unwrap();
   let value = recorder.record(|| *guard.run(|| "waiter ran"));
   executor.join().unwrap();

   assert_eq!(value, "done");
   let parked = recorder
      .find("parking until the executor finishes")
      .expect("waiter parked behind the executor");
   assert_eq!(parked.level, Level::TRACE);
   assert!(parked.fields.iter().any(|f| f.starts_with("state=")));
   assert!(recorder.find("acquired run lock, executing action").is_none());
}
