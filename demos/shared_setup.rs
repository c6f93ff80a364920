use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

use single_run::{Trigger, TriggerResult};

const WORKERS: usize = 8;

static REGISTER_CODECS: Trigger = Trigger::new();
static CODECS: Mutex<Vec<&str>> = Mutex::new(Vec::new());

static OPEN_JOURNAL: TriggerResult<String> = TriggerResult::new();
static JOURNAL_ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

fn register_codecs() {
   REGISTER_CODECS.run(|| {
      let mut codecs = CODECS.lock().unwrap();
      codecs.extend(["gzip", "zstd", "lz4"]);
      println!("[{:?}] registered {} codecs", thread::current().id(), codecs.len());
   });
}

fn open_journal() -> Result<(), &'static String> {
   OPEN_JOURNAL.run(|| {
      let attempt = JOURNAL_ATTEMPTS.fetch_add(1, Ordering::SeqCst) + 1;
      Err(format!("journal locked by another process (attempt {attempt})"))
   })
}

fn main() {
   let start = Arc::new(Barrier::new(WORKERS));
   let workers: Vec<_> = (0..WORKERS)
      .map(|worker| {
         let start = Arc::clone(&start);
         thread::spawn(move || {
            start.wait();
            register_codecs();
            let codecs = CODECS.lock().unwrap().len();
            match open_journal() {
               Ok(()) => println!("worker {worker}: {codecs} codecs, journal open"),
               Err(e) => println!("worker {worker}: {codecs} codecs, journal unavailable: {e}"),
            }
            open_journal().err().cloned()
         })
      })
      .collect();

   let failures: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

   // Every worker saw the registry filled exactly once...
   assert_eq!(CODECS.lock().unwrap().as_slice(), ["gzip", "zstd", "lz4"]);
   // ...and the same single journal failure, from one attempt.
   assert_eq!(JOURNAL_ATTEMPTS.load(Ordering::SeqCst), 1);
   assert!(failures.windows(2).all(|pair| pair[0] == pair[1]));
   println!("shared failure: {:?}", failures[0]);
}
