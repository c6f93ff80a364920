use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use single_run::TriggerValue;
use tokio::time::{sleep, Duration};

static ATTEMPTS: AtomicUsize = AtomicUsize::new(0);

/// Fetches a session token. The first attempt crashes mid-way.
async fn fetch_token() -> String {
   let attempt = ATTEMPTS.fetch_add(1, Ordering::SeqCst) + 1;
   sleep(Duration::from_millis(20)).await;
   if attempt == 1 {
      panic!("token service dropped the connection");
   }
   format!("token-{attempt}")
}

#[tokio::main]
async fn main() {
   let session = Arc::new(TriggerValue::new());

   // A panic is not a completed run: the trigger stays unfired.
   let crashed = tokio::spawn({
      let session = Arc::clone(&session);
      async move {
         session.run_async(fetch_token).await.clone()
      }
   })
   .await;
   assert!(crashed.unwrap_err().is_panic());
   assert!(!session.is_done());
   println!("first attempt crashed, trigger still pending");

   // The next wave of tasks retries; exactly one of them fetches.
   let tasks: Vec<_> = (0..6)
      .map(|task| {
         let session = Arc::clone(&session);
         tokio::spawn(async move {
            let token = session.run_async(fetch_token).await;
            println!("task {task} got {token}");
            token.clone()
         })
      })
      .collect();

   for task in tasks {
      assert_eq!(task.await.unwrap(), "token-2");
   }
   assert_eq!(ATTEMPTS.load(Ordering::SeqCst), 2);
   assert_eq!(session.get().map(String::as_str), Some("token-2"));
}
