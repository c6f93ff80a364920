use single_run::{TriggerResult, TriggerValueResult};

static CONNECT: TriggerResult<String> = TriggerResult::new();
static SCAN: TriggerValueResult<u32, &str> = TriggerValueResult::new();

fn connect(fail: bool) -> Result<(), &'static String> {
   CONNECT.run(|| {
      println!("Connecting (fail={})...", fail);
      if fail {
         Err("connection refused".to_string())
      } else {
         Ok(())
      }
   })
}

fn main() {
   // First attempt fails, and the failure is the outcome from now on.
   match connect(true) {
      Ok(()) => panic!("Should have failed"),
      Err(e) => println!("Caught error: {}", e),
   }
   assert!(CONNECT.is_done());

   // Not retried: a later caller gets the same failure without reconnecting.
   match connect(false) {
      Ok(()) => panic!("Failure should have been replayed"),
      Err(e) => println!("Replayed error: {}", e),
   }

   // A value and a failure can be produced together.
   let (records, err) = SCAN.run(|| (17, Err("truncated input")));
   println!("Read {} records, error: {:?}", records, err);
   assert_eq!(SCAN.get(), Some((&17, Err(&"truncated input"))));
}
