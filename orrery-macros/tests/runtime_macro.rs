use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use orrery::utils::task;

#[orrery_macros::runtime]
async fn runtime_with_tasks(flag: Arc<AtomicBool>) {
    task::run(async move {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        flag.store(true, Ordering::SeqCst);
    })
    .unwrap();
}

#[test]
#[serial_test::serial]
fn test_runtime_waits_for_spawned_tasks() {
    let flag = Arc::new(AtomicBool::new(false));

    let start = SystemTime::now();
    runtime_with_tasks(flag.clone());
    let duration = start.elapsed().unwrap().as_millis();

    assert!(
        flag.load(Ordering::SeqCst),
        "The spawned task completed before the runtime returned"
    );
    assert!(
        duration >= 100,
        "The runtime waited for the spawned task (took {}ms)",
        duration
    );
}

#[orrery_macros::test]
#[serial_test::serial]
async fn test_test_macro_provides_a_runtime() {
    let handler = task::run(async move {}).expect("task::run works under the test macro");
    let _ = handler.await;
}

#[orrery_macros::runtime]
async fn runtime_with_return_value() -> Result<u8, orrery::errors::Error> {
    Ok(42)
}

#[test]
#[serial_test::serial]
fn test_runtime_preserves_the_return_value() {
    assert_eq!(runtime_with_return_value().unwrap(), 42);
}
