// background.rs - detached work that outlives the request that started it
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio_util::task::TaskTracker;

/// Spawn `fut` on the tracker so shutdown can wait for it. A panic inside the
/// task is logged and goes no further.
pub fn spawn<F>(tasks: &TaskTracker, name: &'static str, fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tasks.spawn(async move {
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            tracing::error!(task = name, "background task panicked: {}", panic_message(&*panic));
        }
    });
}

pub fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}
