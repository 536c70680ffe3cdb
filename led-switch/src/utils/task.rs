//! Defines the task runner used by devices to run their asynchronous work.
use std::future::Future;

use log::error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::errors::Error;

/// Represents the result of a task.
/// A task may return either () or Result<(), Error> for flexibility which
/// will be converted to TaskResult.
pub enum TaskResult {
    Ok,
    Err(Error),
}

/// Represents a handler to a running task: await it to wait for completion, abort it to cancel.
pub type TaskHandler = JoinHandle<Result<(), Error>>;

impl From<Result<(), Error>> for TaskResult {
    fn from(result: Result<(), Error>) -> Self {
        match result {
            Ok(_) => TaskResult::Ok,
            Err(e) => TaskResult::Err(e),
        }
    }
}

impl From<()> for TaskResult {
    fn from(_: ()) -> Self {
        TaskResult::Ok
    }
}

/// Runs a given future as a tokio task on the current runtime.
/// A failing task has its error logged before being handed back through the handler.
///
/// # Parameters
/// * `future`: A future that implements `Future<Output = T>`, `Send`, and has a `'static` lifetime.
///
/// # Errors
/// * `Runtime`: no tokio runtime is running on the current thread.
///
/// # Example
/// ```
/// use led_switch::utils::task;
///
/// #[tokio::main]
/// async fn main() {
///     let handler = task::run(async move {
///         // whatever
///     }).unwrap();
///     handler.await.unwrap().unwrap();
/// }
/// ```
pub fn run<F, T>(future: F) -> Result<TaskHandler, Error>
where
    F: Future<Output = T> + Send + 'static,
    T: Into<TaskResult> + Send + 'static,
{
    let runtime = Handle::try_current().map_err(|_| Error::Runtime)?;

    Ok(runtime.spawn(async move {
        match future.await.into() {
            TaskResult::Ok => Ok(()),
            TaskResult::Err(err) => {
                error!("Task failed: {}", err);
                Err(err)
            }
        }
    }))
}

#[macro_export]
macro_rules! pause {
    ($ms:expr) => {
        $crate::utils::tokio::time::sleep($crate::utils::tokio::time::Duration::from_millis(
            $ms as u64,
        ))
        .await
    };
}
