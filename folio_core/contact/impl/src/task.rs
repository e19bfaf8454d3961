use std::future::Future;

use tokio::task::JoinHandle;

/// A spawned task that is aborted as soon as its handle is dropped.
#[derive(Debug)]
pub(crate) struct ScheduledTask(JoinHandle<()>);

impl ScheduledTask {
    pub(crate) fn spawn(future: impl Future<Output = ()> + Send + 'static) -> Self {
        Self(tokio::spawn(future))
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}
