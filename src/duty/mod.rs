//! Duties: possibly asynchronous tasks with access to the store and dispatch.
//!
//! Duties orchestrate, reducers transform. A duty gets a snapshot of the
//! store, a [`StoreKit`] to dispatch and call other duties, and a
//! [`Lifecycle`] to hook start and finish. Its result is a [`DutyCall`],
//! ready or pending.

mod kit;

use std::collections::BTreeMap;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::sync::Arc;

use futures_core::future::BoxFuture;
use serde_json::Value;
use tokio::task::{JoinError, JoinHandle};

use crate::registry::Registry;
use crate::store::Store;

pub use kit::{CallOf, StoreKit};

type DutyFn = dyn Fn(Store, StoreKit, &mut Lifecycle) -> DutyCall + Send + Sync;

/// Shared handle to a duty task.
#[derive(Clone)]
pub struct Duty(Arc<DutyFn>);

/// Duties of one store, keyed by duty name.
pub type DutyTable = BTreeMap<String, Duty>;

impl Duty {
    pub fn new<F>(task: F) -> Self
    where
        F: Fn(Store, StoreKit, &mut Lifecycle) -> DutyCall + Send + Sync + 'static,
    {
        Duty(Arc::new(task))
    }

    pub fn ptr_eq(&self, other: &Duty) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn call(&self, store: Store, kit: StoreKit, lifecycle: &mut Lifecycle) -> DutyCall {
        (self.0)(store, kit, lifecycle)
    }
}

impl fmt::Debug for Duty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Duty(..)")
    }
}

/// Result of running a duty.
pub enum DutyCall {
    Ready(Value),
    Pending(BoxFuture<'static, Value>),
}

impl DutyCall {
    pub fn ready(value: impl Into<Value>) -> Self {
        DutyCall::Ready(value.into())
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Value> + Send + 'static,
    {
        DutyCall::Pending(Box::pin(future))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, DutyCall::Pending(_))
    }

    /// The value of a ready call.
    pub fn ready_value(&self) -> Option<&Value> {
        match self {
            DutyCall::Ready(value) => Some(value),
            DutyCall::Pending(_) => None,
        }
    }

    /// Drive the call on the current tokio runtime.
    ///
    /// # Panics
    /// When called outside of a tokio runtime.
    pub fn spawn(self) -> DutyHandle {
        DutyHandle {
            handle: tokio::spawn(self.into_future()),
        }
    }
}

impl IntoFuture for DutyCall {
    type Output = Value;
    type IntoFuture = BoxFuture<'static, Value>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            DutyCall::Ready(value) => Box::pin(std::future::ready(value)),
            DutyCall::Pending(future) => future,
        }
    }
}

impl fmt::Debug for DutyCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DutyCall::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            DutyCall::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// Cancellable handle to a spawned duty.
#[derive(Debug)]
pub struct DutyHandle {
    handle: JoinHandle<Value>,
}

impl DutyHandle {
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn join(self) -> Result<Value, JoinError> {
        self.handle.await
    }
}

type SyncFinished = Box<dyn FnOnce(&Value) + Send>;
type AsyncFinished = Box<dyn FnOnce(Value) -> BoxFuture<'static, ()> + Send>;

enum Finished {
    Sync(SyncFinished),
    Async(AsyncFinished),
}

/// Start and finish hooks handed to a running duty.
pub struct Lifecycle {
    off_start: bool,
    finished: Option<Finished>,
}

impl Lifecycle {
    fn new(off_start: bool) -> Self {
        Self {
            off_start,
            finished: None,
        }
    }

    /// Run `callback` now, unless the caller suppressed start callbacks.
    pub fn on_start(&mut self, callback: impl FnOnce()) {
        if self.off_start {
            tracing::trace!("Start callback suppressed");
            return;
        }
        callback();
    }

    /// Run `callback` with the duty's result once it is available.
    ///
    /// Replaces any previously registered finished callback.
    pub fn on_finished<F>(&mut self, callback: F)
    where
        F: FnOnce(&Value) + Send + 'static,
    {
        self.finished = Some(Finished::Sync(Box::new(callback)));
    }

    /// Like [`Lifecycle::on_finished`] with asynchronous work that is awaited
    /// before a pending call resolves. The call still resolves to the duty's
    /// own value.
    pub fn on_finished_async<F, Fut>(&mut self, callback: F)
    where
        F: FnOnce(Value) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.finished = Some(Finished::Async(Box::new(move |value| Box::pin(callback(value)))));
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("off_start", &self.off_start)
            .field("finished", &self.finished.is_some())
            .finish()
    }
}

/// Options of one duty run.
#[derive(Debug, Clone, Default)]
pub struct DutyOptions {
    /// Skip callbacks registered with [`Lifecycle::on_start`].
    pub off_start: bool,
    /// Skip the finished callback.
    pub off_finished: bool,
    /// Store whose tables the duty's kit is scoped to.
    pub store: Option<String>,
}

impl DutyOptions {
    pub fn in_store(store: impl Into<String>) -> Self {
        Self {
            store: Some(store.into()),
            ..Self::default()
        }
    }
}

/// Runs duties against a registry.
#[derive(Debug, Clone)]
pub struct DutyExecutor {
    registry: Registry,
}

impl DutyExecutor {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Run `duty` and wire its finished callback to the result.
    ///
    /// A ready result fires a sync callback right away; an async one is
    /// spawned on the current tokio runtime, or dropped outside of one. A
    /// pending result resolves only after the callback, including its async
    /// work, has completed, and still resolves to the duty's own value.
    pub fn run(&self, duty: &Duty, options: &DutyOptions) -> DutyCall {
        let mut lifecycle = Lifecycle::new(options.off_start);
        let kit = StoreKit::new(self.registry.clone(), options.store.clone());
        let call = duty.call(self.registry.store(), kit, &mut lifecycle);

        let finished = if options.off_finished {
            None
        } else {
            lifecycle.finished.take()
        };

        tracing::debug!(
            store = options.store.as_deref().unwrap_or("-"),
            pending = call.is_pending(),
            "Duty started"
        );

        match (call, finished) {
            (call, None) => call,
            (DutyCall::Ready(value), Some(Finished::Sync(callback))) => {
                callback(&value);
                DutyCall::Ready(value)
            }
            (DutyCall::Ready(value), Some(Finished::Async(callback))) => {
                let work = callback(value.clone());
                match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        runtime.spawn(work);
                    }
                    Err(_) => {
                        tracing::warn!("No tokio runtime, async finished callback dropped");
                    }
                }
                DutyCall::Ready(value)
            }
            (DutyCall::Pending(future), Some(finished)) => DutyCall::pending(async move {
                let value = future.await;
                match finished {
                    Finished::Sync(callback) => callback(&value),
                    Finished::Async(callback) => callback(value.clone()).await,
                }
                tracing::debug!("Duty finished");
                value
            }),
        }
    }
}
