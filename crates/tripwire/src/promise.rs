// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Debug};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

type Continuation<T, E> = Box<dyn FnOnce(&Result<T, E>) + Send>;

enum State<T, E> {
    Pending {
        continuations: Vec<Continuation<T, E>>,
        wakers: Vec<Waker>,
    },
    Settled(Arc<Result<T, E>>),
}

/// A pending operation whose success or failure is determined later.
///
/// Continuations registered with [`on_fulfilled`][Promise::on_fulfilled],
/// [`on_rejected`][Promise::on_rejected] and [`on_settled`][Promise::on_settled]
/// run exactly once, in registration order, when the promise settles. A
/// continuation registered on an already settled promise runs immediately.
///
/// Clones refer to the same operation. Settling happens through the paired
/// [`Deferred`], or through the driver returned by [`Promise::from_future`].
///
/// Continuations run whether or not anyone still holds a `Promise` handle;
/// there is no way to cancel them.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// use tripwire::Deferred;
///
/// let deferred = Deferred::<u32, String>::new();
/// let promise = deferred.promise();
///
/// let failed = Arc::new(AtomicBool::new(false));
/// let failed_clone = Arc::clone(&failed);
/// promise.on_rejected(move |_reason| failed_clone.store(true, Ordering::SeqCst));
///
/// deferred.reject("timed out".to_string());
/// assert!(failed.load(Ordering::SeqCst));
/// ```
pub struct Promise<T, E> {
    state: Arc<Mutex<State<T, E>>>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, E> Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match &*self.state.lock() {
            State::Pending { .. } => "pending",
            State::Settled(result) if result.is_ok() => "fulfilled",
            State::Settled(_) => "rejected",
        };

        f.debug_struct("Promise").field("status", &status).finish()
    }
}

impl<T, E> Promise<T, E> {
    fn pending() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Pending {
                continuations: Vec::new(),
                wakers: Vec::new(),
            })),
        }
    }

    fn settled_with(result: Result<T, E>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Settled(Arc::new(result)))),
        }
    }

    /// Creates a promise that is already fulfilled with `value`.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self::settled_with(Ok(value))
    }

    /// Creates a promise that is already rejected with `reason`.
    #[must_use]
    pub fn rejected(reason: E) -> Self {
        Self::settled_with(Err(reason))
    }

    /// Creates a promise settled by the outcome of `future`.
    ///
    /// The returned [`PromiseDriver`] must be polled to completion, typically by
    /// spawning it on the runtime of choice; the promise stays pending until then.
    /// The driver is `Send`, which requires both `T` and `E` to be `Send + Sync`
    /// because the settled outcome is shared between all handles.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tripwire::Promise;
    ///
    /// # async fn example() {
    /// let (promise, driver) = Promise::<u32, String>::from_future(async { Err("unreachable host".to_string()) });
    /// tokio::spawn(driver);
    ///
    /// assert_eq!(promise.settled().await, Err("unreachable host".to_string()));
    /// # }
    /// ```
    pub fn from_future<F>(future: F) -> (Self, PromiseDriver)
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        let deferred = Deferred::new();
        let promise = deferred.promise();
        let driver = PromiseDriver {
            inner: Box::pin(async move { deferred.settle(future.await) }),
        };

        (promise, driver)
    }

    /// Returns `true` until the promise is fulfilled or rejected.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(&*self.state.lock(), State::Pending { .. })
    }

    /// Returns `true` if both handles refer to the same operation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Registers a continuation for either outcome.
    pub fn on_settled<F>(&self, continuation: F) -> &Self
    where
        F: FnOnce(&Result<T, E>) + Send + 'static,
    {
        let result = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending { continuations, .. } => {
                    continuations.push(Box::new(continuation));
                    return self;
                }
                State::Settled(result) => Arc::clone(result),
            }
        };

        continuation(&result);
        self
    }

    /// Registers a continuation for eventual success.
    pub fn on_fulfilled<F>(&self, continuation: F) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.on_settled(move |result| {
            if let Ok(value) = result {
                continuation(value);
            }
        })
    }

    /// Registers a continuation for eventual failure.
    pub fn on_rejected<F>(&self, continuation: F) -> &Self
    where
        F: FnOnce(&E) + Send + 'static,
    {
        self.on_settled(move |result| {
            if let Err(reason) = result {
                continuation(reason);
            }
        })
    }

    /// Returns a future that completes with a copy of the outcome.
    #[must_use]
    pub fn settled(&self) -> Settled<T, E> {
        Settled { promise: self.clone() }
    }

    fn settle(&self, result: Result<T, E>) {
        let result = Arc::new(result);
        let (continuations, wakers) = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, State::Settled(Arc::clone(&result))) {
                State::Pending { continuations, wakers } => (continuations, wakers),
                previous @ State::Settled(_) => {
                    *state = previous;
                    return;
                }
            }
        };

        for continuation in continuations {
            continuation(&result);
        }

        for waker in wakers {
            waker.wake();
        }
    }
}

/// The producer side of a [`Promise`].
///
/// Settling consumes the `Deferred`, so a promise settles at most once. Dropping
/// it unsettled leaves the promise pending forever.
///
/// # Examples
///
/// ```rust
/// use tripwire::Deferred;
///
/// let deferred = Deferred::<&str, String>::new();
/// let promise = deferred.promise();
/// assert!(promise.is_pending());
///
/// deferred.resolve("done");
/// assert!(!promise.is_pending());
/// ```
pub struct Deferred<T, E> {
    promise: Promise<T, E>,
}

impl<T, E> Deferred<T, E> {
    /// Creates an unsettled operation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            promise: Promise::pending(),
        }
    }

    /// Returns a handle to the operation.
    #[must_use]
    pub fn promise(&self) -> Promise<T, E> {
        self.promise.clone()
    }

    /// Fulfills the operation with `value`.
    pub fn resolve(self, value: T) {
        self.settle(Ok(value));
    }

    /// Rejects the operation with `reason`.
    pub fn reject(self, reason: E) {
        self.settle(Err(reason));
    }

    /// Settles the operation with `result`.
    pub fn settle(self, result: Result<T, E>) {
        self.promise.settle(result);
    }
}

impl<T, E> Default for Deferred<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").field("promise", &self.promise).finish()
    }
}

/// Future returned by [`Promise::settled`].
#[derive(Debug)]
pub struct Settled<T, E> {
    promise: Promise<T, E>,
}

impl<T: Clone, E: Clone> Future for Settled<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.promise.state.lock();
        match &mut *state {
            State::Settled(result) => Poll::Ready((**result).clone()),
            State::Pending { wakers, .. } => {
                if !wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

/// Drives the future behind a promise created with [`Promise::from_future`].
pub struct PromiseDriver {
    inner: Pin<Box<dyn Future<Output = ()> + Send>>,
}

impl Debug for PromiseDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseDriver").finish_non_exhaustive()
    }
}

impl Future for PromiseDriver {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::executor::block_on;

    use super::*;

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(Promise<String, String>: Send, Sync, Clone, Debug);
        static_assertions::assert_impl_all!(Deferred<String, String>: Send, Sync, Debug);
        static_assertions::assert_impl_all!(PromiseDriver: Send, Debug);
    }

    #[test]
    fn continuations_run_in_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let deferred = Deferred::<u32, String>::new();
        let promise = deferred.promise();

        for index in 0..3 {
            let order = Arc::clone(&order);
            promise.on_settled(move |_| order.lock().push(index));
        }

        assert!(order.lock().is_empty());
        deferred.resolve(7);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn late_continuation_runs_immediately() {
        let promise = Promise::<u32, String>::rejected("late".to_string());
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);

        promise.on_rejected(move |reason| *seen_clone.lock() = Some(reason.clone()));

        assert_eq!(seen.lock().as_deref(), Some("late"));
    }

    #[test]
    fn fulfilled_and_rejected_filter_outcome() {
        let fulfilled = Arc::new(AtomicUsize::new(0));
        let rejected = Arc::new(AtomicUsize::new(0));

        let deferred = Deferred::<u32, String>::new();
        let promise = deferred.promise();
        let fulfilled_clone = Arc::clone(&fulfilled);
        let rejected_clone = Arc::clone(&rejected);
        promise
            .on_fulfilled(move |_| {
                fulfilled_clone.fetch_add(1, Ordering::SeqCst);
            })
            .on_rejected(move |_| {
                rejected_clone.fetch_add(1, Ordering::SeqCst);
            });

        deferred.reject("no".to_string());

        assert_eq!(fulfilled.load(Ordering::SeqCst), 0);
        assert_eq!(rejected.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn continuation_may_register_another_continuation() {
        let count = Arc::new(AtomicUsize::new(0));
        let deferred = Deferred::<(), ()>::new();
        let promise = deferred.promise();

        let inner_promise = promise.clone();
        let count_clone = Arc::clone(&count);
        promise.on_settled(move |_| {
            inner_promise.on_settled(move |_| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            });
        });

        deferred.resolve(());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn settled_future_yields_outcome() {
        let deferred = Deferred::<u32, String>::new();
        let promise = deferred.promise();
        deferred.resolve(42);

        assert_eq!(block_on(promise.settled()), Ok(42));
    }

    #[test]
    fn driver_settles_promise() {
        let (promise, driver) = Promise::<u32, String>::from_future(async { Err("boom".to_string()) });
        assert!(promise.is_pending());

        block_on(driver);

        assert!(!promise.is_pending());
        assert_eq!(block_on(promise.settled()), Err("boom".to_string()));
    }

    #[tokio::test]
    async fn spawned_driver_settles_promise() {
        let (promise, driver) = Promise::<u32, String>::from_future(async { Ok(5) });

        tokio::spawn(driver).await.unwrap();

        assert_eq!(promise.settled().await, Ok(5));
    }

    #[tokio::test]
    async fn settled_future_wakes_when_rejected_later() {
        let deferred = Deferred::<u32, String>::new();
        let promise = deferred.promise();

        let waiter = tokio::spawn(promise.settled());
        tokio::task::yield_now().await;
        deferred.reject("later".to_string());

        assert_eq!(waiter.await.unwrap(), Err("later".to_string()));
    }

    #[test]
    fn debug_reports_status() {
        let deferred = Deferred::<u32, String>::new();
        let promise = deferred.promise();
        assert_eq!(format!("{promise:?}"), r#"Promise { status: "pending" }"#);

        deferred.resolve(1);
        assert_eq!(format!("{promise:?}"), r#"Promise { status: "fulfilled" }"#);
        assert_eq!(
            format!("{:?}", Promise::<u32, String>::rejected(String::new())),
            r#"Promise { status: "rejected" }"#
        );
    }

    #[test]
    fn ptr_eq_tracks_identity() {
        let first = Deferred::<(), ()>::new().promise();
        let second = Deferred::<(), ()>::new().promise();

        assert!(first.ptr_eq(&first.clone()));
        assert!(!first.ptr_eq(&second));
    }
}
