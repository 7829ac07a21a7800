//! Current-value observable store
//!
//! [`Observable`] holds the latest value of a piece of shared state, replays
//! it to every new subscriber, and notifies existing subscribers in publish
//! order. It is backed by a `tokio::sync::watch` channel, so a slow
//! subscriber may skip intermediate values but always converges on the
//! latest one.
//!
//! Session fields and every entity cache are exposed through this type.

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A value slot with replay-to-new-subscriber semantics.
///
/// # Examples
///
/// ```
/// use staybook::observable::Observable;
///
/// let counter = Observable::new(1);
/// assert_eq!(counter.get(), 1);
///
/// counter.replace(2);
/// assert_eq!(counter.get(), 2);
/// ```
#[derive(Debug)]
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T> Observable<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a slot holding `initial`.
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// One-shot snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Raw receiver; the current value is visible through `borrow()`.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Stream that yields the current value first and then every change.
    pub fn stream(&self) -> WatchStream<T> {
        WatchStream::new(self.tx.subscribe())
    }

    /// Publishes `value` unconditionally, notifying every subscriber.
    pub fn replace(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T> Observable<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Publishes `value` only when it differs from the current one.
    ///
    /// Returns `true` when subscribers were notified.
    pub fn set_if_changed(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}

impl<T> Default for Observable<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}
