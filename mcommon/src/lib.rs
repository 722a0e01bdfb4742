//! Shared primitives used by every marionette workspace crate.
//!
//! ```rust
//! use mcommon::{BoxFuture, CancellationToken, Registry};
//!
//! let token = CancellationToken::new();
//! assert!(!token.is_cancelled());
//!
//! let mut registry = Registry::new();
//! registry.insert("alpha".to_string(), 1_u32);
//! assert_eq!(registry.get("alpha"), Some(&1));
//!
//! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
//!     Box::pin(async move { value.len() })
//! }
//! let _future = str_len("hello");
//! ```

pub mod future {
    //! Shared async future aliases.

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod cancel {
    //! Cooperative cancellation signal shared by streams, backend calls,
    //! and tool invocations.
    //!
    //! ```rust
    //! use mcommon::CancellationToken;
    //!
    //! let token = CancellationToken::new();
    //! let observer = token.clone();
    //! token.cancel();
    //! assert!(observer.is_cancelled());
    //! ```

    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::sync::Notify;

    /// Clonable one-shot cancellation flag. All clones observe the same
    /// signal; cancelling is idempotent and can never be undone.
    #[derive(Debug, Clone, Default)]
    pub struct CancellationToken {
        inner: Arc<Inner>,
    }

    #[derive(Debug, Default)]
    struct Inner {
        cancelled: AtomicBool,
        notify: Notify,
    }

    impl CancellationToken {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn cancel(&self) {
            self.inner.cancelled.store(true, Ordering::SeqCst);
            self.inner.notify.notify_waiters();
        }

        pub fn is_cancelled(&self) -> bool {
            self.inner.cancelled.load(Ordering::SeqCst)
        }

        /// Resolves once the token is cancelled. Safe to await from any
        /// number of clones concurrently.
        pub async fn cancelled(&self) {
            while !self.is_cancelled() {
                let notified = self.inner.notify.notified();
                // The flag may have flipped between the check above and
                // registering the waiter.
                if self.is_cancelled() {
                    return;
                }
                notified.await;
            }
        }
    }
}

pub mod registry {
    //! Insertion-ordered registry map used by runtime registries.
    //!
    //! Unlike a plain hash map, iteration order matches registration order,
    //! and re-inserting an existing key replaces the value in place without
    //! moving it. Tool sets rely on both properties.
    //!
    //! ```rust
    //! use mcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("a".to_string(), 1_u32);
    //! registry.insert("b".to_string(), 2);
    //! registry.insert("a".to_string(), 3);
    //!
    //! let values: Vec<u32> = registry.values().copied().collect();
    //! assert_eq!(values, vec![3, 2]);
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        order: Vec<K>,
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash + Clone,
    {
        fn default() -> Self {
            Self {
                order: Vec::new(),
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash + Clone,
    {
        pub fn new() -> Self {
            Self::default()
        }

        /// Inserts a value, returning the previous value for the key if one
        /// existed. An existing key keeps its original position.
        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            let previous = self.items.insert(key.clone(), value);
            if previous.is_none() {
                self.order.push(key);
            }
            previous
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            let removed = self.items.remove(key);
            if removed.is_some() {
                self.order.retain(|existing| existing.borrow() != key);
            }
            removed
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        /// Values in registration order.
        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.order.iter().filter_map(|key| self.items.get(key))
        }

        pub fn keys(&self) -> impl Iterator<Item = &K> {
            self.order.iter()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub mod pipeline {
    //! Generic middleware composition shared by the agent, chat, and
    //! function pipelines.
    //!
    //! Layers wrap a handler: the first layer in a list becomes the
    //! outermost wrapper, so its pre-logic runs first and its post-logic
    //! runs last. An empty list leaves the core handler untouched.
    //!
    //! ```rust
    //! use mcommon::pipeline::{compose, layer, Layer};
    //!
    //! type Handler = std::sync::Arc<dyn Fn(Vec<&'static str>) -> Vec<&'static str> + Send + Sync>;
    //!
    //! let core: Handler = std::sync::Arc::new(|mut trace| {
    //!     trace.push("core");
    //!     trace
    //! });
    //! let outer: Layer<Handler> = layer(|next: Handler| {
    //!     let wrapped: Handler = std::sync::Arc::new(move |mut trace| {
    //!         trace.push("outer:pre");
    //!         let mut trace = next(trace);
    //!         trace.push("outer:post");
    //!         trace
    //!     });
    //!     wrapped
    //! });
    //!
    //! let handler = compose(core, &[outer]);
    //! assert_eq!(handler(Vec::new()), vec!["outer:pre", "core", "outer:post"]);
    //! ```

    use std::sync::Arc;

    /// A middleware layer over handlers of type `H`.
    pub type Layer<H> = Arc<dyn Fn(H) -> H + Send + Sync>;

    pub fn layer<H, F>(wrap: F) -> Layer<H>
    where
        F: Fn(H) -> H + Send + Sync + 'static,
    {
        Arc::new(wrap)
    }

    /// Composes `layers` around `core`: first element outermost.
    pub fn compose<H>(core: H, layers: &[Layer<H>]) -> H {
        layers.iter().rev().fold(core, |handler, layer| layer(handler))
    }
}

pub use cancel::CancellationToken;
pub use future::BoxFuture;
pub use pipeline::{Layer, compose, layer};
pub use registry::Registry;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::pipeline::{Layer, compose, layer};
    use super::{CancellationToken, Registry};

    type TraceHandler = Arc<dyn Fn(Vec<String>) -> Vec<String> + Send + Sync>;

    fn trace_layer(name: &'static str) -> Layer<TraceHandler> {
        layer(move |next: TraceHandler| {
            let wrapped: TraceHandler = Arc::new(move |mut trace| {
                trace.push(format!("{name}:pre"));
                let mut trace = next(trace);
                trace.push(format!("{name}:post"));
                trace
            });
            wrapped
        })
    }

    #[test]
    fn compose_runs_pre_hooks_in_order_and_post_hooks_in_reverse() {
        let core: TraceHandler = Arc::new(|mut trace| {
            trace.push("core".to_string());
            trace
        });

        let handler = compose(core, &[trace_layer("a"), trace_layer("b"), trace_layer("c")]);
        let trace = handler(Vec::new());

        assert_eq!(
            trace,
            vec!["a:pre", "b:pre", "c:pre", "core", "c:post", "b:post", "a:post"]
        );
    }

    #[test]
    fn compose_with_no_layers_is_the_core_handler() {
        let core: TraceHandler = Arc::new(|mut trace| {
            trace.push("core".to_string());
            trace
        });

        let handler = compose(core, &[]);
        assert_eq!(handler(Vec::new()), vec!["core"]);
    }

    #[test]
    fn layers_may_short_circuit_without_calling_next() {
        let core: TraceHandler = Arc::new(|mut trace| {
            trace.push("core".to_string());
            trace
        });
        let short_circuit: Layer<TraceHandler> = layer(|_next: TraceHandler| {
            let wrapped: TraceHandler = Arc::new(|mut trace| {
                trace.push("short-circuit".to_string());
                trace
            });
            wrapped
        });

        let handler = compose(core, &[short_circuit]);
        assert_eq!(handler(Vec::new()), vec!["short-circuit"]);
    }

    #[test]
    fn registry_preserves_insertion_order_and_replaces_in_place() {
        let mut registry = Registry::new();
        registry.insert("first".to_string(), 1_u32);
        registry.insert("second".to_string(), 2);
        registry.insert("first".to_string(), 10);

        let values: Vec<u32> = registry.values().copied().collect();
        assert_eq!(values, vec![10, 2]);
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.remove("first"), Some(10));
        let values: Vec<u32> = registry.values().copied().collect();
        assert_eq!(values, vec![2]);
    }

    #[tokio::test]
    async fn cancellation_token_wakes_pending_waiters() {
        let token = CancellationToken::new();
        let observer = token.clone();

        let waiter = tokio::spawn(async move {
            observer.cancelled().await;
            true
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        let finished = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .expect("waiter task should not panic");
        assert!(finished);
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();

        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already-cancelled token should not block");
    }
}
