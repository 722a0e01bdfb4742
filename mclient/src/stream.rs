//! Cancellable pull-based stream backed by a producer task.
//!
//! The producer runs on its own tokio task and pushes values through a
//! bounded single-slot channel. Consumers pull with [`ResponseStream::next`],
//! which honors an external cancellation token; [`ResponseStream::close`]
//! releases a producer blocked on a full buffer by cancelling and draining.
//!
//! ```rust
//! use mclient::{ClientError, ResponseStream};
//! use mcommon::CancellationToken;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let mut stream = ResponseStream::spawn(|producer| async move {
//!     producer.send(1_u32).await?;
//!     producer.send(2).await?;
//!     Ok::<(), ClientError>(())
//! });
//!
//! let values = stream
//!     .collect(&CancellationToken::new())
//!     .await
//!     .expect("stream should drain");
//! assert_eq!(values, vec![1, 2]);
//! # });
//! ```

use std::future::Future;
use std::sync::{Arc, Mutex};

use mcommon::CancellationToken;
use tokio::sync::mpsc;

use crate::ClientError;

/// Producer-side handle: a bounded sender wired to the stream's internal
/// cancellation token.
pub struct StreamProducer<T> {
    sender: mpsc::Sender<T>,
    cancellation: CancellationToken,
}

impl<T> StreamProducer<T> {
    /// Sends one value, blocking while the buffer is full. Returns a
    /// cancelled-kind error once the stream has been closed.
    pub async fn send(&self, item: T) -> Result<(), ClientError> {
        tokio::select! {
            _ = self.cancellation.cancelled() => {
                Err(ClientError::cancelled("stream closed before the value was accepted"))
            }
            sent = self.sender.send(item) => {
                sent.map_err(|_| ClientError::cancelled("stream consumer dropped"))
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// The stream's internal token; producers pulling from another stream
    /// should pass this through so closing propagates.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

/// Single-consumer pull iterator over values produced by a background task.
pub struct ResponseStream<T> {
    receiver: mpsc::Receiver<T>,
    cancellation: CancellationToken,
    error_slot: Arc<Mutex<Option<ClientError>>>,
    terminal_error: Option<ClientError>,
    closed: bool,
}

impl<T: Send + 'static> ResponseStream<T> {
    /// Spawns `producer` on its own task. The producer's error, if any,
    /// surfaces on the pull that observes end-of-stream.
    pub fn spawn<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(StreamProducer<T>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ClientError>> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel(1);
        let cancellation = CancellationToken::new();
        let error_slot = Arc::new(Mutex::new(None));

        let handle = StreamProducer {
            sender,
            cancellation: cancellation.clone(),
        };
        let slot = Arc::clone(&error_slot);
        tokio::spawn(async move {
            if let Err(error) = producer(handle).await
                && let Ok(mut slot) = slot.lock()
            {
                *slot = Some(error);
            }
        });

        Self {
            receiver,
            cancellation,
            error_slot,
            terminal_error: None,
            closed: false,
        }
    }

    /// A stream that yields the given items and finishes cleanly.
    pub fn from_items(items: Vec<T>) -> Self {
        Self::spawn(move |producer| async move {
            for item in items {
                producer.send(item).await?;
            }
            Ok(())
        })
    }

    /// Pulls the next value. `Ok(None)` marks clean end-of-stream; a
    /// producer error is returned on the pull that reaches it and again on
    /// every later pull. Cancellation returns immediately with a
    /// cancelled-kind error without consuming a value.
    pub async fn next(
        &mut self,
        cancellation: &CancellationToken,
    ) -> Result<Option<T>, ClientError> {
        if let Some(error) = &self.terminal_error {
            return Err(error.clone());
        }

        tokio::select! {
            _ = cancellation.cancelled() => {
                Err(ClientError::cancelled("stream pull cancelled"))
            }
            received = self.receiver.recv() => match received {
                Some(value) => Ok(Some(value)),
                None => match self.take_producer_error() {
                    Some(error) => {
                        self.terminal_error = Some(error.clone());
                        Err(error)
                    }
                    None => Ok(None),
                },
            },
        }
    }

    /// Drains the stream, stopping at the first error.
    pub async fn collect(
        &mut self,
        cancellation: &CancellationToken,
    ) -> Result<Vec<T>, ClientError> {
        let mut items = Vec::new();
        while let Some(item) = self.next(cancellation).await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Cancels the producer and discards buffered values so a producer
    /// blocked mid-write is released. Idempotent; after close no further
    /// values are delivered.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        self.cancellation.cancel();
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}

        if self.terminal_error.is_none() {
            self.terminal_error = self.take_producer_error();
        }
    }

    /// Transforms each value on a background task. Closing the returned
    /// stream closes this one.
    pub fn map<B, F>(mut self, mut transform: F) -> ResponseStream<B>
    where
        B: Send + 'static,
        F: FnMut(T) -> B + Send + 'static,
    {
        ResponseStream::spawn(move |producer| async move {
            let result = loop {
                match self.next(producer.cancellation()).await {
                    Ok(Some(item)) => producer.send(transform(item)).await?,
                    Ok(None) => break Ok(()),
                    Err(error) => break Err(error),
                }
            };
            self.close();
            result
        })
    }

    fn take_producer_error(&self) -> Option<ClientError> {
        self.error_slot.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl<T> Drop for ResponseStream<T> {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}
