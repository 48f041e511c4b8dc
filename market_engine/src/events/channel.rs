//! Stateless pub-sub for engine events.
//!
//! A handler receives only the event itself, never engine state. Handlers are async and by default each event is
//! handled on its own task, so a slow handler does not hold up the producer. An [`EventHandler::in_order`] handler
//! instead awaits each event before taking the next, so events are handled in the order they were published.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
    in_order: bool,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        Self { receiver, sender, handler, in_order: false }
    }

    pub fn in_order(buffer_size: usize, handler: Handler<E>) -> Self {
        Self { in_order: true, ..Self::new(buffer_size, handler) }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer { sender: self.sender.clone() }
    }

    /// Runs until every producer has been dropped, then waits for in-flight handlers to finish.
    pub async fn start_handler(mut self) {
        debug!("📬️ Starting event handler");
        // Only producers keep the channel open from here on
        drop(self.sender);
        let mut jobs = JoinSet::new();
        while let Some(event) = self.receiver.recv().await {
            if self.in_order {
                (self.handler)(event).await;
                continue;
            }
            let handler = Arc::clone(&self.handler);
            jobs.spawn(async move { (handler)(event).await });
            // reap finished jobs so the set does not grow without bound
            while jobs.try_join_next().is_some() {}
        }
        while let Some(result) = jobs.join_next().await {
            if let Err(e) = result {
                warn!("📬️ An event handler task failed: {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub async fn publish_event(&self, event: E) {
        if let Err(e) = self.sender.send(event).await {
            error!("📬️ Failed to publish event: {e}");
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;

    #[tokio::test]
    async fn every_event_is_handled_before_shutdown() {
        let _ = env_logger::try_init();
        let total = Arc::new(AtomicI64::new(0));
        let t2 = Arc::clone(&total);
        let handler: Handler<i64> = Arc::new(move |v| {
            let total = Arc::clone(&total);
            Box::pin(async move {
                tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
                total.fetch_add(v, Ordering::SeqCst);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let event_handler = EventHandler::new(2, handler);
        let producers = [event_handler.subscribe(), event_handler.subscribe()];
        for (i, producer) in producers.into_iter().enumerate() {
            tokio::spawn(async move {
                for v in 0..10 {
                    producer.publish_event(v * 2 + i as i64).await;
                }
            });
        }
        event_handler.start_handler().await;
        assert_eq!(t2.load(Ordering::SeqCst), (0..20).sum::<i64>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn in_order_handler_keeps_publish_order() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let s2 = Arc::clone(&seen);
        let handler: Handler<u64> = Arc::new(move |v| {
            let seen = Arc::clone(&s2);
            Box::pin(async move {
                // later events finish faster, so any concurrency would reorder them
                tokio::time::sleep(tokio::time::Duration::from_millis(5 - v % 5)).await;
                seen.lock().unwrap().push(v);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let event_handler = EventHandler::in_order(4, handler);
        let producer = event_handler.subscribe();
        tokio::spawn(async move {
            for v in 0..50 {
                producer.publish_event(v).await;
            }
        });
        event_handler.start_handler().await;
        assert_eq!(*seen.lock().unwrap(), (0..50).collect::<Vec<_>>());
    }
}
