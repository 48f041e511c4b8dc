use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::*;
use tokio::sync::{mpsc, Mutex};

use crate::{
    events::Handler,
    realtime::{RowChange, Subscription},
};

struct Subscriber {
    id: u64,
    subscription: Subscription,
    sender: mpsc::Sender<RowChange>,
}

/// In-process fan-out of committed row changes to the subscriptions whose predicate matches.
///
/// A subscriber that drops its receiver is pruned on the next publish that would have reached it.
#[derive(Clone)]
pub struct ChangeFeed {
    buffer_size: usize,
    next_id: Arc<AtomicU64>,
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl ChangeFeed {
    pub fn new(buffer_size: usize) -> Self {
        Self { buffer_size: buffer_size.max(1), next_id: Arc::new(AtomicU64::new(1)), subscribers: Default::default() }
    }

    pub async fn subscribe(&self, subscription: Subscription) -> mpsc::Receiver<RowChange> {
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("📬️ New realtime subscription #{id}: {subscription}");
        self.subscribers.lock().await.push(Subscriber { id, subscription, sender });
        receiver
    }

    /// Subscribes to several tables at once, merging all matching changes into one stream.
    pub async fn subscribe_all(&self, subscriptions: Vec<Subscription>) -> mpsc::Receiver<RowChange> {
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        let mut subscribers = self.subscribers.lock().await;
        for subscription in subscriptions {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            debug!("📬️ New realtime subscription #{id}: {subscription}");
            subscribers.push(Subscriber { id, subscription, sender: sender.clone() });
        }
        receiver
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Delivers `change` to every matching subscriber and returns how many received it.
    pub async fn publish(&self, change: RowChange) -> usize {
        let targets = {
            let subscribers = self.subscribers.lock().await;
            subscribers
                .iter()
                .filter(|s| s.subscription.matches(&change))
                .map(|s| (s.id, s.sender.clone()))
                .collect::<Vec<_>>()
        };
        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, sender) in targets {
            match sender.send(change.clone()).await {
                Ok(()) => delivered += 1,
                Err(_) => closed.push(id),
            }
        }
        if !closed.is_empty() {
            debug!("📬️ Pruning {} closed realtime subscription(s)", closed.len());
            self.subscribers.lock().await.retain(|s| !closed.contains(&s.id));
        }
        trace!("📬️ {} #{} delivered to {delivered} subscriber(s)", change.table(), change.row_id());
        delivered
    }

    /// A handler suitable for `EventHooks::on_row_changed`, so that every committed change lands on this feed.
    pub fn hook(&self) -> Handler<RowChange> {
        let feed = self.clone();
        Arc::new(move |change| {
            let feed = feed.clone();
            Box::pin(async move {
                feed.publish(change).await;
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        })
    }
}
