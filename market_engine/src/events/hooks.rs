use std::{future::Future, pin::Pin, sync::Arc};

use crate::{
    events::{
        CommissionSettledEvent,
        EventHandler,
        EventProducer,
        Handler,
        OrderTransitionedEvent,
        PaymentProofReviewedEvent,
    },
    realtime::RowChange,
};

type BoxedHandlerFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The producer side of every registered hook. Cheap to clone; APIs hold one each.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_transitioned_producer: Vec<EventProducer<OrderTransitionedEvent>>,
    pub commission_settled_producer: Vec<EventProducer<CommissionSettledEvent>>,
    pub payment_proof_reviewed_producer: Vec<EventProducer<PaymentProofReviewedEvent>>,
    pub row_changed_producer: Vec<EventProducer<RowChange>>,
}

impl EventProducers {
    pub async fn publish_order_transitioned(&self, event: OrderTransitionedEvent) {
        for producer in &self.order_transitioned_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_commission_settled(&self, event: CommissionSettledEvent) {
        for producer in &self.commission_settled_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_payment_proof_reviewed(&self, event: PaymentProofReviewedEvent) {
        for producer in &self.payment_proof_reviewed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_row_changes(&self, changes: Vec<RowChange>) {
        for change in changes {
            for producer in &self.row_changed_producer {
                producer.publish_event(change.clone()).await;
            }
        }
    }
}

pub struct EventHandlers {
    pub on_order_transitioned: Option<EventHandler<OrderTransitionedEvent>>,
    pub on_commission_settled: Option<EventHandler<CommissionSettledEvent>>,
    pub on_payment_proof_reviewed: Option<EventHandler<PaymentProofReviewedEvent>>,
    pub on_row_changed: Option<EventHandler<RowChange>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        Self {
            on_order_transitioned: hooks.on_order_transitioned.map(|f| EventHandler::new(buffer_size, f)),
            on_commission_settled: hooks.on_commission_settled.map(|f| EventHandler::new(buffer_size, f)),
            on_payment_proof_reviewed: hooks.on_payment_proof_reviewed.map(|f| EventHandler::new(buffer_size, f)),
            on_row_changed: hooks.on_row_changed.map(|f| EventHandler::in_order(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_transitioned {
            result.order_transitioned_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_commission_settled {
            result.commission_settled_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_payment_proof_reviewed {
            result.payment_proof_reviewed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_row_changed {
            result.row_changed_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns one task per registered hook. Each task ends once all of its producers are dropped.
    pub fn start_handlers(self) {
        if let Some(handler) = self.on_order_transitioned {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_commission_settled {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_payment_proof_reviewed {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_row_changed {
            tokio::spawn(handler.start_handler());
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_transitioned: Option<Handler<OrderTransitionedEvent>>,
    pub on_commission_settled: Option<Handler<CommissionSettledEvent>>,
    pub on_payment_proof_reviewed: Option<Handler<PaymentProofReviewedEvent>>,
    pub on_row_changed: Option<Handler<RowChange>>,
}

impl EventHooks {
    pub fn on_order_transitioned<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderTransitionedEvent) -> BoxedHandlerFuture) + Send + Sync + 'static {
        self.on_order_transitioned = Some(Arc::new(f));
        self
    }

    pub fn on_commission_settled<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(CommissionSettledEvent) -> BoxedHandlerFuture) + Send + Sync + 'static {
        self.on_commission_settled = Some(Arc::new(f));
        self
    }

    pub fn on_payment_proof_reviewed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentProofReviewedEvent) -> BoxedHandlerFuture) + Send + Sync + 'static {
        self.on_payment_proof_reviewed = Some(Arc::new(f));
        self
    }

    /// Installs an already-built handler, such as [`crate::realtime::ChangeFeed::hook`]. Row changes are handled one at
    /// a time in publish order.
    pub fn on_row_changed(&mut self, handler: Handler<RowChange>) -> &mut Self {
        self.on_row_changed = Some(handler);
        self
    }
}
