//! Running callbacks.
//!
//! Each context has one dispatcher task. Outcomes of transactions are sent
//! to it over a channel and it runs the callbacks one by one. Callbacks
//! thus never run inside the call that produced their outcome, be it a
//! completion, `cancel` or `destroy`.

use super::TransactionId;
use crate::error::Error;
use crate::response::Response;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{trace, warn};

/// The callback of a transaction.
///
/// It receives the outcome and the transaction's ID.
pub type Callback =
    Box<dyn FnOnce(Result<Response, Error>, TransactionId) + Send>;

//------------ Delivery ------------------------------------------------------

/// The outcome of a transaction on its way to the callback.
pub(crate) struct Delivery {
    pub callback: Callback,
    pub id: TransactionId,
    pub outcome: Result<Response, Error>,
}

impl Delivery {
    pub fn new(
        callback: Callback,
        id: TransactionId,
        outcome: Result<Response, Error>,
    ) -> Self {
        Delivery {
            callback,
            id,
            outcome,
        }
    }

    /// Queues the delivery with a dispatcher.
    pub fn send(self, tx: &UnboundedSender<Delivery>) {
        if let Err(err) = tx.send(self) {
            warn!(id = %err.0.id, "dispatcher gone, dropping outcome");
        }
    }

    fn run(self) {
        let id = self.id;
        match &self.outcome {
            Ok(_) => trace!(%id, "delivering response"),
            Err(err) => trace!(%id, code = err.code(), "delivering error"),
        }
        let Delivery {
            callback, outcome, ..
        } = self;
        if catch_unwind(AssertUnwindSafe(move || callback(outcome, id)))
            .is_err()
        {
            warn!(%id, "callback panicked");
        }
    }
}

//------------ run -----------------------------------------------------------

/// Runs callbacks until all senders are gone.
pub(crate) async fn run(mut rx: UnboundedReceiver<Delivery>) {
    while let Some(delivery) = rx.recv().await {
        delivery.run();
    }
    trace!("dispatcher done");
}

//============ Tests =========================================================
