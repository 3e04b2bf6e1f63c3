//! Observable per-request transaction state.

use alloy::primitives::TxHash;
use tokio::sync::watch;

/// Lifecycle of one dispatched transaction request.
///
/// Transitions only move forward; a new dispatch of the same kind resets
/// to `Idle` before re-entering `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxStatus {
    #[default]
    Idle,
    /// Submitted to the wallet, no hash yet.
    Pending,
    /// Broadcast; waiting on the receipt.
    Confirming,
    Confirmed,
    /// Idle-equivalent: the request is over and can be retried manually.
    Failed,
}

/// The one externally observable transaction shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionState {
    pub status: TxStatus,
    pub hash: Option<TxHash>,
    /// User-visible message when `status` is `Failed`.
    pub error: Option<String>,
}

impl TransactionState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.status == TxStatus::Pending
    }

    pub fn is_confirming(&self) -> bool {
        self.status == TxStatus::Confirming
    }

    pub fn is_success(&self) -> bool {
        self.status == TxStatus::Confirmed
    }

    pub fn is_failed(&self) -> bool {
        self.status == TxStatus::Failed
    }

    /// True while the triggering control should stay disabled.
    pub fn in_flight(&self) -> bool {
        self.is_pending() || self.is_confirming()
    }
}

/// One watch-published state cell per request kind.
pub struct TxStateCell {
    state: watch::Sender<TransactionState>,
}

impl TxStateCell {
    pub fn new() -> Self {
        let (state, _) = watch::channel(TransactionState::idle());
        Self { state }
    }

    pub fn subscribe(&self) -> watch::Receiver<TransactionState> {
        self.state.subscribe()
    }

    pub fn get(&self) -> TransactionState {
        self.state.borrow().clone()
    }

    /// New dispatch of this kind: back to idle before re-entering pending.
    pub(crate) fn reset(&self) {
        self.state.send_replace(TransactionState::idle());
    }

    pub(crate) fn pending(&self) {
        self.state.send_replace(TransactionState {
            status: TxStatus::Pending,
            hash: None,
            error: None,
        });
    }

    pub(crate) fn confirming(&self, hash: TxHash) {
        self.state.send_replace(TransactionState {
            status: TxStatus::Confirming,
            hash: Some(hash),
            error: None,
        });
    }

    pub(crate) fn confirmed(&self) {
        self.state.send_modify(|state| {
            state.status = TxStatus::Confirmed;
            state.error = None;
        });
    }

    pub(crate) fn failed(&self, message: String) {
        self.state.send_modify(|state| {
            state.status = TxStatus::Failed;
            state.error = Some(message);
        });
    }
}

impl Default for TxStateCell {
    fn default() -> Self {
        Self::new()
    }
}
