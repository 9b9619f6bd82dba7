//! Single-resolution placeholders for results produced on a later turn.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::jsonrpc::ResponseError;

/// Result carried by a resolved request.
pub type HandlerResult = Result<Value, ResponseError>;

type Slot = Rc<RefCell<Option<HandlerResult>>>;

/// Creates a linked result placeholder and its resolver.
#[must_use]
pub fn deferred() -> (DeferredResult, Resolver) {
    let slot: Slot = Rc::default();
    (
        DeferredResult {
            slot: Rc::clone(&slot),
        },
        Resolver { slot: Some(slot) },
    )
}

/// The session-side half: polled after each scheduler turn.
#[derive(Debug)]
pub struct DeferredResult {
    slot: Slot,
}

impl DeferredResult {
    /// Returns `true` once the resolver has produced a result.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Takes the result if it is available.
    #[must_use]
    pub fn take(&self) -> Option<HandlerResult> {
        self.slot.borrow_mut().take()
    }
}

/// The provider-side half, moved into the continuation that computes the
/// result.
///
/// Resolving consumes the resolver. Dropping it unresolved resolves the
/// request with an internal error so the client still gets one response.
#[derive(Debug)]
pub struct Resolver {
    slot: Option<Slot>,
}

impl Resolver {
    /// Resolves the request.
    pub fn resolve(mut self, result: HandlerResult) {
        if let Some(slot) = self.slot.take() {
            let mut stored = slot.borrow_mut();
            if stored.is_none() {
                *stored = Some(result);
            }
        }
    }
}

impl Drop for Resolver {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            let mut stored = slot.borrow_mut();
            if stored.is_none() {
                *stored = Some(Err(ResponseError::internal(
                    "request was dropped without a result",
                )));
            }
        }
    }
}
