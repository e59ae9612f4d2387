//! At-most-once command dispatch.
//!
//! An externally retriable command is wrapped in an `IdentifiedCommand`
//! bearing a client-supplied `RequestId`. The generic wrapper handler:
//!
//! 1. Consults the `RequestManager` for the identifier.
//! 2. On repeat sight: returns the output type's duplicate-request result
//!    without invoking the inner handler — the side effects already ran.
//! 3. On first sight: dispatches to the inner handler with the identifier in
//!    the command context, so the dedup record commits in the same unit of
//!    work as the aggregate mutation. A `DuplicateRequest` surfacing from the
//!    commit itself means a concurrent retry won the race; it is folded into
//!    the duplicate-request result as well.
//!
//! One generic algorithm serves every retriable command (create, cancel,
//! ship) by parameterizing over the inner handler.

use ordering_core::RequestId;

use crate::error::CommandError;
use crate::handlers::{CommandContext, CommandHandler};
use crate::ports::RequestManager;

/// A command paired with its client-supplied dedup identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifiedCommand<C> {
    command: C,
    request_id: RequestId,
}

impl<C> IdentifiedCommand<C> {
    pub fn new(command: C, request_id: RequestId) -> Self {
        Self {
            command,
            request_id,
        }
    }

    pub fn command(&self) -> &C {
        &self.command
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn into_parts(self) -> (C, RequestId) {
        (self.command, self.request_id)
    }
}

/// The success value returned for an already-processed request.
///
/// Idempotent callers treat "already processed" as success, so the duplicate
/// path must produce a positive result without re-running anything.
pub trait DuplicateRequestResult {
    fn for_duplicate_request() -> Self;
}

impl DuplicateRequestResult for bool {
    fn for_duplicate_request() -> Self {
        true
    }
}

impl DuplicateRequestResult for () {
    fn for_duplicate_request() -> Self {}
}

/// Generic at-most-once wrapper around any inner command handler.
#[derive(Debug)]
pub struct IdentifiedCommandHandler<H, R> {
    inner: H,
    requests: R,
}

impl<H, R> IdentifiedCommandHandler<H, R> {
    pub fn new(inner: H, requests: R) -> Self {
        Self { inner, requests }
    }
}

impl<H, R> CommandHandler for IdentifiedCommandHandler<H, R>
where
    H: CommandHandler,
    H::Output: DuplicateRequestResult,
    R: RequestManager,
{
    type Command = IdentifiedCommand<H::Command>;
    type Output = H::Output;

    fn handle(
        &self,
        command: Self::Command,
        _ctx: &CommandContext,
    ) -> Result<Self::Output, CommandError> {
        let (inner_command, request_id) = command.into_parts();

        if self.requests.exists(request_id)? {
            tracing::info!(%request_id, "request already processed, skipping dispatch");
            return Ok(H::Output::for_duplicate_request());
        }

        match self
            .inner
            .handle(inner_command, &CommandContext::identified(request_id))
        {
            Err(CommandError::DuplicateRequest(id)) => {
                // A concurrent retry committed first; the work is done.
                tracing::info!(request_id = %id, "duplicate request detected at commit");
                Ok(H::Output::for_duplicate_request())
            }
            other => other,
        }
    }
}
