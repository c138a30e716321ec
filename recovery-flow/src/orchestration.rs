//! Pending/success/error bookkeeping shared by every agent-backed operation.
//!
//! An [`Orchestration`] is focused on one case at a time. Starting a call hands out a
//! [`Ticket`]; the result is only applied if the ticket still matches the current case
//! and generation when it comes back. Refocusing (the user navigated elsewhere) bumps
//! the generation, so late results from abandoned calls are discarded.

use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::error::{FlowError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ProcessCase,
    GenerateDocument,
    ApproveDocument,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ProcessCase => "Case processing",
            Operation::GenerateDocument => "Document generation",
            Operation::ApproveDocument => "Document approval",
        };
        f.write_str(name)
    }
}

/// Correlates an outstanding call with the state it was issued against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub operation: Operation,
    pub claim_number: String,
    pub generation: u64,
}

/// What happened to a finished call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "message", rename_all = "snake_case")]
pub enum Completion {
    /// The result was stored.
    Applied,
    /// The call failed; the message was stored and any earlier result kept.
    Failed(String),
    /// The context changed while the call was outstanding; nothing was stored.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct Orchestration<T> {
    operation: Operation,
    subject: Option<String>,
    generation: u64,
    in_flight: bool,
    output: Option<T>,
    error: Option<String>,
}

impl<T> Orchestration<T> {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            subject: None,
            generation: 0,
            in_flight: false,
            output: None,
            error: None,
        }
    }

    /// Claim number this orchestration currently serves.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight
    }

    pub fn output(&self) -> Option<&T> {
        self.output.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Points the orchestration at `subject`. A change of subject clears all state and
    /// invalidates outstanding tickets; focusing the current subject again is a no-op.
    pub fn focus(&mut self, subject: Option<&str>) {
        if self.subject.as_deref() == subject {
            return;
        }
        self.subject = subject.map(str::to_string);
        self.reset();
    }

    /// Clears output, error and the pending flag, and invalidates outstanding tickets.
    pub fn reset(&mut self) {
        self.generation += 1;
        if self.in_flight {
            debug!(
                operation = %self.operation,
                generation = self.generation,
                "Abandoning outstanding call"
            );
        }
        self.in_flight = false;
        self.output = None;
        self.error = None;
    }

    /// Marks a call for `claim_number` as outstanding.
    ///
    /// Fails if a call is already outstanding or the orchestration is focused on a
    /// different case. Clears the previous error; the previous output stays until the
    /// new call succeeds.
    pub fn begin(&mut self, claim_number: &str) -> Result<Ticket> {
        if self.subject.as_deref() != Some(claim_number) {
            return Err(FlowError::OutOfContext {
                operation: self.operation,
                claim_number: claim_number.to_string(),
            });
        }
        if self.in_flight {
            return Err(FlowError::AlreadyPending(self.operation));
        }
        self.in_flight = true;
        self.error = None;
        Ok(Ticket {
            operation: self.operation,
            claim_number: claim_number.to_string(),
            generation: self.generation,
        })
    }

    /// Applies the outcome of the call identified by `ticket`.
    pub fn finish(&mut self, ticket: &Ticket, outcome: std::result::Result<T, String>) -> Completion {
        if ticket.generation != self.generation
            || self.subject.as_deref() != Some(ticket.claim_number.as_str())
        {
            info!(
                operation = %self.operation,
                claim_number = %ticket.claim_number,
                ticket_generation = ticket.generation,
                generation = self.generation,
                "Discarding stale result"
            );
            return Completion::Discarded;
        }

        self.in_flight = false;
        match outcome {
            Ok(output) => {
                self.output = Some(output);
                self.error = None;
                Completion::Applied
            }
            Err(message) => {
                warn!(
                    operation = %self.operation,
                    claim_number = %ticket.claim_number,
                    %message,
                    "Operation failed"
                );
                self.error = Some(message.clone());
                Completion::Failed(message)
            }
        }
    }
}
