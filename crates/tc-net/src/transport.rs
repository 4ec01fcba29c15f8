//! Transport abstraction
//!
//! A transport accepts requests and hands back completions in whatever
//! order the network produces them.

use crate::{NetError, Request, Response};
use std::fmt;

/// Identifies one dispatched request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Finished request: HTTP responses of any status are `Ok`, only
/// connection-level failures are `Err`
pub type Completion = (Ticket, Result<Response, NetError>);

pub trait Transport {
    /// Start a request; must not block on the network
    fn dispatch(&mut self, ticket: Ticket, request: Request);

    /// Completions available right now
    fn poll(&mut self) -> Vec<Completion>;

    /// Block until the next completion; `None` if nothing is outstanding
    fn wait(&mut self) -> Option<Completion>;
}
