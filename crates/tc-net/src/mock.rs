//! In-memory transport
//!
//! Records every dispatched request and completes them only when told
//! to, in any order. Clones share state, so a test keeps one handle while
//! the client owns another.

use crate::{Completion, NetError, Request, Response, Ticket, Transport};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

#[derive(Debug, Default)]
struct MockState {
    log: Vec<(Ticket, Request)>,
    pending: Vec<Ticket>,
    ready: VecDeque<Completion>,
}

#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Rc<RefCell<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request dispatched so far, in dispatch order
    pub fn requests(&self) -> Vec<Request> {
        self.state.borrow().log.iter().map(|(_, r)| r.clone()).collect()
    }

    /// Number of requests dispatched so far
    pub fn request_count(&self) -> usize {
        self.state.borrow().log.len()
    }

    /// Requests not yet completed, in dispatch order
    pub fn pending(&self) -> Vec<(Ticket, Request)> {
        let state = self.state.borrow();
        state
            .log
            .iter()
            .filter(|(t, _)| state.pending.contains(t))
            .cloned()
            .collect()
    }

    /// First pending request whose URL ends with `suffix`
    pub fn find(&self, suffix: &str) -> Option<(Ticket, Request)> {
        self.pending().into_iter().find(|(_, r)| r.url.ends_with(suffix))
    }

    /// Complete a pending request with a raw response
    pub fn respond(&self, ticket: Ticket, response: Response) -> bool {
        self.complete(ticket, Ok(response))
    }

    /// Complete a pending request with a JSON body
    pub fn respond_json(&self, ticket: Ticket, status: u16, body: Value) -> bool {
        self.respond(ticket, Response::json_body(status, &body))
    }

    /// Fail a pending request at the connection level
    pub fn fail(&self, ticket: Ticket, message: &str) -> bool {
        self.complete(ticket, Err(NetError::Network(message.to_string())))
    }

    fn complete(&self, ticket: Ticket, result: Result<Response, NetError>) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(pos) = state.pending.iter().position(|t| *t == ticket) else {
            return false;
        };
        state.pending.remove(pos);
        state.ready.push_back((ticket, result));
        true
    }
}

impl Transport for MockTransport {
    fn dispatch(&mut self, ticket: Ticket, request: Request) {
        let mut state = self.state.borrow_mut();
        state.log.push((ticket, request));
        state.pending.push(ticket);
    }

    fn poll(&mut self) -> Vec<Completion> {
        self.state.borrow_mut().ready.drain(..).collect()
    }

    fn wait(&mut self) -> Option<Completion> {
        self.state.borrow_mut().ready.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_out_of_order_completion() {
        let mut mock = MockTransport::new();
        let handle = mock.clone();
        mock.dispatch(Ticket(1), Request::get("/a"));
        mock.dispatch(Ticket(2), Request::get("/b"));
        assert_eq!(handle.pending().len(), 2);

        assert!(handle.respond_json(Ticket(2), 200, json!({})));
        assert!(!handle.respond_json(Ticket(2), 200, json!({})));
        let done = mock.poll();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].0, Ticket(2));
        assert_eq!(handle.pending()[0].0, Ticket(1));
    }
}
