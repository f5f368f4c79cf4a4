//! Test doubles shared by the unit tests of this crate.

use std::os::fd::RawFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::domain::{Answer, EngineStatus, RecordClass, RecordType, Token};
use crate::ports::{CompletionHandler, Engine, EngineResult};

struct Submission {
    token: Token,
    name: String,
    handler: CompletionHandler,
    live: bool,
}

struct StubState {
    submissions: Vec<Submission>,
    cancels: Vec<Token>,
    deletes: usize,
    submit_status: EngineStatus,
}

/// Engine that records every call and completes queries only when a test
/// says so. Clones share state.
#[derive(Clone)]
pub(crate) struct StubEngine {
    state: Arc<Mutex<StubState>>,
    released: Arc<AtomicUsize>,
}

impl StubEngine {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StubState {
                submissions: Vec::new(),
                cancels: Vec::new(),
                deletes: 0,
                submit_status: EngineStatus::NoError,
            })),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Every later `resolve_async` reports `status` and queues nothing.
    pub(crate) fn fail_submissions(&self, status: EngineStatus) {
        self.state.lock().submit_status = status;
    }

    /// `(token, name)` of every accepted submission, in order.
    pub(crate) fn submissions(&self) -> Vec<(Token, String)> {
        self.state
            .lock()
            .submissions
            .iter()
            .map(|s| (s.token, s.name.clone()))
            .collect()
    }

    pub(crate) fn cancels(&self) -> Vec<Token> {
        self.state.lock().cancels.clone()
    }

    pub(crate) fn deletes(&self) -> usize {
        self.state.lock().deletes
    }

    /// Results released after a completion.
    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Fires the completion handler registered for `token`.
    ///
    /// Works for canceled tokens too, which simulates a completion racing
    /// with the cancellation.
    pub(crate) fn complete(&self, token: Token, status: EngineStatus, answer: Option<Answer>) {
        let handler = {
            let mut state = self.state.lock();
            let submission = state
                .submissions
                .iter_mut()
                .find(|s| s.token == token)
                .unwrap_or_else(|| panic!("no submission for {token}"));
            submission.live = false;
            Arc::clone(&submission.handler)
        };
        let result = answer.map(|answer| {
            Box::new(StubResult {
                answer,
                released: Arc::clone(&self.released),
            }) as Box<dyn EngineResult>
        });
        handler(token, status, result);
    }

    /// Completes `token` successfully with an A record answer.
    pub(crate) fn answer(&self, token: Token, name: &str) {
        let mut answer = Answer::empty(name, RecordType::A, RecordClass::IN);
        answer.havedata = true;
        answer.data = vec![vec![192, 0, 2, 1]];
        self.complete(token, EngineStatus::NoError, Some(answer));
    }
}

impl Engine for StubEngine {
    fn resolve_async(
        &self,
        name: &str,
        _rrtype: RecordType,
        _rrclass: RecordClass,
        token: Token,
        callback: CompletionHandler,
    ) -> EngineStatus {
        let mut state = self.state.lock();
        if !state.submit_status.is_ok() {
            return state.submit_status;
        }
        state.submissions.push(Submission {
            token,
            name: name.to_string(),
            handler: callback,
            live: true,
        });
        EngineStatus::NoError
    }

    fn cancel(&self, token: Token) -> EngineStatus {
        let mut state = self.state.lock();
        state.cancels.push(token);
        match state
            .submissions
            .iter_mut()
            .find(|s| s.token == token && s.live)
        {
            Some(submission) => {
                submission.live = false;
                EngineStatus::NoError
            }
            None => EngineStatus::NoId,
        }
    }

    fn process(&self) -> EngineStatus {
        EngineStatus::NoError
    }

    fn wait(&self) -> EngineStatus {
        EngineStatus::NoError
    }

    fn resolve(
        &self,
        name: &str,
        rrtype: RecordType,
        rrclass: RecordClass,
    ) -> Result<Box<dyn EngineResult>, EngineStatus> {
        Ok(Box::new(StubResult {
            answer: Answer::empty(name, rrtype, rrclass),
            released: Arc::clone(&self.released),
        }))
    }

    fn fd(&self) -> RawFd {
        -1
    }

    fn delete(&self) {
        self.state.lock().deletes += 1;
    }
}

struct StubResult {
    answer: Answer,
    released: Arc<AtomicUsize>,
}

impl EngineResult for StubResult {
    fn to_answer(&self) -> Answer {
        self.answer.clone()
    }
}

impl Drop for StubResult {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
