//! Query handle and its state machine.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use super::events::{AnswerEvent, CancelEvent, ErrorEvent, FinishEvent, StartEvent};
use crate::callback::{CallbackRegistry, CallbackResult, CallbackSet, EventHooks};
use crate::domain::{
    Answer, EngineStatus, Outcome, QueryId, QueryState, RecordClass, RecordType, Token,
};

/// A single resolution request.
///
/// `Query` is a cheap handle: clones refer to the same request, so the caller,
/// the resolver's correlation store and callback payloads can all hold one.
/// Equality and hashing use the query's [`QueryId`].
///
/// Design:
/// - name / type / class are immutable after construction.
/// - State transitions happen only here (`start`, `answer`, `error`, `cancel`).
/// - No lock is held while callbacks run, so callbacks may re-enter the query
///   or the resolver.
#[derive(Clone)]
pub struct Query {
    inner: Arc<QueryInner>,
}

struct QueryInner {
    id: QueryId,
    name: String,
    rrtype: RecordType,
    rrclass: RecordClass,
    core: Mutex<QueryCore>,
}

struct QueryCore {
    state: QueryState,

    /// Claimed at the beginning of a terminal transition; observable through
    /// `Query::outcome` only once `state` is `Finished`.
    outcome: Option<Outcome>,

    /// Present iff `state` is `Started`.
    token: Option<Token>,

    callbacks: CallbackSet,
}

impl Query {
    pub fn new(name: impl Into<String>, rrtype: RecordType, rrclass: RecordClass) -> Self {
        Self {
            inner: Arc::new(QueryInner {
                id: QueryId::generate(),
                name: name.into(),
                rrtype,
                rrclass,
                core: Mutex::new(QueryCore {
                    state: QueryState::Init,
                    outcome: None,
                    token: None,
                    callbacks: CallbackSet::new(),
                }),
            }),
        }
    }

    pub fn id(&self) -> QueryId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn rrtype(&self) -> RecordType {
        self.inner.rrtype
    }

    pub fn rrclass(&self) -> RecordClass {
        self.inner.rrclass
    }

    pub fn state(&self) -> QueryState {
        self.inner.core.lock().state
    }

    /// The terminal outcome, once the query has finished.
    pub fn outcome(&self) -> Option<Outcome> {
        let core = self.inner.core.lock();
        core.outcome.filter(|_| core.state == QueryState::Finished)
    }

    /// The correlation token, while the query is in flight.
    pub fn token(&self) -> Option<Token> {
        self.inner.core.lock().token
    }

    /// Has the query been started (it may have finished since)?
    pub fn is_started(&self) -> bool {
        self.state() >= QueryState::Started
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Called by the resolver once the engine accepted the query.
    ///
    /// Only valid from `Init`; later calls are ignored.
    pub fn start(&self, token: Token) -> CallbackResult {
        let mut start = {
            let mut core = self.inner.core.lock();
            if core.state != QueryState::Init || core.outcome.is_some() {
                return Ok(());
            }
            core.state = QueryState::Started;
            core.token = Some(token);
            std::mem::take(&mut core.callbacks.start)
        };
        debug!(query = %self.id(), name = %self.name(), %token, "query started");
        start.fire(&StartEvent {
            query: self.clone(),
        })
    }

    /// Called by the resolver when the engine answered.
    pub fn answer(&self, answer: Answer) -> CallbackResult {
        let event = AnswerEvent {
            query: self.clone(),
            answer: Arc::new(answer),
        };
        self.finish(
            Outcome::Answered,
            |set| std::mem::take(&mut set.answer),
            event,
        )
    }

    /// Called by the resolver when the engine reported an error.
    pub fn error(&self, status: EngineStatus) -> CallbackResult {
        let event = ErrorEvent {
            query: self.clone(),
            status,
        };
        self.finish(Outcome::Errored, |set| std::mem::take(&mut set.error), event)
    }

    pub fn cancel(&self) -> CallbackResult {
        let event = CancelEvent {
            query: self.clone(),
        };
        self.finish(
            Outcome::Canceled,
            |set| std::mem::take(&mut set.cancel),
            event,
        )
    }

    /// Shared terminal transition.
    ///
    /// 1. claim the outcome (a second terminal call stops here)
    /// 2. fire the outcome's own category
    /// 3. drop the token and enter `Finished`
    /// 4. fire on-finish, then discard everything left
    ///
    /// A category handler error does not stop the transition; the first error
    /// is returned after on-finish ran.
    fn finish<E>(
        &self,
        outcome: Outcome,
        take: impl FnOnce(&mut CallbackSet) -> CallbackRegistry<E>,
        event: E,
    ) -> CallbackResult {
        let mut category = {
            let mut core = self.inner.core.lock();
            if let Some(previous) = core.outcome {
                trace!(query = %self.id(), ?previous, ?outcome, "terminal transition ignored");
                return Ok(());
            }
            core.outcome = Some(outcome);
            take(&mut core.callbacks)
        };
        let fired = category.fire(&event);

        let mut finish = {
            let mut core = self.inner.core.lock();
            core.token = None;
            core.state = QueryState::Finished;
            let finish = std::mem::take(&mut core.callbacks.finish);
            core.callbacks.clear();
            finish
        };
        debug!(query = %self.id(), name = %self.name(), ?outcome, "query finished");
        let finished = finish.fire(&FinishEvent {
            query: self.clone(),
        });

        // registered from inside on-finish; nothing will ever fire them
        self.inner.core.lock().callbacks.clear();

        fired.and(finished)
    }

    /// Copies resolver-level defaults in front of the query's own callbacks.
    pub(crate) fn adopt_defaults(&self, defaults: &CallbackSet) {
        self.inner.core.lock().callbacks.adopt_defaults(defaults);
    }
}

impl EventHooks for Query {
    fn with_callbacks<R>(&self, f: impl FnOnce(&mut CallbackSet) -> R) -> R {
        f(&mut self.inner.core.lock().callbacks)
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Query {}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("rrtype", &self.inner.rrtype)
            .field("rrclass", &self.inner.rrclass)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolverError;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn google() -> Query {
        Query::new("google.com", RecordType::A, RecordClass::IN)
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[derive(Debug, Clone, Copy)]
    enum Terminal {
        Answer,
        Error,
        Cancel,
    }

    fn drive(query: &Query, terminal: Terminal) -> CallbackResult {
        match terminal {
            Terminal::Answer => query.answer(Answer::empty(
                query.name(),
                query.rrtype(),
                query.rrclass(),
            )),
            Terminal::Error => query.error(EngineStatus::ServFail),
            Terminal::Cancel => query.cancel(),
        }
    }

    #[test]
    fn identity_is_immutable() {
        let query = google();
        assert_eq!(query.name(), "google.com");
        assert_eq!(query.rrtype(), RecordType::A);
        assert_eq!(query.rrclass(), RecordClass::IN);
        assert_eq!(query.state(), QueryState::Init);
        assert!(!query.is_started());
        assert!(!query.is_finished());
        assert_eq!(query.outcome(), None);
    }

    #[test]
    fn start_sets_token_and_fires_on_start() {
        let query = google();
        let seen = Arc::new(Mutex::new(None));
        {
            let seen = Arc::clone(&seen);
            query.on_start(move |ev| {
                *seen.lock() = ev.query.token();
                Ok(())
            });
        }

        query.start(Token::new(4, 0)).unwrap();

        assert!(query.is_started());
        assert_eq!(query.token(), Some(Token::new(4, 0)));
        assert_eq!(*seen.lock(), Some(Token::new(4, 0)));
    }

    #[test]
    fn start_is_only_valid_from_init() {
        let query = google();
        let starts = counter();
        {
            let starts = Arc::clone(&starts);
            query.on_start(move |_| {
                starts.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        query.start(Token::new(1, 0)).unwrap();
        query.start(Token::new(2, 0)).unwrap();
        assert_eq!(query.token(), Some(Token::new(1, 0)));
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        query.cancel().unwrap();
        query.start(Token::new(3, 0)).unwrap();
        assert_eq!(query.state(), QueryState::Finished);
        assert_eq!(query.token(), None);
    }

    #[rstest]
    #[case::answer(Terminal::Answer, Outcome::Answered)]
    #[case::error(Terminal::Error, Outcome::Errored)]
    #[case::cancel(Terminal::Cancel, Outcome::Canceled)]
    fn terminal_transition_finishes(#[case] terminal: Terminal, #[case] expected: Outcome) {
        let query = google();
        query.start(Token::new(0, 0)).unwrap();

        drive(&query, terminal).unwrap();

        assert!(query.is_finished());
        assert!(query.is_started());
        assert_eq!(query.outcome(), Some(expected));
        assert_eq!(query.token(), None);
    }

    #[rstest]
    #[case::answer(Terminal::Answer)]
    #[case::error(Terminal::Error)]
    #[case::cancel(Terminal::Cancel)]
    fn on_finish_fires_exactly_once(#[case] first: Terminal) {
        let query = google();
        let finishes = counter();
        {
            let finishes = Arc::clone(&finishes);
            query.on_finish(move |_| {
                finishes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        drive(&query, first).unwrap();
        for second in [Terminal::Answer, Terminal::Error, Terminal::Cancel] {
            drive(&query, second).unwrap();
        }

        assert_eq!(finishes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn second_terminal_transition_keeps_first_outcome() {
        let query = google();
        let cancels = counter();
        {
            let cancels = Arc::clone(&cancels);
            query.on_cancel(move |_| {
                cancels.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        query.error(EngineStatus::Socket).unwrap();
        query.cancel().unwrap();
        query.cancel().unwrap();

        assert_eq!(query.outcome(), Some(Outcome::Errored));
        assert_eq!(cancels.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn answer_fires_only_answer_callbacks_in_order() {
        let query = google();
        let log = Arc::new(Mutex::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            query.on_answer(move |ev| {
                assert_eq!(ev.query.state(), QueryState::Started);
                log.lock().push(format!("{label}:{}", ev.answer.qname));
                Ok(())
            });
        }
        {
            let log = Arc::clone(&log);
            query.on_error(move |_| {
                log.lock().push("error".to_string());
                Ok(())
            });
        }
        {
            let log = Arc::clone(&log);
            query.on_cancel(move |_| {
                log.lock().push("cancel".to_string());
                Ok(())
            });
        }

        query.start(Token::new(0, 0)).unwrap();
        query
            .answer(Answer::empty("google.com", RecordType::A, RecordClass::IN))
            .unwrap();

        assert_eq!(
            *log.lock(),
            vec!["first:google.com", "second:google.com", "third:google.com"]
        );
    }

    #[test]
    fn error_callbacks_receive_query_and_status() {
        let query = google();
        let seen = Arc::new(Mutex::new(None));
        {
            let seen = Arc::clone(&seen);
            query.on_error(move |ev| {
                *seen.lock() = Some((ev.query.clone(), ev.status));
                Ok(())
            });
        }
        query.error(EngineStatus::Unknown(999)).unwrap();

        let (seen_query, status) = seen.lock().clone().unwrap();
        assert_eq!(seen_query, query);
        assert_eq!(status, EngineStatus::Unknown(999));
    }

    #[test]
    fn cancel_callbacks_see_the_token_before_it_is_cleared() {
        let query = google();
        let seen = Arc::new(Mutex::new(None));
        {
            let seen = Arc::clone(&seen);
            query.on_cancel(move |ev| {
                *seen.lock() = ev.query.token();
                Ok(())
            });
        }
        {
            query.on_finish(|ev| {
                assert_eq!(ev.query.token(), None);
                assert_eq!(ev.query.outcome(), Some(Outcome::Canceled));
                Ok(())
            });
        }
        query.start(Token::new(8, 1)).unwrap();
        query.cancel().unwrap();
        assert_eq!(*seen.lock(), Some(Token::new(8, 1)));
    }

    #[test]
    fn re_entrant_cancel_during_answer_is_ignored() {
        let query = google();
        let finishes = counter();
        query.on_answer(|ev| ev.query.cancel());
        {
            let finishes = Arc::clone(&finishes);
            query.on_finish(move |_| {
                finishes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        query
            .answer(Answer::empty("google.com", RecordType::A, RecordClass::IN))
            .unwrap();

        assert_eq!(query.outcome(), Some(Outcome::Answered));
        assert_eq!(finishes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_error_still_finishes_the_query() {
        let query = google();
        let finishes = counter();
        let later = counter();
        query.on_cancel(|_| Err(ResolverError::callback("boom")));
        {
            let later = Arc::clone(&later);
            query.on_cancel(move |_| {
                later.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        {
            let finishes = Arc::clone(&finishes);
            query.on_finish(move |_| {
                finishes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }

        let result = query.cancel();

        assert!(matches!(result, Err(ResolverError::Callback(_))));
        assert_eq!(later.load(Ordering::SeqCst), 0);
        assert_eq!(finishes.load(Ordering::SeqCst), 1);
        assert_eq!(query.outcome(), Some(Outcome::Canceled));
    }

    #[test]
    fn clones_share_state_and_identity() {
        let query = google();
        let other = query.clone();
        other.cancel().unwrap();
        assert!(query.is_finished());
        assert_eq!(query, other);
        assert_ne!(query, google());
    }
}
