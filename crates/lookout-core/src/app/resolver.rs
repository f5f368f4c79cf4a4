//! Resolver - クエリの送信・完了・キャンセルを束ねるオーケストレーション
//!
//! # 学習ポイント
//! - 共有状態は `Arc<Shared>`、内部コールバックは `Weak` で参照（循環参照の回避）
//! - ロックは 1 ステップ分だけ保持し、コールバック中は何も握らない
//!   （コールバックから send / cancel_query / close を再入で呼べる）
//! - デフォルトコールバックは send 時に各クエリへコピー（テンプレート）
//!
//! # 処理の流れ
//! ```text
//! send ──store──▶ CorrelationStore ──token──▶ Context::submit
//!                                                 │
//! process() ──▶ engine ──(token, status, result)──┘
//!      └──▶ on_engine_complete ──lookup──▶ query.answer / query.error
//!                                               └── on_finish ──▶ store.remove
//! ```

use std::os::fd::RawFd;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::callback::{CallbackSet, EventHooks};
use crate::context::Context;
use crate::domain::{Answer, EngineStatus, Outcome, Token};
use crate::error::ResolverError;
use crate::ports::{CompletionHandler, EngineResult};
use crate::query::{CorrelationStore, Query};

use super::status::ResolverStatus;

#[derive(Default)]
struct Counters {
    sent: AtomicUsize,
    answered: AtomicUsize,
    errored: AtomicUsize,
    canceled: AtomicUsize,
}

impl Counters {
    fn record(&self, outcome: Outcome) {
        let counter = match outcome {
            Outcome::Answered => &self.answered,
            Outcome::Errored => &self.errored,
            Outcome::Canceled => &self.canceled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

struct Shared {
    context: Arc<Context>,
    store: Mutex<CorrelationStore>,
    defaults: Mutex<CallbackSet>,
    counters: Counters,
}

/// Sends queries through a [`Context`] and routes completions back to them.
///
/// Cloning yields another handle to the same resolver.
///
/// # 使用例
/// ```ignore
/// let resolver = Resolver::new(Context::new(engine));
/// resolver.on_answer(|ev| {
///     println!("{}: {:?}", ev.query.name(), ev.answer.addresses());
///     Ok(())
/// });
/// resolver.send(&Query::new("example.test", RecordType::A, RecordClass::IN))?;
/// resolver.wait()?;
/// ```
#[derive(Clone)]
pub struct Resolver {
    shared: Arc<Shared>,
}

impl Resolver {
    pub fn new(context: Context) -> Self {
        Self::with_defaults(context, CallbackSet::new())
    }

    /// Creates a resolver whose default set starts with `defaults`, placed
    /// after the internal bookkeeping handlers.
    pub(crate) fn with_defaults(context: Context, mut defaults: CallbackSet) -> Self {
        let shared = Arc::new_cyclic(|weak: &Weak<Shared>| {
            let mut internal = CallbackSet::new();

            let on_cancel = weak.clone();
            internal.cancel.push(move |ev| {
                let Some(shared) = on_cancel.upgrade() else {
                    return Ok(());
                };
                match ev.query.token() {
                    Some(token) => shared.context.cancel(token).map(|_| ()),
                    None => Ok(()),
                }
            });

            let on_finish = weak.clone();
            internal.finish.push(move |ev| {
                if let Some(shared) = on_finish.upgrade() {
                    shared.store.lock().remove(&ev.query);
                    if let Some(outcome) = ev.query.outcome() {
                        shared.counters.record(outcome);
                    }
                }
                Ok(())
            });

            defaults.adopt_defaults(&internal);
            Shared {
                context: Arc::new(context),
                store: Mutex::new(CorrelationStore::new()),
                defaults: Mutex::new(defaults),
                counters: Counters::default(),
            }
        });
        Self { shared }
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.shared.context
    }

    /// Hands `query` to the engine and returns its correlation token.
    ///
    /// # Errors
    /// - `QueryAlreadyStarted` if the query was started, finished or is
    ///   already outstanding
    /// - `Engine` if the engine rejected the submission; the query is left
    ///   untouched in `Init`
    /// - `ContextClosed` after `close`
    pub fn send(&self, query: &Query) -> Result<Token, ResolverError> {
        if query.is_started() {
            return Err(ResolverError::QueryAlreadyStarted);
        }
        let token = {
            let mut store = self.shared.store.lock();
            if store.contains(query) {
                return Err(ResolverError::QueryAlreadyStarted);
            }
            store.store(query)
        };

        let submitted = self.shared.context.submit(
            query.name(),
            query.rrtype(),
            query.rrclass(),
            token,
            self.completion_handler(),
        );
        if let Err(e) = submitted {
            self.shared.store.lock().remove(query);
            debug!(query = %query.id(), name = %query.name(), error = %e, "submission rejected");
            return Err(e);
        }

        let defaults = self.shared.defaults.lock().clone();
        query.adopt_defaults(&defaults);
        self.shared.counters.sent.fetch_add(1, Ordering::Relaxed);

        query.start(token)?;
        Ok(token)
    }

    fn completion_handler(&self) -> CompletionHandler {
        let weak = Arc::downgrade(&self.shared);
        Arc::new(move |token: Token, status, result| match weak.upgrade() {
            Some(shared) => Resolver { shared }.on_engine_complete(token, status, result),
            None => trace!(%token, "completion after resolver was dropped"),
        })
    }

    /// Routes one engine completion to its query.
    ///
    /// Unknown tokens (a completion racing with a cancel) are ignored. The
    /// engine result is released right after conversion in every case.
    pub fn on_engine_complete(
        &self,
        token: Token,
        status: EngineStatus,
        result: Option<Box<dyn EngineResult>>,
    ) {
        let Some(query) = self.shared.store.lock().lookup(token) else {
            trace!(%token, ?status, "completion for unknown token ignored");
            return;
        };

        let delivered = if status.is_ok() {
            let answer = match result {
                Some(result) => result.to_answer(),
                None => Answer::empty(query.name(), query.rrtype(), query.rrclass()),
            };
            query.answer(answer)
        } else {
            drop(result);
            query.error(status)
        };

        if let Err(e) = delivered {
            warn!(query = %query.id(), name = %query.name(), error = %e, "callback failed");
        }
    }

    /// Cancels one outstanding query.
    ///
    /// A query that holds no token (never sent, or already finished) is left
    /// alone and `Ok(())` is returned without contacting the engine.
    pub fn cancel_query(&self, query: &Query) -> Result<(), ResolverError> {
        if query.token().is_none() {
            trace!(query = %query.id(), "cancel ignored: no token");
            return Ok(());
        }
        query.cancel()
    }

    /// Cancels every outstanding query, then empties the store.
    ///
    /// Every query is canceled even if some cancellation fails; the first
    /// error is returned.
    pub fn cancel_all(&self) -> Result<(), ResolverError> {
        let queries = self.shared.store.lock().queries();
        debug!(count = queries.len(), "canceling all queries");

        let mut first_error = None;
        for query in &queries {
            if let Err(e) = self.cancel_query(query) {
                first_error.get_or_insert(e);
            }
        }
        self.shared.store.lock().clear();

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Number of queries still waiting for a completion.
    pub fn outstanding_queries(&self) -> usize {
        self.shared.store.lock().len()
    }

    /// Snapshot of the queries still waiting for a completion.
    pub fn outstanding(&self) -> Vec<Query> {
        self.shared.store.lock().queries()
    }

    pub fn has_outstanding_queries(&self) -> bool {
        !self.shared.store.lock().is_empty()
    }

    pub fn status(&self) -> ResolverStatus {
        let counters = &self.shared.counters;
        ResolverStatus {
            outstanding: self.shared.store.lock().len(),
            sent: counters.sent.load(Ordering::Relaxed),
            answered: counters.answered.load(Ordering::Relaxed),
            errored: counters.errored.load(Ordering::Relaxed),
            canceled: counters.canceled.load(Ordering::Relaxed),
            closed: self.shared.context.is_closed(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.context.is_closed()
    }

    /// Cancels everything and closes the context. Closing twice is a no-op.
    pub fn close(&self) -> Result<(), ResolverError> {
        if self.shared.context.is_closed() {
            return Ok(());
        }
        let canceled = self.cancel_all();
        // a callback may have closed us re-entrantly
        if !self.shared.context.is_closed() {
            self.shared.context.close()?;
        }
        debug!("resolver closed");
        canceled
    }

    pub fn fd(&self) -> Result<RawFd, ResolverError> {
        self.shared.context.fd()
    }

    /// Dispatches every completion that is ready now.
    pub fn process(&self) -> Result<(), ResolverError> {
        self.shared.context.process()
    }

    /// Blocks until every outstanding query completed.
    pub fn wait(&self) -> Result<(), ResolverError> {
        self.shared.context.wait()
    }
}

impl EventHooks for Resolver {
    fn with_callbacks<R>(&self, f: impl FnOnce(&mut CallbackSet) -> R) -> R {
        f(&mut self.shared.defaults.lock())
    }
}
