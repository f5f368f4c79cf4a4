//! Callback - Query と Resolver が共有するコールバック面
//!
//! # 二層構造
//! - **CallbackRegistry<E>**: 1 カテゴリ分のハンドラ列（ペイロード型 E ごと）
//! - **CallbackSet**: start / answer / error / cancel / finish の 5 カテゴリ
//!
//! `CallbackSet` は Query と Resolver に値として埋め込まれ、
//! `EventHooks` trait が両者に同じ `on_*` 登録メソッドを提供します。

pub mod registry;

pub use self::registry::{Callback, CallbackRegistry, CallbackResult};

use crate::query::events::{AnswerEvent, CancelEvent, ErrorEvent, FinishEvent, StartEvent};

/// The five callback categories of a query.
#[derive(Debug, Clone, Default)]
pub struct CallbackSet {
    /// Just after the query was handed to the engine.
    pub start: CallbackRegistry<StartEvent>,

    /// The engine answered.
    pub answer: CallbackRegistry<AnswerEvent>,

    /// The engine reported an error for the query.
    pub error: CallbackRegistry<ErrorEvent>,

    /// The query was canceled.
    pub cancel: CallbackRegistry<CancelEvent>,

    /// Always, once, after any of the three terminal outcomes.
    pub finish: CallbackRegistry<FinishEvent>,
}

impl CallbackSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.start.clear();
        self.answer.clear();
        self.error.clear();
        self.cancel.clear();
        self.finish.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_empty()
            && self.answer.is_empty()
            && self.error.is_empty()
            && self.cancel.is_empty()
            && self.finish.is_empty()
    }

    /// Copies every category of `defaults` in front of the own handlers.
    pub(crate) fn adopt_defaults(&mut self, defaults: &CallbackSet) {
        self.start.prepend(&defaults.start);
        self.answer.prepend(&defaults.answer);
        self.error.prepend(&defaults.error);
        self.cancel.prepend(&defaults.cancel);
        self.finish.prepend(&defaults.finish);
    }
}

/// Registration surface shared by [`Query`](crate::query::Query) and
/// [`Resolver`](crate::app::Resolver).
///
/// # 使用例
/// ```ignore
/// query.on_answer(|ev| {
///     println!("{} -> {:?}", ev.query.name(), ev.answer.addresses());
///     Ok(())
/// });
/// ```
pub trait EventHooks {
    /// Runs `f` with exclusive access to the callback set.
    fn with_callbacks<R>(&self, f: impl FnOnce(&mut CallbackSet) -> R) -> R;

    fn on_start<F>(&self, handler: F)
    where
        F: Fn(&StartEvent) -> CallbackResult + Send + Sync + 'static,
    {
        self.with_callbacks(|set| set.start.push(handler));
    }

    fn on_answer<F>(&self, handler: F)
    where
        F: Fn(&AnswerEvent) -> CallbackResult + Send + Sync + 'static,
    {
        self.with_callbacks(|set| set.answer.push(handler));
    }

    fn on_error<F>(&self, handler: F)
    where
        F: Fn(&ErrorEvent) -> CallbackResult + Send + Sync + 'static,
    {
        self.with_callbacks(|set| set.error.push(handler));
    }

    /// Fires when the query is canceled, e.g. after a caller-side timeout.
    fn on_cancel<F>(&self, handler: F)
    where
        F: Fn(&CancelEvent) -> CallbackResult + Send + Sync + 'static,
    {
        self.with_callbacks(|set| set.cancel.push(handler));
    }

    fn on_finish<F>(&self, handler: F)
    where
        F: Fn(&FinishEvent) -> CallbackResult + Send + Sync + 'static,
    {
        self.with_callbacks(|set| set.finish.push(handler));
    }
}
