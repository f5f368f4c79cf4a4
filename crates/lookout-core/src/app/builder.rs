//! ResolverBuilder - Resolver の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - Resolver が存在する前にデフォルトコールバックを登録できる

use crate::callback::{CallbackResult, CallbackSet};
use crate::context::Context;
use crate::error::ResolverError;
use crate::query::events::{AnswerEvent, CancelEvent, ErrorEvent, FinishEvent, StartEvent};

use super::resolver::Resolver;

/// ResolverBuilder は Resolver を構築
///
/// # 使用例
/// ```ignore
/// let resolver = ResolverBuilder::new(Context::new(engine))
///     .on_answer(|ev| { println!("{}", ev.query.name()); Ok(()) })
///     .on_error(|ev| { eprintln!("{}", ev.status); Ok(()) })
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - 既に close 済みの Context からは構築できない（`ContextClosed`）
pub struct ResolverBuilder {
    context: Context,
    defaults: CallbackSet,
}

impl ResolverBuilder {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            defaults: CallbackSet::new(),
        }
    }

    pub fn on_start<F>(mut self, handler: F) -> Self
    where
        F: Fn(&StartEvent) -> CallbackResult + Send + Sync + 'static,
    {
        self.defaults.start.push(handler);
        self
    }

    pub fn on_answer<F>(mut self, handler: F) -> Self
    where
        F: Fn(&AnswerEvent) -> CallbackResult + Send + Sync + 'static,
    {
        self.defaults.answer.push(handler);
        self
    }

    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ErrorEvent) -> CallbackResult + Send + Sync + 'static,
    {
        self.defaults.error.push(handler);
        self
    }

    pub fn on_cancel<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CancelEvent) -> CallbackResult + Send + Sync + 'static,
    {
        self.defaults.cancel.push(handler);
        self
    }

    pub fn on_finish<F>(mut self, handler: F) -> Self
    where
        F: Fn(&FinishEvent) -> CallbackResult + Send + Sync + 'static,
    {
        self.defaults.finish.push(handler);
        self
    }

    /// Resolver を生成
    ///
    /// # 検証
    /// - Context が close 済みなら `ResolverError::ContextClosed`
    pub fn build(self) -> Result<Resolver, ResolverError> {
        if self.context.is_closed() {
            return Err(ResolverError::ContextClosed);
        }
        Ok(Resolver::with_defaults(self.context, self.defaults))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Outcome, RecordClass, RecordType};
    use crate::query::Query;
    use crate::testing::StubEngine;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_build_success() {
        let resolver = ResolverBuilder::new(Context::new(StubEngine::new())).build();
        assert!(resolver.is_ok());
    }

    #[test]
    fn test_build_closed_context() {
        let context = Context::new(StubEngine::new());
        context.close().unwrap();
        let resolver = ResolverBuilder::new(context).build();
        assert!(matches!(resolver, Err(ResolverError::ContextClosed)));
    }

    #[test]
    fn test_builder_defaults_run_after_bookkeeping() {
        let engine = StubEngine::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let r = Arc::new(Mutex::new(None::<Resolver>));
        let probe = Arc::clone(&r);

        let resolver = ResolverBuilder::new(Context::new(engine.clone()))
            .on_finish(move |ev| {
                // the query is already gone from the store here
                let outstanding = probe
                    .lock()
                    .as_ref()
                    .map(|r| r.has_outstanding_queries())
                    .unwrap_or_default();
                s.lock().push((ev.query.outcome(), outstanding));
                Ok(())
            })
            .build()
            .unwrap();
        *r.lock() = Some(resolver.clone());

        let query = Query::new("example.test", RecordType::A, RecordClass::IN);
        let token = resolver.send(&query).unwrap();
        engine.answer(token, "example.test");

        assert_eq!(*seen.lock(), vec![(Some(Outcome::Answered), false)]);
        // break the resolver <-> callback cycle
        r.lock().take();
    }
}
