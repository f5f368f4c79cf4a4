//! Context - エンジンハンドルの境界オブジェクト
//!
//! Engine の生ステータスを Result に変換し、close 後の呼び出しを拒否します。
//! 「存在しない async id の cancel」をエラーにするかどうかは
//! `raise_on_noid` で切り替えます（デフォルトは成功扱い）。

use std::os::fd::RawFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::{Answer, EngineStatus, RecordClass, RecordType, Token};
use crate::error::ResolverError;
use crate::ports::{CompletionHandler, Engine};

/// Options applied to a [`Context`] at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    /// Surface `NoId` from `cancel` as an error instead of succeeding silently.
    pub raise_on_noid: bool,
}

/// Owns the engine handle. Once closed, every call except `is_closed` fails
/// with `ResolverError::ContextClosed`.
pub struct Context {
    engine: Arc<dyn Engine>,
    raise_on_noid: AtomicBool,
    closed: AtomicBool,
}

impl Context {
    pub fn new(engine: impl Engine + 'static) -> Self {
        Self::with_options(engine, ContextOptions::default())
    }

    pub fn with_options(engine: impl Engine + 'static, options: ContextOptions) -> Self {
        Self {
            engine: Arc::new(engine),
            raise_on_noid: AtomicBool::new(options.raise_on_noid),
            closed: AtomicBool::new(false),
        }
    }

    pub fn raise_on_noid(&self) -> bool {
        self.raise_on_noid.load(Ordering::SeqCst)
    }

    pub fn set_raise_on_noid(&self, raise: bool) {
        self.raise_on_noid.store(raise, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check_closed(&self) -> Result<(), ResolverError> {
        if self.is_closed() {
            return Err(ResolverError::ContextClosed);
        }
        Ok(())
    }

    /// Translates an engine status, applying the `NoId` policy.
    fn raise_if_error(&self, status: EngineStatus) -> Result<EngineStatus, ResolverError> {
        match status {
            EngineStatus::NoError => Ok(status),
            EngineStatus::NoId if !self.raise_on_noid() => {
                trace!(%status, "ignoring unknown async id");
                Ok(status)
            }
            other => Err(ResolverError::Engine(other)),
        }
    }

    /// Submits an asynchronous lookup; `handler` later receives `token`.
    pub fn submit(
        &self,
        name: &str,
        rrtype: RecordType,
        rrclass: RecordClass,
        token: Token,
        handler: CompletionHandler,
    ) -> Result<(), ResolverError> {
        self.check_closed()?;
        let status = self
            .engine
            .resolve_async(name, rrtype, rrclass, token, handler);
        self.raise_if_error(status).map(|_| ())
    }

    /// Asks the engine to cancel `token`.
    ///
    /// Returns the status the engine reported; `NoId` only reaches `Ok` when
    /// `raise_on_noid` is off.
    pub fn cancel(&self, token: Token) -> Result<EngineStatus, ResolverError> {
        self.check_closed()?;
        self.raise_if_error(self.engine.cancel(token))
    }

    pub fn process(&self) -> Result<(), ResolverError> {
        self.check_closed()?;
        self.raise_if_error(self.engine.process()).map(|_| ())
    }

    /// Blocks until every pending query completed.
    pub fn wait(&self) -> Result<(), ResolverError> {
        self.check_closed()?;
        self.raise_if_error(self.engine.wait()).map(|_| ())
    }

    /// Synchronous lookup.
    pub fn resolve(
        &self,
        name: &str,
        rrtype: RecordType,
        rrclass: RecordClass,
    ) -> Result<Answer, ResolverError> {
        self.check_closed()?;
        let result = self
            .engine
            .resolve(name, rrtype, rrclass)
            .map_err(ResolverError::Engine)?;
        Ok(result.to_answer())
    }

    /// The engine's readiness descriptor. Do not close it; use `close`.
    pub fn fd(&self) -> Result<RawFd, ResolverError> {
        self.check_closed()?;
        Ok(self.engine.fd())
    }

    pub fn close(&self) -> Result<(), ResolverError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(ResolverError::ContextClosed);
        }
        debug!("closing context");
        self.engine.delete();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryEngine;
    use crate::testing::StubEngine;
    use std::net::{IpAddr, Ipv4Addr};

    fn noop_handler() -> CompletionHandler {
        Arc::new(|_, _, _| {})
    }

    #[test]
    fn raise_on_noid_defaults_to_false() {
        let ctx = Context::new(StubEngine::new());
        assert!(!ctx.raise_on_noid());
        ctx.set_raise_on_noid(true);
        assert!(ctx.raise_on_noid());
    }

    #[test]
    fn closed_is_one_way() {
        let engine = StubEngine::new();
        let ctx = Context::new(engine.clone());
        assert!(!ctx.is_closed());
        ctx.close().unwrap();
        assert!(ctx.is_closed());
        assert_eq!(engine.deletes(), 1);

        assert!(matches!(ctx.close(), Err(ResolverError::ContextClosed)));
        assert_eq!(engine.deletes(), 1);
    }

    #[test]
    fn calls_after_close_are_rejected() {
        let ctx = Context::new(StubEngine::new());
        ctx.close().unwrap();

        assert!(matches!(ctx.fd(), Err(ResolverError::ContextClosed)));
        assert!(matches!(ctx.process(), Err(ResolverError::ContextClosed)));
        assert!(matches!(ctx.wait(), Err(ResolverError::ContextClosed)));
        assert!(matches!(
            ctx.cancel(Token::new(0, 0)),
            Err(ResolverError::ContextClosed)
        ));
        assert!(matches!(
            ctx.submit(
                "example.test",
                RecordType::A,
                RecordClass::IN,
                Token::new(0, 0),
                noop_handler()
            ),
            Err(ResolverError::ContextClosed)
        ));
        assert!(matches!(
            ctx.resolve("example.test", RecordType::A, RecordClass::IN),
            Err(ResolverError::ContextClosed)
        ));
    }

    #[test]
    fn cancel_of_unknown_id_succeeds_by_default() {
        let ctx = Context::new(StubEngine::new());
        assert_eq!(ctx.cancel(Token::new(9, 0)).unwrap(), EngineStatus::NoId);
    }

    #[test]
    fn cancel_of_unknown_id_raises_when_configured() {
        let ctx = Context::with_options(
            StubEngine::new(),
            ContextOptions {
                raise_on_noid: true,
            },
        );
        assert!(matches!(
            ctx.cancel(Token::new(9, 0)),
            Err(ResolverError::Engine(EngineStatus::NoId))
        ));
    }

    #[test]
    fn submit_failure_is_translated() {
        let engine = StubEngine::new();
        engine.fail_submissions(EngineStatus::NoMem);
        let ctx = Context::new(engine);
        let result = ctx.submit(
            "example.test",
            RecordType::A,
            RecordClass::IN,
            Token::new(0, 0),
            noop_handler(),
        );
        assert!(matches!(
            result,
            Err(ResolverError::Engine(EngineStatus::NoMem))
        ));
    }

    #[test]
    fn resolve_returns_converted_answer() {
        let engine = InMemoryEngine::new().unwrap();
        engine.add_a("mycomputer.local", Ipv4Addr::new(192, 0, 2, 51));
        let ctx = Context::new(engine);

        let answer = ctx
            .resolve("mycomputer.local", RecordType::A, RecordClass::IN)
            .unwrap();

        assert_eq!(answer.rcode, 0);
        assert_eq!(
            answer.addresses(),
            vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 51))]
        );
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ContextOptions = toml::from_str("").unwrap();
        assert_eq!(options, ContextOptions::default());
        let options: ContextOptions = toml::from_str("raise_on_noid = true").unwrap();
        assert!(options.raise_on_noid);
    }
}
