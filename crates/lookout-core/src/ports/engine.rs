//! Engine port - 非同期名前解決エンジンの抽象化
//!
//! エンジン本体（設定・プロトコル・キャッシュ・DNSSEC 検証）はこの crate の外側にあり、
//! ここではコアが必要とする操作だけを定義します。
//!
//! # 設計原則
//! - 戻り値は生の EngineStatus（Result への変換は Context の責務）
//! - すべて `&self`: process() 中のコールバックから cancel/resolve_async を
//!   再入で呼べるようにするため、実装はロックを保持したままコールバックしないこと

use std::os::fd::RawFd;
use std::sync::Arc;

use crate::domain::{Answer, EngineStatus, RecordClass, RecordType, Token};

/// An engine-owned result resource.
///
/// Dropping the box releases the resource; the completion handler drops it
/// exactly once, right after converting it.
pub trait EngineResult: Send {
    fn to_answer(&self) -> Answer;
}

/// Invoked by the engine once per submitted, non-canceled query:
/// `(token, status, result)`. `result` is only meaningful on success.
pub type CompletionHandler =
    Arc<dyn Fn(Token, EngineStatus, Option<Box<dyn EngineResult>>) + Send + Sync>;

/// Raw engine operations consumed by [`Context`](crate::context::Context).
pub trait Engine: Send + Sync {
    /// Queues an asynchronous lookup. `token` comes back unchanged in `callback`.
    fn resolve_async(
        &self,
        name: &str,
        rrtype: RecordType,
        rrclass: RecordClass,
        token: Token,
        callback: CompletionHandler,
    ) -> EngineStatus;

    /// Requests cancellation. Unknown tokens report `EngineStatus::NoId`.
    fn cancel(&self, token: Token) -> EngineStatus;

    /// Dispatches every completion ready at call time, synchronously.
    fn process(&self) -> EngineStatus;

    /// Blocks until no query is pending, dispatching completions on the way.
    fn wait(&self) -> EngineStatus;

    /// Blocking lookup that bypasses the asynchronous path.
    fn resolve(
        &self,
        name: &str,
        rrtype: RecordType,
        rrclass: RecordClass,
    ) -> Result<Box<dyn EngineResult>, EngineStatus>;

    /// Descriptor that becomes readable while completions are pending.
    fn fd(&self) -> RawFd;

    /// Tears the engine down. Called at most once, by `Context::close`.
    fn delete(&self);
}
