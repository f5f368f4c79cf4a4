//! Event loop - エンジンの descriptor を tokio で待つドライバ
//!
//! # 学習ポイント
//! - エンジンの RawFd を dup して `AsyncFd<OwnedFd>` で待つ（元の fd は Context が所有）
//! - `tokio::time::timeout` による idle 検出
//! - readiness を先にクリアしてから process（処理中の新規完了を取りこぼさない）

use std::os::fd::{BorrowedFd, OwnedFd};
use std::time::Duration;

use tokio::io::Interest;
use tokio::io::unix::AsyncFd;
use tracing::{debug, trace};

use crate::error::ResolverError;

use super::resolver::Resolver;

/// Why [`drive`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// No query is outstanding anymore.
    Drained,
    /// Queries are outstanding but the descriptor stayed quiet.
    IdleTimeout,
}

/// Duplicates the engine descriptor so the loop owns what it registers.
fn engine_fd(resolver: &Resolver) -> Result<OwnedFd, ResolverError> {
    let raw = resolver.fd()?;
    // SAFETY: `fd()` succeeded, so the context is open and its engine keeps
    // the descriptor alive; it is duplicated before this borrow ends.
    let borrowed = unsafe { BorrowedFd::borrow_raw(raw) };
    Ok(borrowed.try_clone_to_owned()?)
}

/// Processes completions until `resolver` has nothing outstanding, or until
/// the engine descriptor stays quiet for `idle_timeout`.
///
/// # 使用例
/// ```ignore
/// resolver.send(&query)?;
/// match drive(&resolver, Duration::from_secs(5)).await? {
///     LoopExit::Drained => {}
///     LoopExit::IdleTimeout => resolver.cancel_all()?,
/// }
/// ```
pub async fn drive(resolver: &Resolver, idle_timeout: Duration) -> Result<LoopExit, ResolverError> {
    if !resolver.has_outstanding_queries() {
        return Ok(LoopExit::Drained);
    }
    let fd = AsyncFd::with_interest(engine_fd(resolver)?, Interest::READABLE)?;

    loop {
        if !resolver.has_outstanding_queries() {
            debug!("event loop drained");
            return Ok(LoopExit::Drained);
        }

        let mut guard = match tokio::time::timeout(idle_timeout, fd.readable()).await {
            Ok(guard) => guard?,
            Err(_) => {
                debug!(
                    outstanding = resolver.outstanding_queries(),
                    "event loop idle timeout"
                );
                return Ok(LoopExit::IdleTimeout);
            }
        };
        guard.clear_ready();
        trace!("engine descriptor readable");
        resolver.process()?;
    }
}
