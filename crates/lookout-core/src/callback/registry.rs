//! CallbackRegistry - 1 カテゴリ分の順序付きハンドラ列
//!
//! # 学習ポイント
//! - `Arc<dyn Fn>` による型消去されたハンドラの保持
//! - ペイロード型 `E` によるジェネリクス（カテゴリごとに引数の型が決まる）
//! - one-shot 発火（fire 後はリストを破棄）

use std::fmt;
use std::sync::Arc;

use crate::error::ResolverError;

/// Return type of every callback. An `Err` aborts the remaining handlers of the
/// registry being fired.
pub type CallbackResult = Result<(), ResolverError>;

/// A type-erased handler for payload `E`.
///
/// `Arc` keeps registries cheap to clone, which is how resolver-level defaults
/// are copied onto each query.
pub type Callback<E> = Arc<dyn Fn(&E) -> CallbackResult + Send + Sync>;

/// Ordered, fire-once collection of handlers for one event category.
pub struct CallbackRegistry<E> {
    handlers: Vec<Callback<E>>,
}

impl<E> CallbackRegistry<E> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Appends one or more handlers, keeping their order.
    ///
    /// Fails with `InvalidArgument` when `handlers` yields nothing.
    pub fn register<I>(&mut self, handlers: I) -> Result<(), ResolverError>
    where
        I: IntoIterator<Item = Callback<E>>,
    {
        let before = self.handlers.len();
        self.handlers.extend(handlers);
        if self.handlers.len() == before {
            return Err(ResolverError::InvalidArgument("missing callback"));
        }
        Ok(())
    }

    /// Appends a single closure.
    pub fn push<F>(&mut self, handler: F)
    where
        F: Fn(&E) -> CallbackResult + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
    }

    /// Invokes every handler in registration order, then discards the list.
    ///
    /// The first handler error stops the iteration and is returned; handlers
    /// after it are discarded without running.
    pub fn fire(&mut self, event: &E) -> CallbackResult {
        let handlers = std::mem::take(&mut self.handlers);
        for handler in &handlers {
            handler(event)?;
        }
        Ok(())
    }

    /// Discards all handlers without firing them.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Places a copy of `defaults` in front of the handlers already registered.
    pub(crate) fn prepend(&mut self, defaults: &CallbackRegistry<E>) {
        if defaults.is_empty() {
            return;
        }
        let mut handlers = defaults.handlers.clone();
        handlers.append(&mut self.handlers);
        self.handlers = handlers;
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<E> Default for CallbackRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for CallbackRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

impl<E> fmt::Debug for CallbackRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
