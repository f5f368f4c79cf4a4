//! lookout-core
//!
//! Asynchronous query lifecycle over a callback-driven resolution engine.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, token, record, answer, status, state）
//! - **callback**: コールバックレジストリと Query/Resolver 共通の登録面
//! - **query**: Query のライフサイクル、イベントペイロード、CorrelationStore
//! - **ports**: 抽象化レイヤー（Engine）
//! - **context**: エンジン境界（ステータス変換・close 管理）
//! - **app**: アプリケーションロジック（Resolver, ResolverBuilder, event_loop, status）
//! - **impls**: 実装（InMemoryEngine など開発用）
//! - **config**: TOML 設定
//! - **error**: エラー型

pub mod app;
pub mod callback;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod query;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{Resolver, ResolverBuilder, ResolverStatus};
pub use context::{Context, ContextOptions};
pub use error::ResolverError;
pub use query::Query;
