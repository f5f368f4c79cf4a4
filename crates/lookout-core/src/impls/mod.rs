//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryEngine**: 静的ゾーンから応答する開発用エンジン
//!
//! # 本番用実装
//! 実ネットワークを使うエンジンのバインディングは別クレートに配置します。

pub mod inmem_engine;

pub use self::inmem_engine::InMemoryEngine;
