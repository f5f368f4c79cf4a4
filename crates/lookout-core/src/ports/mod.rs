//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」です。外部のエンジンへの
//! インターフェースだけを定義し、実装は `impls` に置きます。

pub mod engine;

pub use self::engine::{CompletionHandler, Engine, EngineResult};
