//! App - アプリケーション層
//!
//! このモジュールは、Context と query を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **Resolver**: 送信・完了ルーティング・キャンセル
//! - **ResolverBuilder**: デフォルトコールバック込みの構築
//! - **event_loop**: tokio によるエンジン descriptor の駆動
//! - **ResolverStatus**: 集計ビュー

pub mod builder;
pub mod event_loop;
pub mod resolver;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::ResolverBuilder;
pub use self::event_loop::{LoopExit, drive};
pub use self::resolver::Resolver;
pub use self::status::ResolverStatus;
