//! App - アプリケーション層
//!
//! ポートとプロジェクトごとのワークフローを結びつけます。
//!
//! # コンポーネント
//! - **WorkflowCoordinator**: タスク・依存・ステータス操作の async 入口
//! - **CoordinatorConfig**: TOML から読む `[guard]` 設定
//! - **ProjectCounts**: プロジェクトのステータス集計

pub mod config;
pub mod coordinator;
pub mod status;

pub use self::config::{load_from_path, ConfigError, CoordinatorConfig};
pub use self::coordinator::WorkflowCoordinator;
pub use self::status::ProjectCounts;
