//! trellis-core
//!
//! プロジェクト内タスクの依存関係とステータス遷移を調整するコア。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, status, context, errors, events）
//! - **workflow**: タスクストア、依存グラフ、遷移ガード、依存クエリ
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, EventSink）
//! - **impls**: 実装（tracing / インメモリの EventSink）
//! - **app**: アプリケーション層（WorkflowCoordinator, 設定, ステータス集計）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod workflow;

pub use app::{CoordinatorConfig, WorkflowCoordinator};
pub use domain::{TaskId, TaskStatus, WorkflowError};
