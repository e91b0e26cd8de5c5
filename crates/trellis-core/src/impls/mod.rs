//! Impls - コアに同梱するポート実装
//!
//! - **TracingEventSink**: すべてのドメインイベントを `tracing` で出力
//! - **InMemoryEventSink**: テストや組み込み利用のためにイベントを記録

pub mod inmem_events;
pub mod tracing_sink;

pub use self::inmem_events::InMemoryEventSink;
pub use self::tracing_sink::TracingEventSink;
