//! EventSink port - 書き込みがコミットされた後のドメインイベントの出口
//!
//! 実装は `impls` にあります（tracing, インメモリ記録）。
//! ユーザーへの通知は対象外。sink はイベントを受け取るだけです。

use async_trait::async_trait;

use crate::domain::DomainEvent;

/// EventSink はコミット済みのドメインイベントを受け取る
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: DomainEvent);
}

/// すべてのイベントを捨てる
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEventSink;

#[async_trait]
impl EventSink for NoopEventSink {
    async fn emit(&self, _event: DomainEvent) {}
}
