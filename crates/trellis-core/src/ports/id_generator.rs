//! IdGenerator port - ID 生成の抽象化
//!
//! テストでは `FixedClock` を渡して ULID の時刻部分を固定できます。

use crate::domain::ids::{ProjectId, TaskId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は ULID ベースの ID を生成
pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;

    fn generate_project_id(&self) -> ProjectId;
}

/// ULID generator whose timestamp part comes from a `Clock`.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        TaskId::from(self.next_ulid())
    }

    fn generate_project_id(&self) -> ProjectId {
        ProjectId::from(self.next_ulid())
    }
}
