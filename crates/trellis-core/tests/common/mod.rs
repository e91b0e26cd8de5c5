#![allow(dead_code)]

use std::sync::Arc;

use trellis_core::WorkflowCoordinator;
use trellis_core::domain::{Actor, RequestContext, TaskId};
use trellis_core::impls::InMemoryEventSink;

pub struct Fixture {
    pub coordinator: Arc<WorkflowCoordinator>,
    pub ctx: RequestContext,
    pub events: InMemoryEventSink,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_coordinator(WorkflowCoordinator::default()).await
    }

    pub async fn with_coordinator(coordinator: WorkflowCoordinator) -> Self {
        let events = InMemoryEventSink::new();
        let coordinator = coordinator.with_event_sink(Arc::new(events.clone()));
        let project = coordinator.create_project().await;
        Self {
            coordinator: Arc::new(coordinator),
            ctx: RequestContext::new(project, Actor::manager("marko")),
            events,
        }
    }

    pub fn member(&self, username: &str) -> RequestContext {
        RequestContext::new(self.ctx.project_id, Actor::member(username))
    }

    /// A new task with the fixture's manager as its only member.
    pub async fn task(&self, title: &str) -> TaskId {
        let id = self
            .coordinator
            .create_task(&self.ctx, title, "")
            .await
            .expect("create task")
            .id;
        self.coordinator
            .add_task_members(&self.ctx, id, &["marko"])
            .await
            .expect("assign task member");
        id
    }

    /// `to` depends on `from`.
    pub async fn depends(&self, to: TaskId, from: TaskId) {
        self.coordinator
            .add_dependency(&self.ctx, from, to)
            .await
            .expect("add dependency");
    }
}
