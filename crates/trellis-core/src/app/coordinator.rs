//! WorkflowCoordinator - async façade over every project's workflow.
//!
//! Concurrency model:
//! - Each project lives in its own slot: `Mutex<Arc<ProjectWorkflow>>`.
//! - Writers hold the slot lock for the whole check-then-commit sequence and
//!   mutate through `Arc::make_mut`. Two edge insertions in one project can
//!   therefore never both pass the cycle check against the same state.
//! - Readers hold the lock only to clone the `Arc`. If a reader still holds
//!   that snapshot when the next write happens, `make_mut` copies first, so
//!   a snapshot never changes underneath its holder.
//! - Events are emitted after the slot lock is released.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::config::CoordinatorConfig;
use super::status::ProjectCounts;
use crate::domain::{
    DependencyEdge, DomainEvent, ProjectGraphView, ProjectId, RequestContext, Task, TaskId,
    TaskStatus, TaskView, WorkflowError,
};
use crate::impls::TracingEventSink;
use crate::ports::{Clock, EventSink, IdGenerator, SystemClock, UlidGenerator};
use crate::workflow::{DependencyQuery, Direction, ProjectWorkflow, TransitionDecision};

type ProjectSlot = Arc<Mutex<Arc<ProjectWorkflow>>>;

pub struct WorkflowCoordinator {
    projects: RwLock<HashMap<ProjectId, ProjectSlot>>,
    config: CoordinatorConfig,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    events: Arc<dyn EventSink>,
}

impl WorkflowCoordinator {
    /// Coordinator with the wall clock, ULID ids and a tracing event sink.
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            config,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UlidGenerator::new(SystemClock)),
            events: Arc::new(TracingEventSink),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    // ----------------------------------------------------------------
    // Projects
    // ----------------------------------------------------------------

    /// Register a project under a fresh id.
    pub async fn create_project(&self) -> ProjectId {
        let id = self.ids.generate_project_id();
        self.ensure_project(id).await;
        id
    }

    /// Register `id` if it is not known yet. Idempotent.
    pub async fn ensure_project(&self, id: ProjectId) {
        let mut projects = self.projects.write().await;
        projects.entry(id).or_insert_with(|| {
            info!(project = %id, "project registered");
            Arc::new(Mutex::new(Arc::new(ProjectWorkflow::new(id, self.config.guard))))
        });
    }

    async fn slot(&self, id: ProjectId) -> Result<ProjectSlot, WorkflowError> {
        self.projects
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(WorkflowError::ProjectNotFound(id))
    }

    /// Consistent, immutable view of one project.
    pub async fn snapshot(&self, ctx: &RequestContext) -> Result<Arc<ProjectWorkflow>, WorkflowError> {
        let slot = self.slot(ctx.project_id).await?;
        let current = slot.lock().await;
        Ok(Arc::clone(&current))
    }

    /// Run `f` against the project with writers serialized.
    ///
    /// `f` must validate before it mutates: an `Err` leaves the project as it
    /// was.
    async fn write<T>(
        &self,
        ctx: &RequestContext,
        f: impl FnOnce(&mut ProjectWorkflow) -> Result<T, WorkflowError>,
    ) -> Result<T, WorkflowError> {
        let slot = self.slot(ctx.project_id).await?;
        let mut current = slot.lock().await;
        f(Arc::make_mut(&mut current))
    }

    // ----------------------------------------------------------------
    // Tasks
    // ----------------------------------------------------------------

    /// Create a `Pending` task with no dependencies.
    pub async fn create_task(
        &self,
        ctx: &RequestContext,
        title: &str,
        description: &str,
    ) -> Result<Task, WorkflowError> {
        let id = self.ids.generate_task_id();
        let task = Task::new(id, ctx.project_id, title, description, self.clock.now());
        let created = self.write(ctx, |wf| wf.insert_task(task).cloned()).await?;

        info!(project = %ctx.project_id, task = %created.id, title = %created.title, "task created");
        self.events
            .emit(DomainEvent::TaskCreated {
                project: ctx.project_id,
                task: created.id,
                title: created.title.clone(),
            })
            .await;
        Ok(created)
    }

    /// Create the task under `id` unless it already exists. An existing task
    /// is returned unchanged.
    pub async fn ensure_task(
        &self,
        ctx: &RequestContext,
        id: TaskId,
        title: &str,
        description: &str,
    ) -> Result<Task, WorkflowError> {
        let now = self.clock.now();
        let (task, created) = self
            .write(ctx, |wf| {
                if let Ok(existing) = wf.task(id) {
                    return Ok((existing.clone(), false));
                }
                let task = Task::new(id, ctx.project_id, title, description, now);
                wf.insert_task(task).map(|t| (t.clone(), true))
            })
            .await?;

        if created {
            info!(project = %ctx.project_id, task = %id, "task node ensured (created)");
            self.events
                .emit(DomainEvent::TaskCreated {
                    project: ctx.project_id,
                    task: id,
                    title: task.title.clone(),
                })
                .await;
        } else {
            debug!(project = %ctx.project_id, task = %id, "task node ensured (already present)");
        }
        Ok(task)
    }

    pub async fn get_task(&self, ctx: &RequestContext, id: TaskId) -> Result<TaskView, WorkflowError> {
        self.snapshot(ctx).await?.view(id)
    }

    // ----------------------------------------------------------------
    // Dependencies
    // ----------------------------------------------------------------

    /// Record that `to` depends on `from`. Managers only.
    pub async fn add_dependency(
        &self,
        ctx: &RequestContext,
        from: TaskId,
        to: TaskId,
    ) -> Result<DependencyEdge, WorkflowError> {
        ctx.require_manager("add dependencies")?;

        let edge = self
            .write(ctx, |wf| wf.add_dependency(from, to))
            .await
            .inspect_err(|err| {
                warn!(project = %ctx.project_id, %from, %to, code = err.code(), "dependency rejected: {err}");
            })?;

        info!(project = %ctx.project_id, %from, %to, "dependency added: {to} <- {from}");
        self.events
            .emit(DomainEvent::DependencyAdded {
                project: ctx.project_id,
                from,
                to,
            })
            .await;
        Ok(edge)
    }

    /// Drop the edge `from -> to`. Managers only.
    pub async fn remove_dependency(
        &self,
        ctx: &RequestContext,
        from: TaskId,
        to: TaskId,
    ) -> Result<DependencyEdge, WorkflowError> {
        ctx.require_manager("remove dependencies")?;

        let edge = self
            .write(ctx, |wf| wf.remove_dependency(from, to))
            .await
            .inspect_err(|err| {
                warn!(project = %ctx.project_id, %from, %to, code = err.code(), "dependency removal rejected: {err}");
            })?;

        info!(project = %ctx.project_id, %from, %to, "dependency removed");
        self.events
            .emit(DomainEvent::DependencyRemoved {
                project: ctx.project_id,
                from,
                to,
            })
            .await;
        Ok(edge)
    }

    /// Tasks `id` directly depends on, over the current snapshot.
    pub async fn get_dependencies(
        &self,
        ctx: &RequestContext,
        id: TaskId,
    ) -> Result<DependencyQuery, WorkflowError> {
        let snapshot = self.snapshot(ctx).await?;
        debug!(project = %ctx.project_id, task = %id, "dependencies queried");
        DependencyQuery::new(snapshot, id, Direction::Dependencies)
    }

    /// Tasks directly depending on `id`, over the current snapshot.
    pub async fn get_dependents(
        &self,
        ctx: &RequestContext,
        id: TaskId,
    ) -> Result<DependencyQuery, WorkflowError> {
        let snapshot = self.snapshot(ctx).await?;
        debug!(project = %ctx.project_id, task = %id, "dependents queried");
        DependencyQuery::new(snapshot, id, Direction::Dependents)
    }

    pub async fn project_dependencies(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<DependencyEdge>, WorkflowError> {
        Ok(self.snapshot(ctx).await?.edges())
    }

    pub async fn project_graph(&self, ctx: &RequestContext) -> Result<ProjectGraphView, WorkflowError> {
        Ok(self.snapshot(ctx).await?.graph_view())
    }

    pub async fn execution_order(&self, ctx: &RequestContext) -> Result<Vec<TaskId>, WorkflowError> {
        Ok(self.snapshot(ctx).await?.execution_order())
    }

    pub async fn counts(&self, ctx: &RequestContext) -> Result<ProjectCounts, WorkflowError> {
        Ok(ProjectCounts::from_project(&*self.snapshot(ctx).await?))
    }

    // ----------------------------------------------------------------
    // Task members
    // ----------------------------------------------------------------

    /// Assign users to a task. Managers only. Already assigned users are
    /// skipped; the returned task lists every member.
    pub async fn add_task_members(
        &self,
        ctx: &RequestContext,
        id: TaskId,
        usernames: &[&str],
    ) -> Result<Task, WorkflowError> {
        ctx.require_manager("assign task members")?;

        let now = self.clock.now();
        let (added, task) = self
            .write(ctx, |wf| {
                let added = wf.add_members(id, usernames, now)?;
                Ok((added, wf.task(id)?.clone()))
            })
            .await
            .inspect_err(|err| {
                warn!(project = %ctx.project_id, task = %id, code = err.code(), "member assignment rejected: {err}");
            })?;

        if added.is_empty() {
            debug!(project = %ctx.project_id, task = %id, "no new members to add");
            return Ok(task);
        }

        info!(project = %ctx.project_id, task = %id, added = added.len(), "members added to task");
        self.events
            .emit(DomainEvent::MembersAdded {
                project: ctx.project_id,
                task: id,
                usernames: added,
            })
            .await;
        Ok(task)
    }

    /// Unassign one user. Managers only; completed tasks keep their members.
    pub async fn remove_task_member(
        &self,
        ctx: &RequestContext,
        id: TaskId,
        username: &str,
    ) -> Result<Task, WorkflowError> {
        ctx.require_manager("remove task members")?;

        let now = self.clock.now();
        let task = self
            .write(ctx, |wf| wf.remove_member(id, username, now).cloned())
            .await
            .inspect_err(|err| {
                warn!(project = %ctx.project_id, task = %id, %username, code = err.code(), "member removal rejected: {err}");
            })?;

        info!(project = %ctx.project_id, task = %id, %username, "member removed from task");
        self.events
            .emit(DomainEvent::MemberRemoved {
                project: ctx.project_id,
                task: id,
                username: username.to_string(),
            })
            .await;
        Ok(task)
    }

    // ----------------------------------------------------------------
    // Status transitions
    // ----------------------------------------------------------------

    pub async fn can_transition(
        &self,
        ctx: &RequestContext,
        id: TaskId,
        new_status: TaskStatus,
    ) -> Result<TransitionDecision, WorkflowError> {
        self.snapshot(ctx).await?.can_transition(id, new_status)
    }

    /// Change the status of `id` if the actor is one of its members and its
    /// dependencies allow it.
    pub async fn apply_transition(
        &self,
        ctx: &RequestContext,
        id: TaskId,
        new_status: TaskStatus,
    ) -> Result<Task, WorkflowError> {
        let now = self.clock.now();
        let (previous, task) = self
            .write(ctx, |wf| {
                if !wf.task(id)?.is_member(&ctx.actor.username) {
                    return Err(WorkflowError::Forbidden {
                        username: ctx.actor.username.clone(),
                        action: "change the status of this task",
                    });
                }
                wf.apply_transition(id, new_status, now)
                    .map(|(previous, task)| (previous, task.clone()))
            })
            .await
            .inspect_err(|err| {
                warn!(project = %ctx.project_id, task = %id, status = %new_status, code = err.code(), "status change refused: {err}");
            })?;

        if previous == new_status {
            debug!(project = %ctx.project_id, task = %id, status = %new_status, "status unchanged");
            return Ok(task);
        }

        info!(
            project = %ctx.project_id,
            task = %id,
            from = %previous,
            to = %new_status,
            user = %ctx.actor.username,
            "task status changed"
        );
        self.events
            .emit(DomainEvent::StatusChanged {
                project: ctx.project_id,
                task: id,
                from: previous,
                to: new_status,
                changed_by: ctx.actor.username.clone(),
            })
            .await;
        Ok(task)
    }
}

impl Default for WorkflowCoordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Actor;
    use crate::impls::InMemoryEventSink;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    async fn setup() -> (WorkflowCoordinator, RequestContext, InMemoryEventSink) {
        let sink = InMemoryEventSink::new();
        let coordinator = WorkflowCoordinator::default().with_event_sink(Arc::new(sink.clone()));
        let project = coordinator.create_project().await;
        (coordinator, RequestContext::new(project, Actor::manager("marko")), sink)
    }

    #[tokio::test]
    async fn unknown_project_is_reported() {
        let coordinator = WorkflowCoordinator::default();
        let ctx = RequestContext::new(
            ProjectId::from_ulid(ulid::Ulid::new()),
            Actor::manager("marko"),
        );
        let err = coordinator.create_task(&ctx, "a", "").await.unwrap_err();
        assert_eq!(err, WorkflowError::ProjectNotFound(ctx.project_id));
    }

    #[tokio::test]
    async fn create_task_uses_clock_and_emits_event() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let sink = InMemoryEventSink::new();
        let coordinator = WorkflowCoordinator::default()
            .with_clock(Arc::new(FixedClock::new(at)))
            .with_event_sink(Arc::new(sink.clone()));
        let project = coordinator.create_project().await;
        let ctx = RequestContext::new(project, Actor::member("ana"));

        let task = coordinator.create_task(&ctx, "write docs", "all of them").await.unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, at);
        assert_eq!(
            sink.events().await,
            vec![DomainEvent::TaskCreated {
                project,
                task: task.id,
                title: "write docs".into(),
            }]
        );
    }

    #[tokio::test]
    async fn ensure_task_is_idempotent() {
        let (coordinator, ctx, sink) = setup().await;
        let id = TaskId::from_ulid(ulid::Ulid::new());

        let first = coordinator.ensure_task(&ctx, id, "a", "first").await.unwrap();
        let second = coordinator.ensure_task(&ctx, id, "renamed", "second").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.title, "a");
        assert_eq!(sink.events().await.len(), 1);
    }

    #[tokio::test]
    async fn members_cannot_edit_dependencies() {
        let (coordinator, ctx, _) = setup().await;
        let a = coordinator.create_task(&ctx, "a", "").await.unwrap().id;
        let b = coordinator.create_task(&ctx, "b", "").await.unwrap().id;
        let member = RequestContext::new(ctx.project_id, Actor::member("ana"));

        let err = coordinator.add_dependency(&member, a, b).await.unwrap_err();
        assert_eq!(err.code(), "forbidden");
        assert!(coordinator.project_dependencies(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_edge_emits_nothing() {
        let (coordinator, ctx, sink) = setup().await;
        let a = coordinator.create_task(&ctx, "a", "").await.unwrap().id;
        sink.clear().await;

        let err = coordinator.add_dependency(&ctx, a, a).await.unwrap_err();
        assert_eq!(err, WorkflowError::SelfDependency { task: a });
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn unchanged_status_emits_nothing() {
        let (coordinator, ctx, sink) = setup().await;
        let a = coordinator.create_task(&ctx, "a", "").await.unwrap().id;
        coordinator.add_task_members(&ctx, a, &["marko"]).await.unwrap();
        sink.clear().await;

        let task = coordinator.apply_transition(&ctx, a, TaskStatus::Pending).await.unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(sink.events().await.is_empty());
    }

    #[tokio::test]
    async fn status_change_records_actor() {
        let (coordinator, ctx, sink) = setup().await;
        let a = coordinator.create_task(&ctx, "a", "").await.unwrap().id;
        coordinator.add_task_members(&ctx, a, &["ana"]).await.unwrap();
        sink.clear().await;

        let member = RequestContext::new(ctx.project_id, Actor::member("ana"));
        coordinator.apply_transition(&member, a, TaskStatus::InProgress).await.unwrap();

        assert_eq!(
            sink.events().await,
            vec![DomainEvent::StatusChanged {
                project: ctx.project_id,
                task: a,
                from: TaskStatus::Pending,
                to: TaskStatus::InProgress,
                changed_by: "ana".into(),
            }]
        );
    }

    #[tokio::test]
    async fn counts_follow_writes() {
        let (coordinator, ctx, _) = setup().await;
        let a = coordinator.create_task(&ctx, "a", "").await.unwrap().id;
        let b = coordinator.create_task(&ctx, "b", "").await.unwrap().id;
        coordinator.add_dependency(&ctx, a, b).await.unwrap();

        let counts = coordinator.counts(&ctx).await.unwrap();
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.blocked, 1);
        assert_eq!(counts.dependencies, 1);
    }

    #[tokio::test]
    async fn only_task_members_change_status() {
        let (coordinator, ctx, sink) = setup().await;
        let a = coordinator.create_task(&ctx, "a", "").await.unwrap().id;
        coordinator.add_task_members(&ctx, a, &["ana"]).await.unwrap();
        sink.clear().await;

        // Being a project manager is not enough.
        let err = coordinator.apply_transition(&ctx, a, TaskStatus::InProgress).await.unwrap_err();
        assert_eq!(err.http_status(), 403);
        let outsider = RequestContext::new(ctx.project_id, Actor::member("ivan"));
        let err = coordinator
            .apply_transition(&outsider, a, TaskStatus::InProgress)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Forbidden {
                username: "ivan".into(),
                action: "change the status of this task",
            }
        );
        assert!(sink.events().await.is_empty());
        assert_eq!(coordinator.get_task(&ctx, a).await.unwrap().task.status, TaskStatus::Pending);

        let ana = RequestContext::new(ctx.project_id, Actor::member("ana"));
        let task = coordinator.apply_transition(&ana, a, TaskStatus::InProgress).await.unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn member_changes_are_manager_only_and_emit_events() {
        let (coordinator, ctx, sink) = setup().await;
        let a = coordinator.create_task(&ctx, "a", "").await.unwrap().id;
        sink.clear().await;

        let member = RequestContext::new(ctx.project_id, Actor::member("ana"));
        let err = coordinator.add_task_members(&member, a, &["ana"]).await.unwrap_err();
        assert_eq!(err.code(), "forbidden");

        let task = coordinator.add_task_members(&ctx, a, &["ana", "ivan"]).await.unwrap();
        assert_eq!(task.members, vec!["ana", "ivan"]);
        // Nothing new to add, nothing to emit.
        coordinator.add_task_members(&ctx, a, &["ana"]).await.unwrap();

        let task = coordinator.remove_task_member(&ctx, a, "ivan").await.unwrap();
        assert_eq!(task.members, vec!["ana"]);
        let err = coordinator.remove_task_member(&ctx, a, "ivan").await.unwrap_err();
        assert_eq!(err.http_status(), 404);

        assert_eq!(
            sink.events().await,
            vec![
                DomainEvent::MembersAdded {
                    project: ctx.project_id,
                    task: a,
                    usernames: vec!["ana".into(), "ivan".into()],
                },
                DomainEvent::MemberRemoved {
                    project: ctx.project_id,
                    task: a,
                    username: "ivan".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn configured_guard_reaches_every_project() {
        let config = CoordinatorConfig::from_toml_str("[guard]\nrule = \"dependency_completed\"\n").unwrap();
        let coordinator = WorkflowCoordinator::new(config);
        let project = coordinator.create_project().await;
        let ctx = RequestContext::new(project, Actor::manager("marko"));

        let snapshot = coordinator.snapshot(&ctx).await.unwrap();
        assert_eq!(snapshot.guard(), coordinator.config().guard);
        assert_eq!(snapshot.guard().rule, crate::workflow::TransitionRule::DependencyCompleted);
    }
}
