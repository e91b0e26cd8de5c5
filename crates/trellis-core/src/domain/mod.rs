//! Domain model (ids, status, task records, request context, errors, events).

pub mod context;
pub mod errors;
pub mod events;
pub mod ids;
pub mod status;
pub mod task;

pub use context::{Actor, RequestContext, Role};
pub use errors::WorkflowError;
pub use events::DomainEvent;
pub use ids::{IdParseError, ProjectId, TaskId};
pub use status::TaskStatus;
pub use task::{DependencyEdge, DependencyRecord, ProjectGraphView, Task, TaskView};
