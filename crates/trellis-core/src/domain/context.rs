//! Request context passed explicitly into every coordinator call.

use serde::{Deserialize, Serialize};

use super::errors::WorkflowError;
use super::ids::ProjectId;

/// Role of the acting user inside a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    Member,
}

/// The already-authenticated user performing a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
    pub role: Role,
}

impl Actor {
    pub fn manager(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Manager,
        }
    }

    pub fn member(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Member,
        }
    }
}

/// Project scope plus acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub project_id: ProjectId,
    pub actor: Actor,
}

impl RequestContext {
    pub fn new(project_id: ProjectId, actor: Actor) -> Self {
        Self { project_id, actor }
    }

    /// Fail with `Forbidden` unless the actor is a manager.
    pub fn require_manager(&self, action: &'static str) -> Result<(), WorkflowError> {
        match self.actor.role {
            Role::Manager => Ok(()),
            Role::Member => Err(WorkflowError::Forbidden {
                username: self.actor.username.clone(),
                action,
            }),
        }
    }
}
