use crate::domain::entity::{EntityId, TenantId};
use crate::impl_entity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    OnHold,
    Completed,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Project {
    pub id: EntityId,
    pub tenant: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub customer_id: Option<EntityId>,
}

impl_entity!(Project, "projects");

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Board {
    pub id: EntityId,
    pub tenant: TenantId,
    pub project_id: EntityId,
    pub name: String,
    pub position: u32,
}

impl_entity!(Board, "boards");

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TaskList {
    pub id: EntityId,
    pub tenant: TenantId,
    pub board_id: EntityId,
    pub name: String,
    pub position: u32,
}

impl_entity!(TaskList, "task_lists");

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Task {
    pub id: EntityId,
    pub tenant: TenantId,
    pub task_list_id: EntityId,
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<EntityId>,
    pub due_date: Option<NaiveDate>,
    pub priority: TaskPriority,
    pub position: u32,
    pub completed: bool,
}

impl_entity!(Task, "tasks");

/// Lists every new project board starts with.
pub const DEFAULT_TASK_LISTS: [&str; 3] = ["To Do", "In Progress", "Done"];
