use super::{DataObject, Writable, normalize_optional, require};
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::project::{Board, Project, ProjectStatus, Task, TaskList, TaskPriority};
use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub customer_id: Option<EntityId>,
}

impl DataObject for ProjectData {
    type Model = Project;

    fn from_model(model: &Project) -> Self {
        Self {
            name: model.name.clone(),
            description: model.description.clone(),
            status: model.status,
            customer_id: model.customer_id,
        }
    }
}

impl Writable for ProjectData {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)
    }

    fn to_model(&self, tenant: TenantId) -> Result<Project> {
        Ok(Project {
            id: 0,
            tenant,
            name: self.name.trim().to_string(),
            description: normalize_optional(&self.description),
            status: self.status,
            customer_id: self.customer_id,
        })
    }

    fn apply_to(&self, model: &mut Project) -> Result<()> {
        model.name = self.name.trim().to_string();
        model.description = normalize_optional(&self.description);
        model.status = self.status;
        model.customer_id = self.customer_id;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardData {
    pub project_id: EntityId,
    pub name: String,
    #[serde(default)]
    pub position: u32,
}

impl DataObject for BoardData {
    type Model = Board;

    fn from_model(model: &Board) -> Self {
        Self {
            project_id: model.project_id,
            name: model.name.clone(),
            position: model.position,
        }
    }
}

impl Writable for BoardData {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)
    }

    fn to_model(&self, tenant: TenantId) -> Result<Board> {
        Ok(Board {
            id: 0,
            tenant,
            project_id: self.project_id,
            name: self.name.trim().to_string(),
            position: self.position,
        })
    }

    fn apply_to(&self, model: &mut Board) -> Result<()> {
        model.name = self.name.trim().to_string();
        model.position = self.position;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskListData {
    pub board_id: EntityId,
    pub name: String,
    #[serde(default)]
    pub position: u32,
}

impl DataObject for TaskListData {
    type Model = TaskList;

    fn from_model(model: &TaskList) -> Self {
        Self {
            board_id: model.board_id,
            name: model.name.clone(),
            position: model.position,
        }
    }
}

impl Writable for TaskListData {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)
    }

    fn to_model(&self, tenant: TenantId) -> Result<TaskList> {
        Ok(TaskList {
            id: 0,
            tenant,
            board_id: self.board_id,
            name: self.name.trim().to_string(),
            position: self.position,
        })
    }

    fn apply_to(&self, model: &mut TaskList) -> Result<()> {
        model.name = self.name.trim().to_string();
        model.position = self.position;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    pub task_list_id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assignee_id: Option<EntityId>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub completed: bool,
}

impl DataObject for TaskData {
    type Model = Task;

    fn from_model(model: &Task) -> Self {
        Self {
            task_list_id: model.task_list_id,
            title: model.title.clone(),
            description: model.description.clone(),
            assignee_id: model.assignee_id,
            due_date: model.due_date,
            priority: model.priority,
            completed: model.completed,
        }
    }
}

impl Writable for TaskData {
    fn validate(&self) -> Result<()> {
        require("title", &self.title)
    }

    fn to_model(&self, tenant: TenantId) -> Result<Task> {
        Ok(Task {
            id: 0,
            tenant,
            task_list_id: self.task_list_id,
            title: self.title.trim().to_string(),
            description: normalize_optional(&self.description),
            assignee_id: self.assignee_id,
            due_date: self.due_date,
            priority: self.priority,
            position: 0,
            completed: self.completed,
        })
    }

    /// Moving between lists goes through the project service.
    fn apply_to(&self, model: &mut Task) -> Result<()> {
        model.title = self.title.trim().to_string();
        model.description = normalize_optional(&self.description);
        model.assignee_id = self.assignee_id;
        model.due_date = self.due_date;
        model.priority = self.priority;
        model.completed = self.completed;
        Ok(())
    }
}
