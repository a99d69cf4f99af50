use crate::application::crud::CrudService;
use crate::application::dto::{BoardData, ProjectData, TaskData, TaskListData};
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::project::{Board, DEFAULT_TASK_LISTS, Project, Task, TaskList};
use crate::error::Result;
use tracing::info;

/// Projects with their boards, task lists and tasks.
pub struct ProjectService {
    projects: CrudService<ProjectData>,
    boards: CrudService<BoardData>,
    lists: CrudService<TaskListData>,
    tasks: CrudService<TaskData>,
}

impl ProjectService {
    pub fn new(
        projects: CrudService<ProjectData>,
        boards: CrudService<BoardData>,
        lists: CrudService<TaskListData>,
        tasks: CrudService<TaskData>,
    ) -> Self {
        Self {
            projects,
            boards,
            lists,
            tasks,
        }
    }

    /// Creates the project with a default board holding the standard lists.
    pub async fn create(&self, tenant: TenantId, data: &ProjectData) -> Result<Project> {
        let project = self.projects.create(tenant, data).await?;
        let board = self
            .boards
            .create(
                tenant,
                &BoardData {
                    project_id: project.id,
                    name: project.name.clone(),
                    position: 0,
                },
            )
            .await?;
        for (position, name) in (0u32..).zip(DEFAULT_TASK_LISTS) {
            self.lists
                .create(
                    tenant,
                    &TaskListData {
                        board_id: board.id,
                        name: name.to_string(),
                        position,
                    },
                )
                .await?;
        }
        Ok(project)
    }

    pub async fn update(&self, tenant: TenantId, id: EntityId, data: &ProjectData) -> Result<Project> {
        self.projects.update(tenant, id, data).await
    }

    pub async fn find(&self, tenant: TenantId, id: EntityId) -> Result<Project> {
        self.projects.find(tenant, id).await
    }

    pub async fn list(&self, tenant: TenantId) -> Result<Vec<Project>> {
        self.projects.list(tenant).await
    }

    /// Deletes the project together with its boards, lists and tasks.
    pub async fn delete(&self, tenant: TenantId, id: EntityId) -> Result<()> {
        self.projects.find(tenant, id).await?;
        let mut removed = 0usize;
        for board in self.boards(tenant, id).await? {
            for list in self.task_lists(tenant, board.id).await? {
                for task in self.tasks(tenant, list.id).await? {
                    self.tasks.delete(tenant, task.id).await?;
                    removed += 1;
                }
                self.lists.delete(tenant, list.id).await?;
            }
            self.boards.delete(tenant, board.id).await?;
        }
        self.projects.delete(tenant, id).await?;
        info!(project = id, tasks = removed, "project deleted");
        Ok(())
    }

    pub async fn boards(&self, tenant: TenantId, project_id: EntityId) -> Result<Vec<Board>> {
        let mut boards: Vec<Board> = self
            .boards
            .list(tenant)
            .await?
            .into_iter()
            .filter(|b| b.project_id == project_id)
            .collect();
        boards.sort_by_key(|b| (b.position, b.id));
        Ok(boards)
    }

    pub async fn task_lists(&self, tenant: TenantId, board_id: EntityId) -> Result<Vec<TaskList>> {
        let mut lists: Vec<TaskList> = self
            .lists
            .list(tenant)
            .await?
            .into_iter()
            .filter(|l| l.board_id == board_id)
            .collect();
        lists.sort_by_key(|l| (l.position, l.id));
        Ok(lists)
    }

    /// Tasks of a list in display order.
    pub async fn tasks(&self, tenant: TenantId, list_id: EntityId) -> Result<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .tasks
            .list(tenant)
            .await?
            .into_iter()
            .filter(|t| t.task_list_id == list_id)
            .collect();
        tasks.sort_by_key(|t| (t.position, t.id));
        Ok(tasks)
    }

    pub async fn add_board(&self, tenant: TenantId, data: &BoardData) -> Result<Board> {
        self.projects.find(tenant, data.project_id).await?;
        self.boards.create(tenant, data).await
    }

    pub async fn add_task_list(&self, tenant: TenantId, data: &TaskListData) -> Result<TaskList> {
        self.boards.find(tenant, data.board_id).await?;
        self.lists.create(tenant, data).await
    }

    /// Adds a task at the end of its list.
    pub async fn add_task(&self, tenant: TenantId, data: &TaskData) -> Result<Task> {
        self.lists.find(tenant, data.task_list_id).await?;
        let position = self.tasks(tenant, data.task_list_id).await?.len() as u32;
        let mut task = self.tasks.create(tenant, data).await?;
        task.position = position;
        self.tasks.save(&task).await?;
        Ok(task)
    }

    pub async fn update_task(&self, tenant: TenantId, id: EntityId, data: &TaskData) -> Result<Task> {
        self.tasks.update(tenant, id, data).await
    }

    pub async fn delete_task(&self, tenant: TenantId, id: EntityId) -> Result<()> {
        let task = self.tasks.find(tenant, id).await?;
        self.tasks.delete(tenant, id).await?;
        self.renumber(self.tasks(tenant, task.task_list_id).await?).await
    }

    /// Moves a task to `position` in `list_id` and renumbers both lists.
    pub async fn move_task(&self, tenant: TenantId, id: EntityId, list_id: EntityId, position: u32) -> Result<Task> {
        let mut task = self.tasks.find(tenant, id).await?;
        self.lists.find(tenant, list_id).await?;
        let source_list = task.task_list_id;

        let mut target: Vec<Task> = self
            .tasks(tenant, list_id)
            .await?
            .into_iter()
            .filter(|t| t.id != id)
            .collect();
        task.task_list_id = list_id;
        let index = (position as usize).min(target.len());
        target.insert(index, task);
        self.renumber(target).await?;

        if source_list != list_id {
            self.renumber(self.tasks(tenant, source_list).await?).await?;
        }
        info!(task = id, list = list_id, position = index, "task moved");
        self.tasks.find(tenant, id).await
    }

    async fn renumber(&self, tasks: Vec<Task>) -> Result<()> {
        for (position, mut task) in (0u32..).zip(tasks) {
            task.position = position;
            self.tasks.save(&task).await?;
        }
        Ok(())
    }
}
