//! Task Repository
//!
//! Stage writes go through [`crate::dispatch`] first; the accept path uses
//! a single transaction so the one-active-task rule holds under concurrent
//! accepts.

use super::{BaseRepository, CounterRepository, RepoError, RepoResult, check_transaction, parse_id};
use crate::db::models::{Task, TaskComment, TaskCreate, TaskStage, TaskUpdate, User};
use crate::dispatch::{self, DispatchError};
use crate::utils::time::now_ms;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

#[derive(Clone)]
pub struct TaskRepository {
    base: BaseRepository,
    counters: CounterRepository,
}

impl TaskRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            counters: CounterRepository::new(db.clone()),
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Task>> {
        let tasks: Vec<Task> = self
            .base
            .db()
            .query("SELECT * FROM task ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(tasks)
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Task>> {
        let thing = parse_id(id, "task")?;
        let task: Option<Task> = self.base.db().select(thing).await?;
        Ok(task)
    }

    /// Tasks visible to a technician, newest first. `search` matches the
    /// ticket number or the customer name.
    pub async fn find_for_assignee(
        &self,
        assignee_id: &str,
        search: Option<&str>,
    ) -> RepoResult<Vec<Task>> {
        let thing = parse_id(assignee_id, "user")?;

        let tasks: Vec<Task> = match search {
            Some(q) if !q.trim().is_empty() => {
                let q = q.trim().to_lowercase();
                let number: i64 = q.parse().unwrap_or(-1);
                self.base
                    .db()
                    .query(
                        r#"SELECT * FROM task WHERE assignee = $assignee
                            AND (number = $number
                                OR string::lowercase(customer.name) CONTAINS $q)
                            ORDER BY created_at DESC"#,
                    )
                    .bind(("assignee", thing))
                    .bind(("number", number))
                    .bind(("q", q))
                    .await?
                    .take(0)?
            }
            _ => {
                self.base
                    .db()
                    .query("SELECT * FROM task WHERE assignee = $assignee ORDER BY created_at DESC")
                    .bind(("assignee", thing))
                    .await?
                    .take(0)?
            }
        };

        Ok(tasks)
    }

    /// Tasks holding a technician's active slot, stage set per
    /// [`dispatch::is_active`]
    pub async fn find_ongoing_for(&self, assignee_id: &str) -> RepoResult<Vec<Task>> {
        let thing = parse_id(assignee_id, "user")?;
        let mut result = self
            .base
            .db()
            .query(
                r#"SELECT * FROM task WHERE assignee = $assignee
                    AND stage IN $active
                    ORDER BY created_at"#,
            )
            .bind(("assignee", thing))
            .bind(("active", dispatch::active_stage_names()))
            .await?;
        let tasks: Vec<Task> = result.take(0)?;
        Ok(tasks)
    }

    /// Create a ticket, optionally pre-assigned. A pre-assigned ticket stays
    /// `pending` until the technician accepts it.
    pub async fn create(&self, data: TaskCreate) -> RepoResult<Task> {
        let customer: Option<crate::db::models::Customer> =
            self.base.db().select(data.customer.clone()).await?;
        if customer.is_none() {
            return Err(RepoError::Validation(format!(
                "Customer {} not found",
                data.customer
            )));
        }
        let category: Option<crate::db::models::Category> =
            self.base.db().select(data.category.clone()).await?;
        if category.is_none() {
            return Err(RepoError::Validation(format!(
                "Category {} not found",
                data.category
            )));
        }
        if let Some(ref assignee) = data.assignee {
            self.require_technician(&assignee.to_string()).await?;
        }

        let number = self.counters.next("task").await?;
        let now = now_ms();

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE task SET
                    number = $number,
                    customer = $customer,
                    category = $category,
                    description = $description,
                    priority = $priority,
                    stage = 'pending',
                    assignee = $assignee,
                    comments = [],
                    created_at = $now,
                    updated_at = $now,
                    finished_at = NONE
                RETURN AFTER"#,
            )
            .bind(("number", number))
            .bind(("customer", data.customer))
            .bind(("category", data.category))
            .bind(("description", data.description))
            .bind(("priority", data.priority))
            .bind(("assignee", data.assignee))
            .bind(("now", now))
            .await?;

        let created: Option<Task> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create task".to_string()))
    }

    /// Edit description, priority or category. Terminal tasks are frozen.
    pub async fn update(&self, id: &str, data: TaskUpdate) -> RepoResult<Task> {
        let thing = parse_id(id, "task")?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))?;

        if dispatch::is_terminal(existing.stage) {
            return Err(RepoError::Conflict(
                "Completed or cancelled tasks cannot be edited".to_string(),
            ));
        }

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    category = IF $has_category THEN $category ELSE category END,
                    description = $description OR description,
                    priority = IF $has_priority THEN $priority ELSE priority END,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("has_category", data.category.is_some()))
            .bind(("category", data.category))
            .bind(("description", data.description))
            .bind(("has_priority", data.priority.is_some()))
            .bind(("priority", data.priority))
            .bind(("now", now_ms()))
            .await?;

        result
            .take::<Option<Task>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))
    }

    /// Assign (or re-assign before acceptance) a task to a technician
    pub async fn assign(&self, id: &str, technician_id: &str) -> RepoResult<Task> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))?;

        let next = dispatch::assign(existing.stage).map_err(map_dispatch)?;
        let technician = self.require_technician(technician_id).await?;
        let tech = technician
            .id
            .ok_or_else(|| RepoError::Database("User record has no id".to_string()))?;

        self.write_stage(id, next, Some(tech)).await
    }

    /// Technician accepts a task assigned (or pre-assigned) to them. Fails
    /// when they already hold another accepted or in-flight task.
    pub async fn accept(&self, id: &str, technician_id: &str) -> RepoResult<Task> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))?;

        self.require_assignee(&existing, technician_id)?;
        dispatch::accept(existing.stage).map_err(map_dispatch)?;

        let thing = parse_id(id, "task")?;
        let tech = parse_id(technician_id, "user")?;

        // Conflict check and stage write in one transaction
        let result = self
            .base
            .db()
            .query(
                r#"BEGIN TRANSACTION;
                LET $held = (SELECT VALUE id FROM task
                    WHERE assignee = $tech
                    AND stage IN $active
                    AND id != $task);
                IF array::len($held) > 0 { THROW "active_task_exists" };
                UPDATE $task SET stage = 'accepted', updated_at = $now;
                COMMIT TRANSACTION;"#,
            )
            .bind(("active", dispatch::active_stage_names()))
            .bind(("tech", tech))
            .bind(("task", thing))
            .bind(("now", now_ms()))
            .await?;

        check_transaction(
            result,
            "active_task_exists",
            &DispatchError::ActiveTaskExists.to_string(),
        )?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))
    }

    /// Forward progress by the assignee: accepted → arrived → completed
    pub async fn advance(&self, id: &str, technician_id: &str, to: TaskStage) -> RepoResult<Task> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))?;

        self.require_assignee(&existing, technician_id)?;
        let next = dispatch::advance(existing.stage, to).map_err(map_dispatch)?;

        self.write_stage(id, next, None).await
    }

    /// Cancel a non-terminal task (office side)
    pub async fn cancel(&self, id: &str) -> RepoResult<Task> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))?;

        let next = dispatch::cancel(existing.stage).map_err(map_dispatch)?;
        self.write_stage(id, next, None).await
    }

    /// Cancel by the assignee (mobile side)
    pub async fn cancel_by_assignee(&self, id: &str, technician_id: &str) -> RepoResult<Task> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))?;

        self.require_assignee(&existing, technician_id)?;
        let next = dispatch::cancel(existing.stage).map_err(map_dispatch)?;
        self.write_stage(id, next, None).await
    }

    /// Append a comment
    pub async fn add_comment(
        &self,
        id: &str,
        user_id: &str,
        user_name: &str,
        message: &str,
    ) -> RepoResult<Task> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))?;
        if dispatch::is_terminal(existing.stage) {
            return Err(RepoError::Conflict(
                "Completed or cancelled tasks cannot be commented".to_string(),
            ));
        }

        let thing = parse_id(id, "task")?;
        let comment = TaskComment {
            user: parse_id(user_id, "user")?,
            user_name: user_name.to_string(),
            message: message.to_string(),
            created_at: now_ms(),
        };

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    comments += [$comment],
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("comment", comment))
            .bind(("now", now_ms()))
            .await?;

        result
            .take::<Option<Task>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))
    }

    /// Delete a task outright. Tasks in progress must be cancelled first.
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))?;
        if matches!(
            existing.stage,
            TaskStage::Accepted | TaskStage::Arrived | TaskStage::InProgress
        ) {
            return Err(RepoError::Conflict(
                "Tasks in progress must be cancelled before deletion".to_string(),
            ));
        }

        let thing = parse_id(id, "task")?;
        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }

    fn require_assignee(&self, task: &Task, technician_id: &str) -> RepoResult<()> {
        let tech = parse_id(technician_id, "user")?;
        match &task.assignee {
            Some(assignee) if *assignee == tech => Ok(()),
            _ => Err(RepoError::NotFound(
                "Task not found or not assigned to you".to_string(),
            )),
        }
    }

    /// Resolve a user id to an active user holding the Technician role
    async fn require_technician(&self, user_id: &str) -> RepoResult<User> {
        let thing = parse_id(user_id, "user")?;
        let mut result = self
            .base
            .db()
            .query(
                "SELECT * FROM user WHERE id = $id AND role.name = 'Technician' AND is_active = true LIMIT 1",
            )
            .bind(("id", thing))
            .await?;
        let users: Vec<User> = result.take(0)?;
        users.into_iter().next().ok_or_else(|| {
            RepoError::Validation(format!("User {} is not an active technician", user_id))
        })
    }

    async fn write_stage(
        &self,
        id: &str,
        stage: TaskStage,
        assignee: Option<surrealdb::RecordId>,
    ) -> RepoResult<Task> {
        let thing = parse_id(id, "task")?;
        let terminal = dispatch::is_terminal(stage);

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    stage = $stage,
                    assignee = IF $has_assignee THEN $assignee ELSE assignee END,
                    finished_at = IF $terminal THEN (finished_at OR $now) ELSE NONE END,
                    updated_at = $now
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("stage", stage))
            .bind(("has_assignee", assignee.is_some()))
            .bind(("assignee", assignee))
            .bind(("terminal", terminal))
            .bind(("now", now_ms()))
            .await?;

        result
            .take::<Option<Task>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Task {} not found", id)))
    }
}

fn map_dispatch(err: DispatchError) -> RepoError {
    RepoError::Conflict(err.to_string())
}
