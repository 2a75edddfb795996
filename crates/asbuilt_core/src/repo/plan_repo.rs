//! Plan repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist uploaded plans and the per-project active flag.
//!
//! # Invariants
//! - Listing order is `created_at DESC, plan_uuid ASC`.
//! - `set_active_plan` runs in one immediate transaction; the partial unique
//!   index `idx_plans_single_active` backs the one-active-plan rule.

use crate::model::plan::{Plan, PlanId, ProjectId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::sqlite::{bool_to_int, parse_flag, parse_uuid, SqliteReviewRepository};
use rusqlite::{params, OptionalExtension, Row, Transaction, TransactionBehavior};

const PLAN_SELECT_SQL: &str = "SELECT
    plan_uuid,
    project_uuid,
    display_name,
    image_ref,
    is_active,
    created_at
FROM plans";

/// Persistence contract for plans.
pub trait PlanRepository {
    /// Records one uploaded plan. A flagged plan clears the previous holder.
    fn create_plan(&self, plan: &Plan) -> RepoResult<()>;
    /// Lists one project's plans newest-first.
    fn list_plans(&self, project_id: ProjectId) -> RepoResult<Vec<Plan>>;
    /// Durably moves the active flag of `project_id` to `plan_id`.
    fn set_active_plan(&self, project_id: ProjectId, plan_id: PlanId) -> RepoResult<()>;
}

impl PlanRepository for SqliteReviewRepository<'_> {
    fn create_plan(&self, plan: &Plan) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if plan.is_active {
            clear_active_flag(&tx, plan.project_id)?;
        }
        tx.execute(
            "INSERT INTO plans (
                plan_uuid,
                project_uuid,
                display_name,
                image_ref,
                is_active,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                plan.id.to_string(),
                plan.project_id.to_string(),
                plan.display_name.as_str(),
                plan.image_ref.as_str(),
                bool_to_int(plan.is_active),
                plan.created_at,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_plans(&self, project_id: ProjectId) -> RepoResult<Vec<Plan>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PLAN_SELECT_SQL}
             WHERE project_uuid = ?1
             ORDER BY created_at DESC, plan_uuid ASC;"
        ))?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_plan_row(row)?);
        }
        Ok(items)
    }

    fn set_active_plan(&self, project_id: ProjectId, plan_id: PlanId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1
                 FROM plans
                 WHERE plan_uuid = ?1
                   AND project_uuid = ?2;",
                params![plan_id.to_string(), project_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(RepoError::PlanNotFound(plan_id));
        }

        clear_active_flag(&tx, project_id)?;
        tx.execute(
            "UPDATE plans
             SET is_active = 1
             WHERE plan_uuid = ?1;",
            [plan_id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn clear_active_flag(tx: &Transaction<'_>, project_id: ProjectId) -> RepoResult<()> {
    tx.execute(
        "UPDATE plans
         SET is_active = 0
         WHERE project_uuid = ?1
           AND is_active = 1;",
        [project_id.to_string()],
    )?;
    Ok(())
}

fn parse_plan_row(row: &Row<'_>) -> RepoResult<Plan> {
    let plan_uuid: String = row.get("plan_uuid")?;
    let project_uuid: String = row.get("project_uuid")?;
    Ok(Plan {
        id: parse_uuid(&plan_uuid, "plans.plan_uuid")?,
        project_id: parse_uuid(&project_uuid, "plans.project_uuid")?,
        display_name: row.get("display_name")?,
        image_ref: row.get("image_ref")?,
        is_active: parse_flag(row.get("is_active")?, "plans.is_active")?,
        created_at: row.get("created_at")?,
    })
}
