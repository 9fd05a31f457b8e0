//! Workflow repository for expense state transitions.
//!
//! Every operation here loads what it needs, asks `WorkflowService` whether
//! the transition is allowed and writes the result inside one database
//! transaction. Expense status writes are compare-and-set on `version`;
//! step decisions only succeed while the step is still pending.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Serialize;
use spendflow_core::workflow::{
    self as domain, ApprovalStep, SequentialGate, StatusAggregator, StepDecision,
    WorkflowBuilder, WorkflowError, WorkflowService,
};
use spendflow_shared::WorkflowConfig;
use spendflow_shared::types::money::from_minor_units;
use spendflow_shared::types::{ApprovalStepId, EmployeeId, ExpenseId};
use uuid::Uuid;

use super::approval_rule::load_active_rules;
use super::db_err;
use super::employee::{find_in_company, load_org_chart};
use super::expense::{find_expense, load_steps, step_to_domain};
use crate::entities::{
    approval_steps, expenses,
    sea_orm_active_enums::{ExpenseStatus, StepStatus},
};

/// Result of submitting an expense.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    /// The expense after submission.
    pub expense: expenses::Model,
    /// The approval steps created for it, in plan order.
    pub steps: Vec<approval_steps::Model>,
}

/// Result of approving or rejecting a step.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    /// The expense after re-aggregation.
    pub expense: expenses::Model,
    /// The decided step.
    pub step: approval_steps::Model,
}

/// A step waiting for its approver.
#[derive(Debug, Clone, Serialize)]
pub struct PendingApproval {
    /// The step to act on.
    pub step: approval_steps::Model,
    /// The expense it belongs to.
    pub expense: expenses::Model,
}

/// Fields written together with a status change.
#[derive(Debug, Default)]
struct StatusStamp {
    submitted_at: Option<DateTimeWithTimeZone>,
    paid_at: Option<DateTimeWithTimeZone>,
}

/// Workflow repository for expense state transitions.
#[derive(Debug, Clone)]
pub struct WorkflowRepository {
    db: DatabaseConnection,
    config: WorkflowConfig,
}

impl WorkflowRepository {
    /// Creates a new workflow repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, config: WorkflowConfig) -> Self {
        Self { db, config }
    }

    /// Submits a draft expense and attaches its approval plan.
    ///
    /// The plan is built from the owner's management chain followed by every
    /// matching approval rule. What happens when the plan is empty depends
    /// on `WorkflowConfig::empty_workflow`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Expense is not found
    /// - `actor` is not the owner
    /// - Expense is not in draft status
    /// - No approval step was produced and the policy is `fail`
    /// - The expense was modified concurrently
    pub async fn submit_expense(
        &self,
        company_id: Uuid,
        expense_id: Uuid,
        actor: Uuid,
    ) -> Result<SubmitOutcome, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let expense = find_expense(&txn, company_id, expense_id).await?;
        let owner = EmployeeId::from(expense.employee_id);

        // Validate transition
        WorkflowService::submit(expense.status.into(), owner, EmployeeId::from(actor))?;

        // Resolve approvers
        let chart = load_org_chart(&txn, company_id).await.map_err(db_err)?;
        let rules = load_active_rules(&txn, company_id).await.map_err(db_err)?;
        let amount = from_minor_units(expense.amount_in_company_currency_minor);

        let plan = WorkflowBuilder::build(
            &chart,
            &rules,
            owner,
            amount,
            self.config.allow_self_approval,
        );
        tracing::debug!(
            expense_id = %expense_id,
            active_rules = rules.len(),
            planned_steps = plan.steps.len(),
            "Approval plan built"
        );

        if plan.is_empty() {
            tracing::warn!(
                expense_id = %expense_id,
                policy = ?self.config.empty_workflow,
                "Submission produced no approval step"
            );
        }
        let plan = plan.apply_empty_policy(self.config.empty_workflow, ExpenseId::from(expense_id))?;

        // Persist steps
        let now: DateTimeWithTimeZone = Utc::now().into();
        let mut steps = Vec::with_capacity(plan.steps.len());
        for planned in &plan.steps {
            let step = approval_steps::ActiveModel {
                id: Set(ApprovalStepId::new().into_inner()),
                expense_id: Set(expense_id),
                approver_id: Set(planned.approver_id.into_inner()),
                sequence: Set(planned.sequence),
                status: Set(StepStatus::Pending),
                comment: Set(None),
                decided_at: Set(None),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(db_err)?;
            steps.push(step);
        }

        let expense = write_status(
            &txn,
            expense,
            plan.status.into(),
            StatusStamp {
                submitted_at: Some(now),
                ..StatusStamp::default()
            },
        )
        .await?;

        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            expense_id = %expense_id,
            steps = steps.len(),
            status = ?expense.status,
            "Expense submitted"
        );

        Ok(SubmitOutcome { expense, steps })
    }

    /// Approves a step.
    ///
    /// # Errors
    ///
    /// See [`WorkflowService::decide`]; additionally `StepNotFound` and
    /// `Conflict`.
    pub async fn approve_step(
        &self,
        company_id: Uuid,
        step_id: Uuid,
        actor: Uuid,
        comment: Option<String>,
    ) -> Result<DecisionOutcome, WorkflowError> {
        self.decide(company_id, step_id, actor, StepDecision::Approve, comment)
            .await
    }

    /// Rejects a step, which rejects the whole expense.
    ///
    /// # Errors
    ///
    /// See [`WorkflowService::decide`]; additionally `StepNotFound` and
    /// `Conflict`.
    pub async fn reject_step(
        &self,
        company_id: Uuid,
        step_id: Uuid,
        actor: Uuid,
        comment: Option<String>,
    ) -> Result<DecisionOutcome, WorkflowError> {
        self.decide(company_id, step_id, actor, StepDecision::Reject, comment)
            .await
    }

    async fn decide(
        &self,
        company_id: Uuid,
        step_id: Uuid,
        actor: Uuid,
        decision: StepDecision,
        comment: Option<String>,
    ) -> Result<DecisionOutcome, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let step = approval_steps::Entity::find_by_id(step_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::StepNotFound(step_id))?;
        let expense = find_expense(&txn, company_id, step.expense_id).await?;

        let rows = load_steps(&txn, expense.id).await.map_err(db_err)?;
        let steps: Vec<ApprovalStep> = rows.iter().map(step_to_domain).collect();
        let current = step_to_domain(&step);

        let action = WorkflowService::decide(
            expense.status.into(),
            &current,
            &steps,
            EmployeeId::from(actor),
            decision,
            comment.clone(),
        )?;
        let new_status = action.new_status();

        // Guarded step write
        let now: DateTimeWithTimeZone = Utc::now().into();
        let step_status: StepStatus = decision.resulting_status().into();
        let result = approval_steps::Entity::update_many()
            .set(approval_steps::ActiveModel {
                status: Set(step_status),
                comment: Set(comment.clone()),
                decided_at: Set(Some(now)),
                ..Default::default()
            })
            .filter(approval_steps::Column::Id.eq(step_id))
            .filter(approval_steps::Column::Status.eq(StepStatus::Pending))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            let status = approval_steps::Entity::find_by_id(step_id)
                .one(&txn)
                .await
                .map_err(db_err)?
                .map_or(domain::StepStatus::Approved, |s| s.status.into());
            tracing::warn!(step_id = %step_id, %status, "Step was decided concurrently");
            return Err(WorkflowError::StepAlreadyResolved { step_id, status });
        }

        // The expense row is always written so that concurrent decisions on
        // the same expense serialize on its version.
        let expense = write_status(&txn, expense, new_status.into(), StatusStamp::default()).await?;

        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            step_id = %step_id,
            expense_id = %expense.id,
            decision = ?decision,
            status = %new_status,
            "Approval step decided"
        );

        let step = approval_steps::Model {
            status: step_status,
            comment,
            decided_at: Some(now),
            ..step
        };
        Ok(DecisionOutcome { expense, step })
    }

    /// Re-derives an expense's status from its steps.
    ///
    /// Idempotent: an expense whose stored status already matches is
    /// returned untouched. Only expenses awaiting approval with at least one
    /// step are re-aggregated.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound` or `Conflict`.
    pub async fn recompute_status(
        &self,
        company_id: Uuid,
        expense_id: Uuid,
    ) -> Result<expenses::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let expense = find_expense(&txn, company_id, expense_id).await?;
        let current: domain::ExpenseStatus = expense.status.into();
        if !current.accepts_decisions() {
            return Ok(expense);
        }

        let rows = load_steps(&txn, expense_id).await.map_err(db_err)?;
        if rows.is_empty() {
            return Ok(expense);
        }

        let steps: Vec<ApprovalStep> = rows.iter().map(step_to_domain).collect();
        let status = StatusAggregator::recompute(&steps);
        if status == current {
            return Ok(expense);
        }

        let expense = write_status(&txn, expense, status.into(), StatusStamp::default()).await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(expense_id = %expense_id, status = %status, "Expense status recomputed");
        Ok(expense)
    }

    /// Records payout of an approved expense.
    ///
    /// # Errors
    ///
    /// Returns an error if `actor` is not part of the company, the expense
    /// is not approved, or it was modified concurrently.
    pub async fn mark_paid(
        &self,
        company_id: Uuid,
        expense_id: Uuid,
        actor: Uuid,
    ) -> Result<expenses::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        find_in_company(&txn, company_id, actor).await?;
        let expense = find_expense(&txn, company_id, expense_id).await?;

        let action = WorkflowService::mark_paid(expense.status.into(), EmployeeId::from(actor))?;
        let paid_at: DateTimeWithTimeZone = Utc::now().into();

        let expense = write_status(
            &txn,
            expense,
            action.new_status().into(),
            StatusStamp {
                paid_at: Some(paid_at),
                ..StatusStamp::default()
            },
        )
        .await?;

        txn.commit().await.map_err(db_err)?;

        tracing::info!(expense_id = %expense_id, paid_by = %actor, "Expense marked paid");
        Ok(expense)
    }

    /// Lists the steps `approver_id` can act on right now, newest expense
    /// first.
    ///
    /// Steps behind an unfinished earlier tier are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the approver is not part of the company.
    pub async fn pending_approvals(
        &self,
        company_id: Uuid,
        approver_id: Uuid,
    ) -> Result<Vec<PendingApproval>, WorkflowError> {
        find_in_company(&self.db, company_id, approver_id).await?;

        let mine = approval_steps::Entity::find()
            .filter(approval_steps::Column::ApproverId.eq(approver_id))
            .filter(approval_steps::Column::Status.eq(StepStatus::Pending))
            .all(&self.db)
            .await
            .map_err(db_err)?;
        if mine.is_empty() {
            return Ok(Vec::new());
        }

        let expense_ids: Vec<Uuid> = mine.iter().map(|s| s.expense_id).collect();
        let open: HashMap<Uuid, expenses::Model> = expenses::Entity::find()
            .filter(expenses::Column::Id.is_in(expense_ids.iter().copied()))
            .filter(expenses::Column::CompanyId.eq(company_id))
            .filter(expenses::Column::Status.eq(ExpenseStatus::PendingApproval))
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        let mut all_steps: HashMap<Uuid, Vec<ApprovalStep>> = HashMap::new();
        for row in approval_steps::Entity::find()
            .filter(approval_steps::Column::ExpenseId.is_in(open.keys().copied()))
            .all(&self.db)
            .await
            .map_err(db_err)?
        {
            all_steps
                .entry(row.expense_id)
                .or_default()
                .push(step_to_domain(&row));
        }

        let mut pending: Vec<PendingApproval> = mine
            .into_iter()
            .filter_map(|step| {
                let expense = open.get(&step.expense_id)?;
                let siblings = all_steps.get(&step.expense_id)?;
                SequentialGate::is_actionable(&step_to_domain(&step), siblings).then(|| {
                    PendingApproval {
                        step,
                        expense: expense.clone(),
                    }
                })
            })
            .collect();
        pending.sort_by(|a, b| b.expense.created_at.cmp(&a.expense.created_at));

        tracing::debug!(
            approver_id = %approver_id,
            actionable = pending.len(),
            "Pending approvals loaded"
        );
        Ok(pending)
    }
}

/// Compare-and-set status write keyed on the version read earlier in the
/// same transaction.
async fn write_status<C: ConnectionTrait>(
    conn: &C,
    expense: expenses::Model,
    status: ExpenseStatus,
    stamp: StatusStamp,
) -> Result<expenses::Model, WorkflowError> {
    let now: DateTimeWithTimeZone = Utc::now().into();
    let version = expense.version + 1;

    let mut active = expenses::ActiveModel {
        status: Set(status),
        version: Set(version),
        updated_at: Set(now),
        ..Default::default()
    };
    if let Some(at) = stamp.submitted_at {
        active.submitted_at = Set(Some(at));
    }
    if let Some(at) = stamp.paid_at {
        active.paid_at = Set(Some(at));
    }

    let result = expenses::Entity::update_many()
        .set(active)
        .filter(expenses::Column::Id.eq(expense.id))
        .filter(expenses::Column::Version.eq(expense.version))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        tracing::warn!(
            expense_id = %expense.id,
            expected_version = expense.version,
            "Expense was modified concurrently"
        );
        return Err(WorkflowError::Conflict(format!(
            "expense {} was modified concurrently",
            expense.id
        )));
    }

    Ok(expenses::Model {
        status,
        version,
        updated_at: now,
        submitted_at: stamp.submitted_at.or(expense.submitted_at),
        paid_at: stamp.paid_at.or(expense.paid_at),
        ..expense
    })
}
