//! Approval rule repository.
//!
//! Provides CRUD operations for approval rules and loads a company's active
//! rules in the shape `RuleEngine` consumes.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use spendflow_core::workflow::{
    ApprovalRule, RuleApprover, RuleEngine, RulePolicy, WorkflowError,
};
use spendflow_shared::types::money::{from_minor_units, to_minor_units};
use spendflow_shared::types::{ApprovalRuleId, EmployeeId};
use thiserror::Error;
use uuid::Uuid;

use crate::entities::{
    approval_rule_approvers, approval_rules, employees,
    sea_orm_active_enums::ApprovalRuleKind,
};

/// Errors that can occur during approval rule operations.
#[derive(Debug, Error)]
pub enum ApprovalRuleError {
    /// Approval rule not found.
    #[error("Approval rule {0} not found")]
    NotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// The rule definition was rejected.
    #[error(transparent)]
    Invalid(WorkflowError),
}

impl ApprovalRuleError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Database(_) => 500,
            Self::Invalid(e) => e.status_code(),
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "APPROVAL_RULE_NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Invalid(e) => e.error_code(),
        }
    }
}

/// Input for creating an approval rule.
#[derive(Debug, Clone)]
pub struct CreateApprovalRuleInput {
    /// Name of the approval rule.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Lower bound of the band in company currency (inclusive).
    pub min_amount: Decimal,
    /// Upper bound of the band in company currency (inclusive, None = unbounded).
    pub max_amount: Option<Decimal>,
    /// Position among the company's rules.
    pub sequence: i32,
    /// Who the rule routes to.
    pub policy: RulePolicy,
}

/// Input for updating an approval rule.
#[derive(Debug, Clone, Default)]
pub struct UpdateApprovalRuleInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New minimum amount.
    pub min_amount: Option<Decimal>,
    /// New maximum amount.
    pub max_amount: Option<Option<Decimal>>,
    /// New sequence.
    pub sequence: Option<i32>,
    /// New policy; replaces the approver list.
    pub policy: Option<RulePolicy>,
    /// Active status.
    pub is_active: Option<bool>,
}

/// A stored rule with its approver list.
#[derive(Debug, Clone, Serialize)]
pub struct RuleWithApprovers {
    /// The rule row.
    pub rule: approval_rules::Model,
    /// Approver rows ordered by sequence; empty for specific-approver rules.
    pub approvers: Vec<approval_rule_approvers::Model>,
}

impl RuleWithApprovers {
    /// Converts the stored rows into the domain rule.
    ///
    /// Returns `None` if the rows no longer describe a usable rule, e.g. a
    /// specific-approver rule whose approver was deleted.
    #[must_use]
    pub fn to_domain(&self) -> Option<ApprovalRule> {
        let approvers: Vec<RuleApprover> = self
            .approvers
            .iter()
            .map(|a| RuleApprover {
                approver_id: EmployeeId::from(a.approver_id),
                sequence: a.sequence,
            })
            .collect();
        let percentage = self
            .rule
            .percentage_required
            .and_then(|p| u8::try_from(p).ok());

        let policy = match self.rule.kind {
            ApprovalRuleKind::SpecificApprover => RulePolicy::SpecificApprover {
                approver_id: EmployeeId::from(self.rule.specific_approver_id?),
            },
            ApprovalRuleKind::Percentage => RulePolicy::Percentage {
                approvers,
                percentage_required: percentage?,
            },
            ApprovalRuleKind::Hybrid => RulePolicy::Hybrid {
                approvers,
                percentage_required: percentage,
            },
        };

        Some(ApprovalRule {
            id: ApprovalRuleId::from(self.rule.id),
            name: self.rule.name.clone(),
            min_amount: from_minor_units(self.rule.min_amount_minor),
            max_amount: self.rule.max_amount_minor.map(from_minor_units),
            sequence: self.rule.sequence,
            is_active: self.rule.is_active,
            policy,
        })
    }
}

/// Repository for approval rule operations.
#[derive(Debug, Clone)]
pub struct ApprovalRuleRepository {
    db: DatabaseConnection,
}

impl ApprovalRuleRepository {
    /// Creates a new ApprovalRuleRepository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a new approval rule with its approver list.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the band, threshold or approver list is
    /// malformed, or an approver belongs to another company.
    pub async fn create_rule(
        &self,
        company_id: Uuid,
        input: CreateApprovalRuleInput,
    ) -> Result<RuleWithApprovers, ApprovalRuleError> {
        let rule = ApprovalRule {
            id: ApprovalRuleId::new(),
            name: input.name,
            min_amount: input.min_amount,
            max_amount: input.max_amount,
            sequence: input.sequence,
            is_active: true,
            policy: input.policy,
        };
        RuleEngine::validate(&rule).map_err(ApprovalRuleError::Invalid)?;

        let txn = self.db.begin().await?;
        check_approvers_in_company(&txn, company_id, &rule.policy).await?;

        let now = Utc::now().into();
        let (min_minor, max_minor) = band_to_minor(&rule)?;
        let model = approval_rules::ActiveModel {
            id: Set(rule.id.into_inner()),
            company_id: Set(company_id),
            name: Set(rule.name.clone()),
            description: Set(input.description),
            kind: Set(rule.policy.kind().into()),
            min_amount_minor: Set(min_minor),
            max_amount_minor: Set(max_minor),
            sequence: Set(rule.sequence),
            specific_approver_id: Set(specific_approver(&rule.policy)),
            percentage_required: Set(rule.policy.percentage_required().map(i16::from)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let approvers = insert_approvers(&txn, model.id, &rule.policy).await?;
        txn.commit().await?;

        tracing::info!(
            rule_id = %model.id,
            company_id = %company_id,
            kind = %rule.policy.kind(),
            approvers = approvers.len(),
            "Approval rule created"
        );

        Ok(RuleWithApprovers {
            rule: model,
            approvers,
        })
    }

    /// Lists all active approval rules for a company, ordered by sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_rules(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<RuleWithApprovers>, ApprovalRuleError> {
        Ok(load_rules(&self.db, company_id, true).await?)
    }

    /// Gets a specific approval rule by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the rule does not exist in the company.
    pub async fn get_rule(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
    ) -> Result<RuleWithApprovers, ApprovalRuleError> {
        get_rule(&self.db, company_id, rule_id).await
    }

    /// Updates an approval rule.
    ///
    /// The merged rule is validated as a whole before anything is written.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Invalid` as for creation.
    pub async fn update_rule(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
        input: UpdateApprovalRuleInput,
    ) -> Result<RuleWithApprovers, ApprovalRuleError> {
        let txn = self.db.begin().await?;
        let existing = get_rule(&txn, company_id, rule_id).await?;

        let current = existing.to_domain();
        let policy = match (input.policy, current.as_ref()) {
            (Some(policy), _) => policy,
            (None, Some(rule)) => rule.policy.clone(),
            (None, None) => {
                return Err(ApprovalRuleError::Invalid(WorkflowError::InvalidRule(
                    "stored rule is incomplete; supply a new policy".into(),
                )));
            }
        };
        let policy_changed = current.as_ref().is_none_or(|rule| rule.policy != policy);

        let merged = ApprovalRule {
            id: ApprovalRuleId::from(rule_id),
            name: input.name.unwrap_or_else(|| existing.rule.name.clone()),
            min_amount: input
                .min_amount
                .unwrap_or_else(|| from_minor_units(existing.rule.min_amount_minor)),
            max_amount: input
                .max_amount
                .unwrap_or_else(|| existing.rule.max_amount_minor.map(from_minor_units)),
            sequence: input.sequence.unwrap_or(existing.rule.sequence),
            is_active: input.is_active.unwrap_or(existing.rule.is_active),
            policy,
        };
        RuleEngine::validate(&merged).map_err(ApprovalRuleError::Invalid)?;
        check_approvers_in_company(&txn, company_id, &merged.policy).await?;

        let (min_minor, max_minor) = band_to_minor(&merged)?;
        let mut active: approval_rules::ActiveModel = existing.rule.into();
        active.name = Set(merged.name.clone());
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        active.kind = Set(merged.policy.kind().into());
        active.min_amount_minor = Set(min_minor);
        active.max_amount_minor = Set(max_minor);
        active.sequence = Set(merged.sequence);
        active.specific_approver_id = Set(specific_approver(&merged.policy));
        active.percentage_required = Set(merged.policy.percentage_required().map(i16::from));
        active.is_active = Set(merged.is_active);
        active.updated_at = Set(Utc::now().into());
        let rule = active.update(&txn).await?;

        let approvers = if policy_changed {
            approval_rule_approvers::Entity::delete_many()
                .filter(approval_rule_approvers::Column::RuleId.eq(rule_id))
                .exec(&txn)
                .await?;
            insert_approvers(&txn, rule_id, &merged.policy).await?
        } else {
            existing.approvers
        };

        txn.commit().await?;
        tracing::info!(rule_id = %rule_id, policy_changed, "Approval rule updated");

        Ok(RuleWithApprovers { rule, approvers })
    }

    /// Soft deletes an approval rule by setting is_active to false.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the rule does not exist in the company.
    pub async fn delete_rule(
        &self,
        company_id: Uuid,
        rule_id: Uuid,
    ) -> Result<(), ApprovalRuleError> {
        let existing = get_rule(&self.db, company_id, rule_id).await?;

        let mut rule: approval_rules::ActiveModel = existing.rule.into();
        rule.is_active = Set(false);
        rule.updated_at = Set(Utc::now().into());
        rule.update(&self.db).await?;

        tracing::info!(rule_id = %rule_id, "Approval rule deactivated");
        Ok(())
    }
}

/// Loads a company's active rules as domain rules, ordered by sequence.
///
/// Rows that no longer form a usable rule are skipped with a warning.
pub(crate) async fn load_active_rules<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
) -> Result<Vec<ApprovalRule>, DbErr> {
    let stored = load_rules(conn, company_id, true).await?;
    let mut rules = Vec::with_capacity(stored.len());
    for entry in &stored {
        match entry.to_domain() {
            Some(rule) => rules.push(rule),
            None => tracing::warn!(
                rule_id = %entry.rule.id,
                "Skipping approval rule with incomplete approver configuration"
            ),
        }
    }
    Ok(rules)
}

async fn load_rules<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    active_only: bool,
) -> Result<Vec<RuleWithApprovers>, DbErr> {
    let mut query = approval_rules::Entity::find()
        .filter(approval_rules::Column::CompanyId.eq(company_id));
    if active_only {
        query = query.filter(approval_rules::Column::IsActive.eq(true));
    }
    let rules = query
        .order_by_asc(approval_rules::Column::Sequence)
        .order_by_asc(approval_rules::Column::CreatedAt)
        .all(conn)
        .await?;

    if rules.is_empty() {
        return Ok(Vec::new());
    }

    let rule_ids: Vec<Uuid> = rules.iter().map(|r| r.id).collect();
    let mut approvers: HashMap<Uuid, Vec<approval_rule_approvers::Model>> = HashMap::new();
    for approver in approval_rule_approvers::Entity::find()
        .filter(approval_rule_approvers::Column::RuleId.is_in(rule_ids))
        .order_by_asc(approval_rule_approvers::Column::Sequence)
        .all(conn)
        .await?
    {
        approvers.entry(approver.rule_id).or_default().push(approver);
    }

    Ok(rules
        .into_iter()
        .map(|rule| RuleWithApprovers {
            approvers: approvers.remove(&rule.id).unwrap_or_default(),
            rule,
        })
        .collect())
}

async fn get_rule<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    rule_id: Uuid,
) -> Result<RuleWithApprovers, ApprovalRuleError> {
    let rule = approval_rules::Entity::find_by_id(rule_id)
        .filter(approval_rules::Column::CompanyId.eq(company_id))
        .one(conn)
        .await?
        .ok_or(ApprovalRuleError::NotFound(rule_id))?;

    let approvers = approval_rule_approvers::Entity::find()
        .filter(approval_rule_approvers::Column::RuleId.eq(rule_id))
        .order_by_asc(approval_rule_approvers::Column::Sequence)
        .all(conn)
        .await?;

    Ok(RuleWithApprovers { rule, approvers })
}

async fn check_approvers_in_company<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    policy: &RulePolicy,
) -> Result<(), ApprovalRuleError> {
    let wanted: HashSet<Uuid> = policy
        .approver_ids()
        .into_iter()
        .map(EmployeeId::into_inner)
        .collect();

    let found: HashSet<Uuid> = employees::Entity::find()
        .filter(employees::Column::CompanyId.eq(company_id))
        .filter(employees::Column::Id.is_in(wanted.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|e| e.id)
        .collect();

    if let Some(missing) = wanted.difference(&found).next() {
        return Err(ApprovalRuleError::Invalid(
            WorkflowError::CrossCompanyReference(format!(
                "approver {missing} is not an employee of company {company_id}"
            )),
        ));
    }
    Ok(())
}

async fn insert_approvers<C: ConnectionTrait>(
    conn: &C,
    rule_id: Uuid,
    policy: &RulePolicy,
) -> Result<Vec<approval_rule_approvers::Model>, DbErr> {
    let listed = match policy {
        RulePolicy::SpecificApprover { .. } => return Ok(Vec::new()),
        RulePolicy::Percentage { approvers, .. } | RulePolicy::Hybrid { approvers, .. } => {
            approvers
        }
    };

    let mut models = Vec::with_capacity(listed.len());
    for approver in listed {
        let model = approval_rule_approvers::ActiveModel {
            id: Set(Uuid::now_v7()),
            rule_id: Set(rule_id),
            approver_id: Set(approver.approver_id.into_inner()),
            sequence: Set(approver.sequence),
        }
        .insert(conn)
        .await?;
        models.push(model);
    }
    models.sort_by_key(|m| m.sequence);
    Ok(models)
}

fn specific_approver(policy: &RulePolicy) -> Option<Uuid> {
    match policy {
        RulePolicy::SpecificApprover { approver_id } => Some(approver_id.into_inner()),
        RulePolicy::Percentage { .. } | RulePolicy::Hybrid { .. } => None,
    }
}

fn band_to_minor(rule: &ApprovalRule) -> Result<(i64, Option<i64>), ApprovalRuleError> {
    let overflow = || {
        ApprovalRuleError::Invalid(WorkflowError::InvalidAmount(
            "rule band is out of range".into(),
        ))
    };
    let min = to_minor_units(rule.min_amount).ok_or_else(overflow)?;
    let max = match rule.max_amount {
        Some(max) => Some(to_minor_units(max).ok_or_else(overflow)?),
        None => None,
    };
    Ok((min, max))
}
