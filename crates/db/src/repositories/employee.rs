//! Employee repository and hierarchy queries.
//!
//! Hierarchy traversal itself lives in `spendflow_core`; this repository
//! only loads a company's manager links into an `OrgChart` and maps the
//! resulting ids back to rows.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use spendflow_core::workflow::{EmployeeRole, HierarchyResolver, OrgChart, WorkflowError};
use spendflow_shared::types::EmployeeId;
use uuid::Uuid;

use super::db_err;
use crate::entities::{companies, employees};

/// Input for creating an employee.
#[derive(Debug, Clone)]
pub struct CreateEmployeeInput {
    /// Full name.
    pub name: String,
    /// Login email, unique across companies.
    pub email: String,
    /// Role within the company.
    pub role: EmployeeRole,
    /// Direct manager, if any. Must belong to the same company.
    pub manager_id: Option<Uuid>,
}

/// A manager in someone's management chain.
#[derive(Debug, Clone, Serialize)]
pub struct ChainMember {
    /// The manager.
    pub employee: employees::Model,
    /// 1 for the direct manager, 2 for their manager, and so on.
    pub level: usize,
}

/// Employee repository.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    db: DatabaseConnection,
}

impl EmployeeRepository {
    /// Creates a new employee repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an employee.
    ///
    /// # Errors
    ///
    /// Returns an error if the company or manager does not exist, the
    /// manager belongs to another company, or the email is taken.
    pub async fn create_employee(
        &self,
        company_id: Uuid,
        input: CreateEmployeeInput,
    ) -> Result<employees::Model, WorkflowError> {
        if input.name.trim().is_empty() || input.email.trim().is_empty() {
            return Err(WorkflowError::InvalidInput(
                "employee name and email are required".into(),
            ));
        }

        companies::Entity::find_by_id(company_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::CompanyNotFound(company_id))?;

        if let Some(manager_id) = input.manager_id {
            find_in_company(&self.db, company_id, manager_id).await?;
        }

        let now = Utc::now().into();
        let employee = employees::ActiveModel {
            id: Set(EmployeeId::new().into_inner()),
            company_id: Set(company_id),
            name: Set(input.name.trim().to_string()),
            email: Set(input.email.trim().to_lowercase()),
            role: Set(input.role.into()),
            manager_id: Set(input.manager_id),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = employee.insert(&self.db).await.map_err(db_err)?;
        tracing::info!(
            employee_id = %created.id,
            company_id = %company_id,
            role = ?created.role,
            "Employee created"
        );
        Ok(created)
    }

    /// Gets an employee of a company.
    ///
    /// # Errors
    ///
    /// Returns `EmployeeNotFound` if the employee is not in the company.
    pub async fn get_employee(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
    ) -> Result<employees::Model, WorkflowError> {
        employees::Entity::find_by_id(employee_id)
            .filter(employees::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::EmployeeNotFound(employee_id))
    }

    /// Lists a company's employees by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_employees(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<employees::Model>, WorkflowError> {
        employees::Entity::find()
            .filter(employees::Column::CompanyId.eq(company_id))
            .order_by_asc(employees::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Sets or clears an employee's manager.
    ///
    /// Reassignments within a company are serialized on the company row
    /// (`SELECT ... FOR UPDATE`), and the cycle check reads the chart only
    /// after that lock is held.
    ///
    /// # Errors
    ///
    /// Returns `CompanyNotFound` for an unknown company and `HierarchyCycle`
    /// if the new manager reports, directly or indirectly, to the employee.
    pub async fn assign_manager(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
        manager_id: Option<Uuid>,
    ) -> Result<employees::Model, WorkflowError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        companies::Entity::find_by_id(company_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(WorkflowError::CompanyNotFound(company_id))?;

        let employee = find_in_company(&txn, company_id, employee_id).await?;

        if let Some(manager_id) = manager_id {
            find_in_company(&txn, company_id, manager_id).await?;

            let chart = load_org_chart(&txn, company_id).await.map_err(db_err)?;
            if HierarchyResolver::would_create_cycle(
                &chart,
                EmployeeId::from(employee_id),
                EmployeeId::from(manager_id),
            ) {
                return Err(WorkflowError::HierarchyCycle {
                    employee_id,
                    manager_id,
                });
            }
        }

        let mut active: employees::ActiveModel = employee.into();
        active.manager_id = Set(manager_id);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await.map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            employee_id = %employee_id,
            manager_id = ?manager_id,
            "Manager assigned"
        );
        Ok(updated)
    }

    /// Returns an employee's management chain, nearest manager first.
    ///
    /// # Errors
    ///
    /// Returns `EmployeeNotFound` if the employee is not in the company.
    pub async fn management_chain(
        &self,
        company_id: Uuid,
        employee_id: Uuid,
    ) -> Result<Vec<ChainMember>, WorkflowError> {
        self.get_employee(company_id, employee_id).await?;
        management_chain(&self.db, company_id, employee_id)
            .await
            .map_err(db_err)
    }

    /// Returns every direct and indirect report of a manager.
    ///
    /// # Errors
    ///
    /// Returns `EmployeeNotFound` if the manager is not in the company.
    pub async fn team(
        &self,
        company_id: Uuid,
        manager_id: Uuid,
    ) -> Result<Vec<employees::Model>, WorkflowError> {
        self.get_employee(company_id, manager_id).await?;

        let chart = load_org_chart(&self.db, company_id)
            .await
            .map_err(db_err)?;
        let ids: Vec<Uuid> = HierarchyResolver::descendants(&chart, EmployeeId::from(manager_id))
            .into_iter()
            .map(EmployeeId::into_inner)
            .collect();

        let mut by_id = find_many(&self.db, &ids).await.map_err(db_err)?;
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

/// Loads a company's manager links.
pub(crate) async fn load_org_chart<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
) -> Result<OrgChart, DbErr> {
    let rows = employees::Entity::find()
        .filter(employees::Column::CompanyId.eq(company_id))
        .all(conn)
        .await?;

    tracing::debug!(company_id = %company_id, employees = rows.len(), "Org chart loaded");

    Ok(OrgChart::from_edges(rows.into_iter().map(|e| {
        (
            EmployeeId::from(e.id),
            e.manager_id.map(EmployeeId::from),
        )
    })))
}

/// Loads employees by id.
pub(crate) async fn find_many<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, employees::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = employees::Entity::find()
        .filter(employees::Column::Id.is_in(ids.iter().copied()))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|e| (e.id, e)).collect())
}

/// Loads one employee and checks it belongs to `company_id`.
pub(crate) async fn find_in_company<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    employee_id: Uuid,
) -> Result<employees::Model, WorkflowError> {
    let employee = employees::Entity::find_by_id(employee_id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or(WorkflowError::EmployeeNotFound(employee_id))?;

    if employee.company_id != company_id {
        return Err(WorkflowError::CrossCompanyReference(format!(
            "employee {employee_id} belongs to another company"
        )));
    }
    Ok(employee)
}

/// Resolves the management chain of `employee_id` into rows.
pub(crate) async fn management_chain<C: ConnectionTrait>(
    conn: &C,
    company_id: Uuid,
    employee_id: Uuid,
) -> Result<Vec<ChainMember>, DbErr> {
    let chart = load_org_chart(conn, company_id).await?;
    let links = HierarchyResolver::chain_with_levels(&chart, EmployeeId::from(employee_id));
    let ids: Vec<Uuid> = links.iter().map(|l| l.employee_id.into_inner()).collect();
    let mut by_id = find_many(conn, &ids).await?;

    Ok(links
        .into_iter()
        .filter_map(|link| {
            by_id
                .remove(&link.employee_id.into_inner())
                .map(|employee| ChainMember {
                    employee,
                    level: link.level,
                })
        })
        .collect())
}
