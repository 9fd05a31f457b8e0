//! Shared fixtures for repository integration tests.
//!
//! Each test gets its own in-memory SQLite database with the schema applied.

#![allow(dead_code)]

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use spendflow_core::workflow::EmployeeRole;
use spendflow_db::entities::expenses;
use spendflow_db::migration::Migrator;
use spendflow_db::repositories::{
    CompanyRepository, CreateCompanyInput, CreateEmployeeInput, CreateExpenseInput,
    EmployeeRepository, ExpenseRepository,
};
use spendflow_shared::types::{CurrencyCode, Money};
use uuid::Uuid;

/// A company with a four-level hierarchy plus two employees outside it.
///
/// ```text
/// ceo (admin)
/// ├── director (manager)
/// │   └── manager (manager)
/// │       └── employee
/// ├── finance (manager)
/// └── auditor (employee)
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Org {
    pub company_id: Uuid,
    pub ceo: Uuid,
    pub director: Uuid,
    pub manager: Uuid,
    pub employee: Uuid,
    pub finance: Uuid,
    pub auditor: Uuid,
}

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn usd() -> CurrencyCode {
    CurrencyCode::parse("USD").expect("valid currency")
}

pub fn eur() -> CurrencyCode {
    CurrencyCode::parse("EUR").expect("valid currency")
}

pub async fn create_company(db: &DatabaseConnection, name: &str) -> Uuid {
    CompanyRepository::new(db.clone())
        .create_company(CreateCompanyInput {
            name: name.to_string(),
            country: Some("United States".to_string()),
            currency: usd(),
        })
        .await
        .expect("Failed to create company")
        .id
}

pub async fn hire(
    db: &DatabaseConnection,
    company_id: Uuid,
    name: &str,
    role: EmployeeRole,
    manager_id: Option<Uuid>,
) -> Uuid {
    let email = format!("{}.{}@example.test", name.to_lowercase(), Uuid::new_v4().simple());
    EmployeeRepository::new(db.clone())
        .create_employee(
            company_id,
            CreateEmployeeInput {
                name: name.to_string(),
                email,
                role,
                manager_id,
            },
        )
        .await
        .expect("Failed to create employee")
        .id
}

pub async fn seed_org(db: &DatabaseConnection) -> Org {
    let company_id = create_company(db, "Acme").await;
    let ceo = hire(db, company_id, "Ceo", EmployeeRole::Admin, None).await;
    let director = hire(db, company_id, "Director", EmployeeRole::Manager, Some(ceo)).await;
    let manager = hire(db, company_id, "Manager", EmployeeRole::Manager, Some(director)).await;
    let employee = hire(db, company_id, "Employee", EmployeeRole::Employee, Some(manager)).await;
    let finance = hire(db, company_id, "Finance", EmployeeRole::Manager, Some(ceo)).await;
    let auditor = hire(db, company_id, "Auditor", EmployeeRole::Employee, Some(ceo)).await;

    Org {
        company_id,
        ceo,
        director,
        manager,
        employee,
        finance,
        auditor,
    }
}

/// Creates a USD draft expense owned by `owner`.
pub async fn draft_expense(
    db: &DatabaseConnection,
    company_id: Uuid,
    owner: Uuid,
    amount: Decimal,
) -> expenses::Model {
    ExpenseRepository::new(db.clone())
        .create_expense(
            company_id,
            owner,
            CreateExpenseInput {
                category_id: None,
                title: "Team dinner".to_string(),
                description: None,
                expense_date: NaiveDate::from_ymd_opt(2026, 10, 1).expect("valid date"),
                amount: Money::new(amount, usd()),
                exchange_rate: Decimal::ONE,
            },
        )
        .await
        .expect("Failed to create expense")
}
