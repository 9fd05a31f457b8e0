//! Database seeder for Spendflow development and testing.
//!
//! Seeds a demo company with a four-level hierarchy
//! (CEO, Director, Manager, Employee), a finance approver, one expense
//! category and one approval rule, then submits an expense and logs the
//! approval plan it received.
//!
//! Usage: `migrator fresh && seeder`

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm_migration::MigratorTrait;
use spendflow_core::workflow::{EmployeeRole, RulePolicy};
use spendflow_db::migration::Migrator;
use spendflow_db::repositories::{
    ApprovalRuleRepository, CompanyRepository, CreateApprovalRuleInput, CreateCategoryInput,
    CreateCompanyInput, CreateEmployeeInput, CreateExpenseInput, EmployeeRepository,
    ExpenseRepository, WorkflowRepository,
};
use spendflow_shared::AppConfig;
use spendflow_shared::config::LoggingConfig;
use spendflow_shared::types::{CurrencyCode, EmployeeId, Money};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let db = spendflow_db::connect_with(&config.database).await?;
    Migrator::up(&db, None).await?;
    info!("Connected and migrated");

    let companies = CompanyRepository::new(db.clone());
    let employees = EmployeeRepository::new(db.clone());
    let rules = ApprovalRuleRepository::new(db.clone());
    let expenses = ExpenseRepository::new(db.clone());
    let workflow = WorkflowRepository::new(db, config.workflow);

    let inr = CurrencyCode::parse("INR").map_err(anyhow::Error::msg)?;
    let usd = CurrencyCode::parse("USD").map_err(anyhow::Error::msg)?;

    let company = companies
        .create_company(CreateCompanyInput {
            name: "Acme Travel Pvt Ltd".to_string(),
            country: Some("India".to_string()),
            currency: inr,
        })
        .await?;

    let hire = |name: &str, email: &str, role: EmployeeRole, manager_id: Option<Uuid>| {
        CreateEmployeeInput {
            name: name.to_string(),
            email: email.to_string(),
            role,
            manager_id,
        }
    };

    let ceo = employees
        .create_employee(
            company.id,
            hire("Asha Rao", "ceo@acme.test", EmployeeRole::Admin, None),
        )
        .await?;
    let director = employees
        .create_employee(
            company.id,
            hire("Dev Menon", "director@acme.test", EmployeeRole::Manager, Some(ceo.id)),
        )
        .await?;
    let manager = employees
        .create_employee(
            company.id,
            hire("Mira Shah", "manager@acme.test", EmployeeRole::Manager, Some(director.id)),
        )
        .await?;
    let employee = employees
        .create_employee(
            company.id,
            hire("Ravi Iyer", "ravi@acme.test", EmployeeRole::Employee, Some(manager.id)),
        )
        .await?;
    let finance = employees
        .create_employee(
            company.id,
            hire("Fatima Khan", "finance@acme.test", EmployeeRole::Manager, Some(ceo.id)),
        )
        .await?;
    info!(company_id = %company.id, "Hierarchy seeded");

    let travel = companies
        .create_category(
            company.id,
            CreateCategoryInput {
                name: "Travel".to_string(),
                description: Some("Flights, hotels and local transport".to_string()),
            },
        )
        .await?;

    rules
        .create_rule(
            company.id,
            CreateApprovalRuleInput {
                name: "Finance sign-off above 5000".to_string(),
                description: None,
                min_amount: Decimal::new(5000, 0),
                max_amount: None,
                sequence: 1,
                policy: RulePolicy::SpecificApprover {
                    approver_id: EmployeeId::from(finance.id),
                },
            },
        )
        .await?;

    let expense = expenses
        .create_expense(
            company.id,
            employee.id,
            CreateExpenseInput {
                category_id: Some(travel.id),
                title: "Client visit, Singapore".to_string(),
                description: Some("Return flight".to_string()),
                expense_date: Utc::now().date_naive(),
                amount: Money::new(Decimal::new(12000, 2), usd),
                exchange_rate: Decimal::new(8325, 2),
            },
        )
        .await?;

    let outcome = workflow
        .submit_expense(company.id, expense.id, employee.id)
        .await?;
    info!(
        expense_id = %outcome.expense.id,
        status = ?outcome.expense.status,
        converted_minor = outcome.expense.amount_in_company_currency_minor,
        "Expense submitted"
    );
    for step in &outcome.steps {
        info!(
            sequence = step.sequence,
            approver_id = %step.approver_id,
            "Approval step"
        );
    }

    let inbox = workflow.pending_approvals(company.id, manager.id).await?;
    info!(manager_id = %manager.id, pending = inbox.len(), "Seeding complete");

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter.clone().into());

    tracing_subscriber::registry()
        .with(filter)
        .with(logging.json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!logging.json).then(tracing_subscriber::fmt::layer))
        .init();
}
