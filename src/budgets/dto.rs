use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::repo_types::{Budget, BudgetWrite};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct CreateBudgetRequest {
    pub program_id: Uuid,
    pub amount: f64,
    pub description: Option<String>,
    #[serde(default, with = "crate::iso_date::option")]
    pub date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    pub program_id: Option<Uuid>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    #[serde(default, with = "crate::iso_date::option")]
    pub date: Option<Date>,
}

pub fn check_amount(amount: f64) -> Result<f64, AppError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(AppError::validation("El monto no puede ser negativo"))
    }
}

impl CreateBudgetRequest {
    pub fn into_write(self) -> Result<BudgetWrite, AppError> {
        Ok(BudgetWrite {
            program_id: self.program_id,
            amount: check_amount(self.amount)?,
            description: self.description,
            date: self.date,
        })
    }
}

impl UpdateBudgetRequest {
    /// Merges the request onto the stored line.
    pub fn merge(self, current: &Budget) -> Result<BudgetWrite, AppError> {
        Ok(BudgetWrite {
            program_id: self.program_id.unwrap_or(current.program_id),
            amount: check_amount(self.amount.unwrap_or(current.amount))?,
            description: self.description.or_else(|| current.description.clone()),
            date: self.date,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryLine {
    pub program_id: Uuid,
    pub program_name: String,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct BudgetSummary {
    pub total_donations: f64,
    pub total_budget: f64,
    pub balance: f64,
    pub lines: Vec<SummaryLine>,
}

impl BudgetSummary {
    pub fn new(total_donations: f64, budgets: Vec<Budget>) -> Self {
        let lines: Vec<SummaryLine> = budgets
            .into_iter()
            .map(|b| SummaryLine {
                program_id: b.program_id,
                program_name: b.program_name,
                amount: b.amount,
            })
            .collect();
        let total_budget = lines.iter().map(|l| l.amount).sum();
        Self {
            total_donations,
            total_budget,
            balance: total_donations - total_budget,
            lines,
        }
    }
}
