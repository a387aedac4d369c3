use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::analyzer::month_start_timestamp;
use crate::api::state::AppState;
use crate::db::{Expense, ExpenseRepository, User};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct AddExpenseRequest {
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    // Unix seconds; defaults to the creation instant
    pub date: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ExpenseResponse {
    pub message: String,
    pub expense: Expense,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MonthlySpendingResponse {
    pub month: String,
    pub total_spending: f64,
    pub category_breakdown: BTreeMap<String, f64>,
}

fn validate_amount(amount: f64) -> Result<f64, AppError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::Validation("Amount must be a positive number".to_string()));
    }
    Ok(amount)
}

/// POST /expenses/add (requires auth)
pub async fn add_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<AddExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseResponse>), AppError> {
    let (Some(description), Some(category), Some(amount)) =
        (req.description, req.category, req.amount)
    else {
        return Err(AppError::Validation(
            "Description, category and amount are required".to_string(),
        ));
    };

    let amount = validate_amount(amount)?;

    let expense =
        ExpenseRepository::create(&state.db, &user.id, description, category, amount, req.date)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(ExpenseResponse {
            message: "Expense added successfully".to_string(),
            expense,
        }),
    ))
}

/// GET /expenses (requires auth)
pub async fn list_expenses(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let expenses = ExpenseRepository::list_for_user(&state.db, &user.id).await?;
    Ok(Json(expenses))
}

/// GET /expenses/monthly-spending (requires auth)
///
/// Current-month aggregation: total plus per-category totals over
/// [first of month, now].
pub async fn monthly_spending(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<MonthlySpendingResponse>, AppError> {
    let now = Utc::now();
    let today = now.date_naive();

    let totals = ExpenseRepository::category_totals_between(
        &state.db,
        &user.id,
        month_start_timestamp(today),
        now.timestamp(),
    )
    .await?;

    let total_spending = totals.iter().map(|t| t.total).sum();
    let category_breakdown = totals.into_iter().map(|t| (t.category, t.total)).collect();

    Ok(Json(MonthlySpendingResponse {
        month: today.format("%Y-%m").to_string(),
        total_spending,
        category_breakdown,
    }))
}

/// GET /expenses/by-date/:date (requires auth)
///
/// Expenses whose date falls on the given UTC calendar day (YYYY-MM-DD).
pub async fn expenses_by_date(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(date): Path<String>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let day = date
        .parse::<NaiveDate>()
        .map_err(|_| AppError::Validation("Date must be in YYYY-MM-DD format".to_string()))?;

    let start = day
        .and_hms_opt(0, 0, 0)
        .map_or(0, |dt| dt.and_utc().timestamp());
    // Inclusive range: up to the last second of the day
    let end = start + 24 * 3600 - 1;

    let expenses = ExpenseRepository::list_between(&state.db, &user.id, start, end).await?;
    Ok(Json(expenses))
}

/// PUT /expenses/update/:id (requires auth)
pub async fn update_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<ExpenseResponse>, AppError> {
    let amount = req.amount.map(validate_amount).transpose()?;

    let expense = ExpenseRepository::update_for_user(
        &state.db,
        &user.id,
        &id,
        req.description,
        req.category,
        amount,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))?;

    Ok(Json(ExpenseResponse {
        message: "Expense updated successfully".to_string(),
        expense,
    }))
}

/// DELETE /expenses/:id (requires auth)
pub async fn delete_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted = ExpenseRepository::delete_for_user(&state.db, &user.id, &id).await?;

    if !deleted {
        return Err(AppError::NotFound("Expense not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Expense deleted successfully".to_string(),
    }))
}
