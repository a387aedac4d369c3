use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::auth::{hash_password, verify_password, Claims};
use crate::db::{RepeatedExpense, RepeatedExpenseRepository, User, UserRepository};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    pub monthly_budget: f64,
    pub budget_used: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    pub monthly_budget: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct UpdateBudgetResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct AddRepeatedExpenseRequest {
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRepeatedExpenseRequest {
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RepeatedExpenseResponse {
    pub message: String,
    pub repeated_expense: RepeatedExpense,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Validate and sanitize username
fn validate_username(username: &str) -> Result<String, AppError> {
    let trimmed = username.trim();

    if trimmed.len() < 3 || trimmed.len() > 32 {
        return Err(AppError::Validation("Username must be 3-32 characters".to_string()));
    }

    if !trimmed.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(AppError::Validation(
            "Username must be alphanumeric, underscore, or hyphen".to_string(),
        ));
    }

    // Convert to lowercase for consistency
    Ok(trimmed.to_lowercase())
}

/// Minimal shape check; deliverability is the mail system's problem
fn validate_email(email: &str) -> Result<String, AppError> {
    let trimmed = email.trim().to_lowercase();

    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.'),
        None => false,
    };

    if !valid {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }

    Ok(trimmed)
}

fn validate_amount(amount: f64) -> Result<f64, AppError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::Validation("Amount must be a positive number".to_string()));
    }
    Ok(amount)
}

/// POST /users/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let (Some(username), Some(email), Some(password)) = (req.username, req.email, req.password)
    else {
        return Err(AppError::Validation(
            "Username, email and password are required".to_string(),
        ));
    };

    let username = validate_username(&username)?;
    let email = validate_email(&email)?;

    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if UserRepository::get_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    if UserRepository::get_by_username(&state.db, &username)
        .await?
        .is_some()
    {
        return Err(AppError::Validation("Username already taken".to_string()));
    }

    let password_hash = hash_password(&password)?;
    let user = UserRepository::create(&state.db, username, email, password_hash).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user,
        }),
    ))
}

/// POST /users/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(AppError::Validation("Email and password are required".to_string()));
    };

    let email = email.trim().to_lowercase();

    let user = UserRepository::get_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::Auth("Invalid credentials".to_string()))?;

    if !verify_password(&password, &user.password)? {
        return Err(AppError::Auth("Invalid credentials".to_string()));
    }

    let token = Claims::issue(
        &user.id,
        &state.config.jwt_secret,
        state.config.token_expiry_hours,
    )?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user,
    }))
}

/// GET /users/budget (requires auth)
pub async fn get_budget(Extension(user): Extension<User>) -> Json<BudgetResponse> {
    Json(BudgetResponse {
        monthly_budget: user.monthly_budget,
        budget_used: user.budget_used,
    })
}

/// PUT /users/budget (requires auth)
pub async fn update_budget(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<UpdateBudgetRequest>,
) -> Result<Json<UpdateBudgetResponse>, AppError> {
    let Some(monthly_budget) = req.monthly_budget else {
        return Err(AppError::Validation("monthly_budget is required".to_string()));
    };

    if !monthly_budget.is_finite() || monthly_budget < 0.0 {
        return Err(AppError::Validation(
            "monthly_budget must be a non-negative number".to_string(),
        ));
    }

    let user = UserRepository::set_monthly_budget(&state.db, &user.id, monthly_budget).await?;

    Ok(Json(UpdateBudgetResponse {
        message: "Budget updated successfully".to_string(),
        user,
    }))
}

/// POST /users/add-repeated-expense (requires auth)
pub async fn add_repeated_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<AddRepeatedExpenseRequest>,
) -> Result<(StatusCode, Json<RepeatedExpenseResponse>), AppError> {
    let (Some(description), Some(category), Some(amount)) =
        (req.description, req.category, req.amount)
    else {
        return Err(AppError::Validation(
            "Description, category and amount are required".to_string(),
        ));
    };

    let amount = validate_amount(amount)?;

    let repeated_expense =
        RepeatedExpenseRepository::create(&state.db, &user.id, description, category, amount)
            .await?;

    Ok((
        StatusCode::CREATED,
        Json(RepeatedExpenseResponse {
            message: "Repeated expense added successfully".to_string(),
            repeated_expense,
        }),
    ))
}

/// GET /users/repeated-expenses (requires auth)
pub async fn list_repeated_expenses(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<RepeatedExpense>>, AppError> {
    let templates = RepeatedExpenseRepository::list_for_user(&state.db, &user.id).await?;
    Ok(Json(templates))
}

/// PUT /users/update-repeated-expense/:id (requires auth)
pub async fn update_repeated_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(req): Json<UpdateRepeatedExpenseRequest>,
) -> Result<Json<RepeatedExpenseResponse>, AppError> {
    let amount = req.amount.map(validate_amount).transpose()?;

    let repeated_expense = RepeatedExpenseRepository::update_for_user(
        &state.db,
        &user.id,
        &id,
        req.description,
        req.category,
        amount,
        req.is_active,
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Repeated expense not found".to_string()))?;

    Ok(Json(RepeatedExpenseResponse {
        message: "Repeated expense updated successfully".to_string(),
        repeated_expense,
    }))
}

/// DELETE /users/delete-repeated-expense/:id (requires auth)
pub async fn delete_repeated_expense(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let deleted = RepeatedExpenseRepository::delete_for_user(&state.db, &user.id, &id).await?;

    if !deleted {
        return Err(AppError::NotFound("Repeated expense not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Repeated expense deleted successfully".to_string(),
    }))
}
