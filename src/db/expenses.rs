use serde::Serialize;
use sqlx::{FromRow, Pool, Sqlite};
use uuid::Uuid;

use crate::db::models::Expense;
use crate::error::AppError;

/// Row of the monthly GROUP BY aggregation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

pub struct ExpenseRepository;

impl ExpenseRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        user_id: &str,
        description: String,
        category: String,
        amount: f64,
        date: Option<i64>,
    ) -> Result<Expense, AppError> {
        let id = Uuid::new_v4().to_string();
        let date = date.unwrap_or_else(|| chrono::Utc::now().timestamp());

        let expense = sqlx::query_as::<_, Expense>(
            r#"
INSERT INTO expenses (id, user_id, description, category, amount, date)
VALUES (?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&description)
        .bind(&category)
        .bind(amount)
        .bind(date)
        .fetch_one(pool)
        .await?;

        Ok(expense)
    }

    pub async fn list_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
    ) -> Result<Vec<Expense>, AppError> {
        let expenses = sqlx::query_as::<_, Expense>(
            "SELECT * FROM expenses WHERE user_id = ? ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(expenses)
    }

    pub async fn get_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
        id: &str,
    ) -> Result<Option<Expense>, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            "SELECT * FROM expenses WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(expense)
    }

    pub async fn update_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
        id: &str,
        description: Option<String>,
        category: Option<String>,
        amount: Option<f64>,
    ) -> Result<Option<Expense>, AppError> {
        let Some(existing) = Self::get_for_user(pool, user_id, id).await? else {
            return Ok(None);
        };

        let expense = sqlx::query_as::<_, Expense>(
            r#"
UPDATE expenses SET description = ?, category = ?, amount = ?
WHERE id = ? AND user_id = ?
RETURNING *
            "#,
        )
        .bind(description.unwrap_or(existing.description))
        .bind(category.unwrap_or(existing.category))
        .bind(amount.unwrap_or(existing.amount))
        .bind(id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(Some(expense))
    }

    /// Returns true when a row was deleted, false when the id is unknown
    /// or owned by another user.
    pub async fn delete_for_user(
        pool: &Pool<Sqlite>,
        user_id: &str,
        id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Expenses whose date falls in [start, end], oldest first.
    pub async fn list_between(
        pool: &Pool<Sqlite>,
        user_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Expense>, AppError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
SELECT * FROM expenses
WHERE user_id = ? AND date >= ? AND date <= ?
ORDER BY date ASC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        Ok(expenses)
    }

    pub async fn category_totals_between(
        pool: &Pool<Sqlite>,
        user_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<CategoryTotal>, AppError> {
        let totals = sqlx::query_as::<_, CategoryTotal>(
            r#"
SELECT category, SUM(amount) AS total
FROM expenses
WHERE user_id = ? AND date >= ? AND date <= ?
GROUP BY category
ORDER BY total DESC
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    async fn test_user(pool: &Pool<Sqlite>, name: &str) -> String {
        crate::db::UserRepository::create(
            pool,
            name.to_string(),
            format!("{}@example.com", name),
            "$argon2id$test".to_string(),
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn expense_is_invisible_to_other_users() {
        let pool = test_pool().await;
        let alice = test_user(&pool, "alice").await;
        let bob = test_user(&pool, "bob").await;

        let expense = ExpenseRepository::create(
            &pool,
            &alice,
            "Groceries".to_string(),
            "Food".to_string(),
            42.5,
            None,
        )
        .await
        .unwrap();

        assert!(ExpenseRepository::get_for_user(&pool, &alice, &expense.id)
            .await
            .unwrap()
            .is_some());
        assert!(ExpenseRepository::get_for_user(&pool, &bob, &expense.id)
            .await
            .unwrap()
            .is_none());
        assert!(!ExpenseRepository::delete_for_user(&pool, &bob, &expense.id)
            .await
            .unwrap());
        assert!(ExpenseRepository::delete_for_user(&pool, &alice, &expense.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn partial_update_keeps_unset_fields() {
        let pool = test_pool().await;
        let alice = test_user(&pool, "alice").await;

        let expense = ExpenseRepository::create(
            &pool,
            &alice,
            "Bus ticket".to_string(),
            "Transport".to_string(),
            3.2,
            Some(1_700_000_000),
        )
        .await
        .unwrap();

        let updated = ExpenseRepository::update_for_user(
            &pool,
            &alice,
            &expense.id,
            None,
            None,
            Some(4.0),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(updated.description, "Bus ticket");
        assert_eq!(updated.category, "Transport");
        assert_eq!(updated.amount, 4.0);
        assert_eq!(updated.date, 1_700_000_000);
    }

    #[tokio::test]
    async fn category_totals_cover_the_range() {
        let pool = test_pool().await;
        let alice = test_user(&pool, "alice").await;

        for (desc, cat, amount, date) in [
            ("Coffee", "Food", 4.0, 100),
            ("Lunch", "Food", 12.0, 200),
            ("Train", "Transport", 9.0, 300),
            ("Old rent", "Housing", 800.0, 10), // outside the range
        ] {
            ExpenseRepository::create(
                &pool,
                &alice,
                desc.to_string(),
                cat.to_string(),
                amount,
                Some(date),
            )
            .await
            .unwrap();
        }

        let totals = ExpenseRepository::category_totals_between(&pool, &alice, 50, 400)
            .await
            .unwrap();

        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, "Food");
        assert_eq!(totals[0].total, 16.0);
        assert_eq!(totals[1].category, "Transport");
        assert_eq!(totals[1].total, 9.0);
    }
}
