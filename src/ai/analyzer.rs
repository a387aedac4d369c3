use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::db::models::Expense;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    OverBudget,
    WithinBudget,
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetStatus::OverBudget => write!(f, "Over Budget"),
            BudgetStatus::WithinBudget => write!(f, "Within Budget"),
        }
    }
}

/// Description/amount/category triple used for the highest single expense
/// and the large one-time expense list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseHighlight {
    pub description: String,
    pub amount: f64,
    pub category: String,
}

/// Reduction over one user's current-month expenses. Pure; the caller
/// supplies the selected expense slice, the budget, and today's date.
#[derive(Debug, Clone)]
pub struct SpendingAnalysis {
    pub total_spending: f64,
    pub monthly_budget: f64,
    pub remaining_budget: f64,
    pub budget_status: BudgetStatus,
    pub avg_daily_spending: f64,
    pub category_breakdown: BTreeMap<String, f64>,
    pub daily_spending: BTreeMap<String, f64>,
    pub highest_expense: Option<ExpenseHighlight>,
    pub large_expenses: Vec<ExpenseHighlight>,
}

impl SpendingAnalysis {
    pub fn compute(expenses: &[Expense], monthly_budget: f64, today: NaiveDate) -> Self {
        let mut total_spending = 0.0;
        let mut category_breakdown: BTreeMap<String, f64> = BTreeMap::new();
        let mut daily_spending: BTreeMap<String, f64> = BTreeMap::new();
        let mut highest_expense: Option<ExpenseHighlight> = None;

        for expense in expenses {
            total_spending += expense.amount;
            *category_breakdown
                .entry(expense.category.clone())
                .or_insert(0.0) += expense.amount;

            // Strict comparison: first-seen wins ties
            let is_highest = highest_expense
                .as_ref()
                .map(|h| expense.amount > h.amount)
                .unwrap_or(true);
            if is_highest {
                highest_expense = Some(ExpenseHighlight {
                    description: expense.description.clone(),
                    amount: expense.amount,
                    category: expense.category.clone(),
                });
            }

            *daily_spending.entry(day_key(expense.date)).or_insert(0.0) += expense.amount;
        }

        let days_elapsed = today.day();
        let avg_daily_spending = if days_elapsed > 0 {
            total_spending / days_elapsed as f64
        } else {
            0.0
        };

        let remaining_budget = (monthly_budget - total_spending).max(0.0);
        let budget_status = if total_spending > monthly_budget {
            BudgetStatus::OverBudget
        } else {
            BudgetStatus::WithinBudget
        };

        // Large one-time expenses: at or above half of the month's total
        let large_expenses = expenses
            .iter()
            .filter(|e| e.amount >= total_spending * 0.5)
            .map(|e| ExpenseHighlight {
                description: e.description.clone(),
                amount: e.amount,
                category: e.category.clone(),
            })
            .collect();

        SpendingAnalysis {
            total_spending,
            monthly_budget,
            remaining_budget,
            budget_status,
            avg_daily_spending,
            category_breakdown,
            daily_spending,
            highest_expense,
            large_expenses,
        }
    }

    /// Serialize the analysis plus the raw expense list into the structured
    /// text block the prompt embeds.
    pub fn render(&self, expenses: &[Expense]) -> String {
        let (highest_description, highest_amount, highest_category) = match &self.highest_expense {
            Some(h) => (h.description.as_str(), h.amount, h.category.as_str()),
            None => ("", 0.0, ""),
        };

        let large_expenses = if self.large_expenses.is_empty() {
            "None".to_string()
        } else {
            pretty_json(&self.large_expenses)
        };

        let expense_list = expenses
            .iter()
            .map(|e| format!("{} (${})", e.description, e.amount))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"
    - **Total Spending This Month**: ${total:.2}
    - **Monthly Budget**: ${budget:.2}
    - **Remaining Budget**: ${remaining:.2} ({status})
    - **Average Daily Spending**: ${avg:.2}
    - **Category Breakdown**: {categories}
    - **Highest Single Expense**: {highest_description} (${highest_amount}) in {highest_category}
    - **Large One-Time Expenses**: {large_expenses}
    - **Daily Spending Pattern**: {daily}
    - **Last {count} Expenses**: {expense_list}
    "#,
            total = self.total_spending,
            budget = self.monthly_budget,
            remaining = self.remaining_budget,
            status = self.budget_status,
            avg = self.avg_daily_spending,
            categories = pretty_json(&self.category_breakdown),
            highest_description = highest_description,
            highest_amount = highest_amount,
            highest_category = highest_category,
            large_expenses = large_expenses,
            daily = pretty_json(&self.daily_spending),
            count = expenses.len(),
            expense_list = expense_list,
        )
    }
}

/// Embed the spending block and the verbatim user query into the fixed
/// finance-assistant instruction template.
pub fn build_prompt(query: &str, spending_data: &str) -> String {
    format!(
        r#"
    You are a **financial assistant** that specializes in analyzing user expenses and providing direct, concise answers.

      ### Context:
      Here is the user's spending data:
      **{spending_data}**

      ### User Query:
      **"{query}"**

      ### Instructions:
      1. **Do NOT provide general knowledge answers.
      2. **Strictly focus on finance/expenditure/money/spending/affordability-related topics. If the user asks about unrelated topics, reply: "I can only help you with finance and expense-related queries."**
      3. **If the user asks about total spending, give a direct number.**
      4. **If the user is overspending, suggest 1-2 simple ways to save money.**
      5. **If within budget, provide 1-2 suggestions for financial growth (e.g., saving, investing).**
      6. **If a large one-time expense is detected, explain why it shouldn't be averaged.**
      7. **If the user asks any questions about statistics that have been fed to you, give direct answer**
      8. ** If the question is close-ended then be direct. Keep your answer short and tell the user exactly they want to hear.**
      9. ** If the question is open-ended then give financial advice by using data provided to you and logical reasoning. Keep your answer limited to MAX 45 sentences.**
    "#
    )
}

/// ISO calendar date (no time component) of a unix timestamp, UTC.
fn day_key(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.date_naive().to_string())
        .unwrap_or_default()
}

fn pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// Unix timestamp of the first instant of `today`'s month (UTC).
pub fn month_start_timestamp(today: NaiveDate) -> i64 {
    let first = today.with_day(1).unwrap_or(today);
    first
        .and_hms_opt(0, 0, 0)
        .map_or(0, |dt| dt.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(description: &str, category: &str, amount: f64, date: NaiveDate) -> Expense {
        Expense {
            id: format!("exp-{}", description),
            user_id: "user-1".to_string(),
            description: description.to_string(),
            category: category.to_string(),
            amount,
            date: date.and_hms_opt(12, 0, 0).unwrap().and_utc().timestamp(),
        }
    }

    fn aug(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, day).unwrap()
    }

    fn sample_expenses() -> Vec<Expense> {
        vec![
            expense("Rent", "Housing", 800.0, aug(1)),
            expense("Groceries", "Food", 120.5, aug(2)),
            expense("Dinner", "Food", 45.25, aug(2)),
            expense("Train pass", "Transport", 60.0, aug(5)),
        ]
    }

    #[test]
    fn category_totals_sum_to_total() {
        let analysis = SpendingAnalysis::compute(&sample_expenses(), 1500.0, aug(7));
        let category_sum: f64 = analysis.category_breakdown.values().sum();
        assert_eq!(category_sum, analysis.total_spending);
        assert_eq!(analysis.total_spending, 1025.75);
    }

    #[test]
    fn daily_totals_sum_to_total() {
        let analysis = SpendingAnalysis::compute(&sample_expenses(), 1500.0, aug(7));
        let daily_sum: f64 = analysis.daily_spending.values().sum();
        assert_eq!(daily_sum, analysis.total_spending);
        // Two expenses on the 2nd collapse into one day bucket
        assert_eq!(analysis.daily_spending.len(), 3);
        assert_eq!(analysis.daily_spending["2026-08-02"], 165.75);
    }

    #[test]
    fn average_on_day_one_equals_total() {
        let expenses = vec![expense("Rent", "Housing", 800.0, aug(1))];
        let analysis = SpendingAnalysis::compute(&expenses, 1500.0, aug(1));
        assert_eq!(analysis.avg_daily_spending, analysis.total_spending);
    }

    #[test]
    fn average_divides_by_days_elapsed() {
        let expenses = vec![expense("Rent", "Housing", 800.0, aug(1))];
        let analysis = SpendingAnalysis::compute(&expenses, 1500.0, aug(10));
        assert_eq!(analysis.avg_daily_spending, 80.0);
    }

    #[test]
    fn remaining_budget_is_never_negative() {
        let analysis = SpendingAnalysis::compute(&sample_expenses(), 100.0, aug(7));
        assert_eq!(analysis.remaining_budget, 0.0);
        assert_eq!(analysis.budget_status, BudgetStatus::OverBudget);
    }

    #[test]
    fn over_budget_iff_total_exceeds_budget() {
        let expenses = vec![expense("Rent", "Housing", 800.0, aug(1))];

        let over = SpendingAnalysis::compute(&expenses, 799.0, aug(7));
        assert_eq!(over.budget_status, BudgetStatus::OverBudget);

        // Spending exactly the budget is still within it
        let exact = SpendingAnalysis::compute(&expenses, 800.0, aug(7));
        assert_eq!(exact.budget_status, BudgetStatus::WithinBudget);
        assert_eq!(exact.remaining_budget, 0.0);

        let under = SpendingAnalysis::compute(&expenses, 1000.0, aug(7));
        assert_eq!(under.budget_status, BudgetStatus::WithinBudget);
        assert_eq!(under.remaining_budget, 200.0);
    }

    #[test]
    fn zero_budget_with_any_spending_is_over() {
        let expenses = vec![expense("Coffee", "Food", 2.5, aug(3))];
        let analysis = SpendingAnalysis::compute(&expenses, 0.0, aug(7));
        assert_eq!(analysis.budget_status, BudgetStatus::OverBudget);
    }

    #[test]
    fn large_expense_requires_half_of_total() {
        let expenses = vec![
            expense("Laptop", "Electronics", 60.0, aug(1)),
            expense("Groceries", "Food", 30.0, aug(2)),
            expense("Coffee", "Food", 10.0, aug(3)),
        ];
        let analysis = SpendingAnalysis::compute(&expenses, 500.0, aug(7));

        assert_eq!(analysis.large_expenses.len(), 1);
        assert_eq!(analysis.large_expenses[0].description, "Laptop");
    }

    #[test]
    fn large_expense_boundary_is_inclusive() {
        // Both sit exactly at 50% of the total
        let expenses = vec![
            expense("A", "Misc", 50.0, aug(1)),
            expense("B", "Misc", 50.0, aug(2)),
        ];
        let analysis = SpendingAnalysis::compute(&expenses, 500.0, aug(7));
        assert_eq!(analysis.large_expenses.len(), 2);
    }

    #[test]
    fn highest_expense_first_seen_wins_ties() {
        let expenses = vec![
            expense("First", "Misc", 50.0, aug(1)),
            expense("Second", "Misc", 50.0, aug(2)),
        ];
        let analysis = SpendingAnalysis::compute(&expenses, 500.0, aug(7));
        assert_eq!(analysis.highest_expense.unwrap().description, "First");
    }

    #[test]
    fn empty_month_produces_zeroed_analysis() {
        let analysis = SpendingAnalysis::compute(&[], 100.0, aug(7));

        assert_eq!(analysis.total_spending, 0.0);
        assert_eq!(analysis.avg_daily_spending, 0.0);
        assert_eq!(analysis.remaining_budget, 100.0);
        assert_eq!(analysis.budget_status, BudgetStatus::WithinBudget);
        assert!(analysis.highest_expense.is_none());
        assert!(analysis.large_expenses.is_empty());
        assert!(analysis.category_breakdown.is_empty());
        assert!(analysis.daily_spending.is_empty());

        let block = analysis.render(&[]);
        assert!(block.contains("**Large One-Time Expenses**: None"));
        assert!(block.contains("**Total Spending This Month**: $0.00"));
    }

    #[test]
    fn render_includes_expense_list_and_status() {
        let expenses = sample_expenses();
        let analysis = SpendingAnalysis::compute(&expenses, 1500.0, aug(7));
        let block = analysis.render(&expenses);

        assert!(block.contains("Rent ($800)"));
        assert!(block.contains("Groceries ($120.5)"));
        assert!(block.contains("(Within Budget)"));
        assert!(block.contains("**Last 4 Expenses**"));
        assert!(block.contains("\"Housing\": 800.0"));
    }

    #[test]
    fn prompt_embeds_query_and_data() {
        let prompt = build_prompt("How much did I spend?", "- **Total**: $10.00");
        assert!(prompt.contains("\"How much did I spend?\""));
        assert!(prompt.contains("- **Total**: $10.00"));
        assert!(prompt.contains("financial assistant"));
    }

    #[test]
    fn month_start_is_the_first_at_midnight() {
        let start = month_start_timestamp(aug(7));
        let expected = aug(1).and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp();
        assert_eq!(start, expected);
    }
}
