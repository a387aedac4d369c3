pub mod models;
pub mod users;
pub mod expenses;
pub mod repeated_expenses;
pub mod chat_history;

pub use models::{ChatMessage, ChatSession, Expense, RepeatedExpense, User};
pub use users::UserRepository;
pub use expenses::{CategoryTotal, ExpenseRepository};
pub use repeated_expenses::RepeatedExpenseRepository;
pub use chat_history::ChatHistoryRepository;
