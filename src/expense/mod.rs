//! Expense management.
//!
//! This module contains everything related to expenses:
//! - The `Expense` model and the database functions for storing and querying expenses
//! - Parsing of request bodies and the `date__range` filter
//! - The route handlers for listing, creating, reading, replacing and deleting expenses

mod core;
mod create_endpoint;
mod date_range;
mod delete_endpoint;
mod detail_endpoint;
mod list_endpoint;
mod payload;
mod state;
mod update_endpoint;

pub use core::{
    Expense, ExpenseId, NewExpense, count_expenses, create_expense, create_expense_table,
    get_expense, get_expenses,
};
pub use create_endpoint::create_expense_endpoint;
pub use date_range::DateRange;
pub use delete_endpoint::delete_expense_endpoint;
pub use detail_endpoint::get_expense_endpoint;
pub use list_endpoint::get_expenses_endpoint;
pub use update_endpoint::update_expense_endpoint;
