//! Registering accounts and logging in.

mod authenticate;
mod register;

pub use authenticate::authenticate_user;
pub use register::{NewAccount, register_account, register_user};
