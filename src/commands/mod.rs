//! Command handlers for kcm

mod add;
mod delete;

pub use add::*;
pub use delete::*;
