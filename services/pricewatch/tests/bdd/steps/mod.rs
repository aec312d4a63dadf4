//! BDD step definitions for the pricewatch dashboard

pub mod interval_steps;
pub mod product_steps;
pub mod scheduler_steps;
pub mod settings_steps;
