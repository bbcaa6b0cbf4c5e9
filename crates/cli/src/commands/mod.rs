pub mod forecast;
pub mod health;
pub mod plan;
