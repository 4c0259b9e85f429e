pub mod error;
pub mod health;
pub mod models;
pub mod repository;
pub mod units;
pub mod user;
