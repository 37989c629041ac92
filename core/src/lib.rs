pub mod cache;
pub mod db;
pub mod mealdb;
pub mod models;
pub mod service;
