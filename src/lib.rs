pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod context;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
