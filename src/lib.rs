pub mod app;
pub mod auth;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod semantic;
