//! Finance Service - personal finance REST API: accounts, transactions,
//! credit-card invoices, budgets, OFX import and AI monthly insights.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
