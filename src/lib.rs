//! Library Book Management Service
//!
//! REST backend for a book catalog: CRUD with pagination and keyword search,
//! CSV bulk import (synchronous and asynchronous with progress polling), and
//! aggregate statistics, backed by PostgreSQL.

pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
