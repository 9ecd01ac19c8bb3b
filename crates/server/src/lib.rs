//! Maani server library.
//!
//! The HTTP API as a library so the binary, the CLI, and tests share one
//! set of routes, repositories, and services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
