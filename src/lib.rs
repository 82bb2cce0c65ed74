//! A small bulletin board: posts guarded by per-post passwords, with
//! keyword search and page-number pagination.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
