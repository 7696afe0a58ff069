//! Portfolio Site - personal site backend
//!
//! This crate renders blog and publication cards aggregated from external
//! feeds (via an RSS-to-JSON conversion service) and captures newsletter
//! signups. Feed failures never break a page: a fixed local dataset is
//! shown instead, together with an advisory note.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod fetcher;
pub mod models;
pub mod routes;
