//! services/api/src/lib.rs
//!
//! The local bridge service: storage adapters, the background snapshot writer,
//! the store service and the HTTP/WebSocket surface.

pub mod adapters;
pub mod config;
pub mod error;
pub mod persistence;
pub mod service;
pub mod web;
