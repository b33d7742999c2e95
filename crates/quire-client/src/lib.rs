//! Quire Client - HTTP client for the Halo blog admin API
//!
//! This crate provides [`halo::HaloClient`], the production implementation
//! of [`quire_core::traits::RemoteApi`].
//!
//! # Overview
//!
//! The client handles authentication, request building, response parsing,
//! and maps HTTP failures onto [`quire_core::AppError`] so the core can tell
//! transient failures from refusals.

pub mod halo;

// Re-export main client type
pub use halo::HaloClient;
