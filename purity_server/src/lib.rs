//! # True Purity storefront server
//! This crate hosts the HTTP API of the storefront. It is responsible for:
//! * Customer accounts: registration with email verification, password and Google sign-in, password resets.
//! * Capturing cash-on-delivery and UPI orders.
//! * Online payments through Razorpay: opening the gateway order, and reconciling the gateway's callbacks, which can
//!   arrive through the checkout page (`/api/verify-payment`) and through the redirect (`/api/verify-return`).
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! See [routes](routes/index.html). `/health` is a liveness check, and `/api/ping` lists every route.

pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
