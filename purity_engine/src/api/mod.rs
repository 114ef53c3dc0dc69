//! # Storefront engine public API
//!
//! The `api` module exposes the programmatic API of the storefront engine. It is modular, so that clients can pick
//! the functionality they need.
//!
//! * [`order_flow_api`] captures, cancels and reads orders that don't involve the payment gateway.
//! * [`payment_flow_api`] opens gateway orders and reconciles the gateway's payment callbacks.
//! * [`auth_api`] manages customer accounts.
//!
//! # API usage
//!
//! Every API is created by supplying a backend that implements the traits the API needs.
//!
//! ```rust,ignore
//! use purity_engine::{OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements OrderManagement
//! let api = OrderFlowApi::new(db);
//! let orders = api.orders_for_user(user_id).await?;
//! ```
pub mod auth_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod payment_flow_api;
