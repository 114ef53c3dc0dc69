//! Purity Engine
//!
//! The core of the True Purity storefront backend. It captures orders, opens payment-gateway orders, and reconciles
//! gateway callbacks with the orders it has stored. It knows nothing about HTTP.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`traits`] and, with the `sqlite` feature, [`SqliteDatabase`]). The traits describe what a backend
//!    must provide; the data types they exchange live in [`db_types`].
//! 2. Helpers ([`helpers`]): payment signature verification, order numbers, password hashing and one-time tokens.
//! 3. The public API ([`mod@api`]), which is what the server talks to.
pub mod api;
pub mod db_types;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(all(feature = "sqlite", any(feature = "test_utils", test)))]
pub mod test_utils;

pub use api::{
    auth_api::{AuthApi, Registration},
    errors::{AuthApiError, OrderFlowError, PaymentFlowError},
    order_flow_api::OrderFlowApi,
    order_objects,
    payment_flow_api,
    payment_flow_api::PaymentFlowApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
