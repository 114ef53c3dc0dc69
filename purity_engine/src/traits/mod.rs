//! #  Storage backends.
//!
//! This module defines the interface contracts that a storage *backend* must satisfy to serve the storefront.
//!
//! * [`OrderManagement`] stores orders, answers order queries and applies the outcome of gateway callbacks.
//! * [`UserManagement`] stores customer accounts and the single-use tokens used for email verification and password
//!   resets.
//!
//! The [`SqliteDatabase`](crate::SqliteDatabase) type implements both traits.
//!
//! [`PaymentGateway`] is the one non-storage collaborator: it opens remote orders with the payment provider and holds
//! the shared secret that callback signatures are checked against.
mod order_management;
mod payment_gateway;
mod user_management;

pub use order_management::{OrderManagement, OrderStoreError};
pub use payment_gateway::{GatewayCredentials, GatewayError, PaymentGateway, RemoteOrder, RemoteOrderRequest};
pub use user_management::{UserManagement, UserStoreError};
