mod account_token;
mod order_number;
mod password;
mod payment_signature;

pub use account_token::new_account_token;
pub use order_number::new_order_number;
pub use password::{hash_password, verify_password, PasswordError};
pub use payment_signature::{sign_payment, verify_payment_signature};
