mod helpers;
mod money;

pub mod op;
mod secret;

pub use helpers::parse_duration_secs;
pub use money::{MoneyConversionError, Paise, Rupees, INR_CURRENCY_CODE};
pub use secret::Secret;
