pub mod google;
pub mod razorpay;
