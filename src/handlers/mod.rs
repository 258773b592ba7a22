pub mod notification_sender;
pub mod otp;
pub mod token;
