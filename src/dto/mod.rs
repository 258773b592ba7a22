pub mod notification_sender;
pub mod oauth;
pub mod otp;

pub use notification_sender::*;
pub use oauth::*;
pub use otp::*;
