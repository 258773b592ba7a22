pub mod grants;
pub mod notification_client;
pub mod notification_sender_management;
pub mod otp;
pub mod signing;
pub mod sms;
pub mod token_builder;
pub mod token_validator;

pub use notification_client::NotificationClientProvider;
pub use notification_sender_management::NotificationSenderManagement;
pub use otp::OtpService;
pub use signing::JwtSigner;
pub use token_builder::TokenBuilder;
pub use token_validator::TokenValidator;
