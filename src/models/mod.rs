pub mod authorization_code;
pub mod notification_sender;
pub mod oauth_app;

pub use authorization_code::{AuthorizationCode, CodeState, PkceMethod};
pub use notification_sender::{NotificationSender, Property, PropertyDto, SenderProvider, SENDER_TYPE};
pub use oauth_app::{GrantType, OAuthApp, TokenConfig, TokenKindConfig};
