pub mod authorization_code;
pub mod notification_sender;
pub mod oauth_app;
pub mod traits;

pub use authorization_code::SqlxAuthorizationCodeStore;
pub use notification_sender::{FileBackedNotificationSenderStore, SqlxNotificationSenderStore};
pub use oauth_app::{SqlxOAuthAppRepository, SqlxUserAttributeProvider};
