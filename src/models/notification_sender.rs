use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::crypto::PropertyCrypto;

/// Provider a sender talks to. `Custom` carries an opaque property bag
/// (url/http_method/content_type) rather than a fixed schema, since
/// pass-through is genuinely required here and a key-value map keeps
/// that explicitly marked as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderProvider {
    Twilio,
    Vonage,
    Custom,
}

impl SenderProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Twilio => "twilio",
            Self::Vonage => "vonage",
            Self::Custom => "custom",
        }
    }

    /// Case-insensitive match, normalizing to lowercase per the
    /// management layer's validation rule.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "twilio" => Some(Self::Twilio),
            "vonage" => Some(Self::Vonage),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// A single configuration property on a sender. When `is_secret`, `value`
/// is ciphertext produced by [`PropertyCrypto`] both in memory and at rest
/// — the plaintext never round-trips through `NotificationSender` itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
    pub is_secret: bool,
}

impl Property {
    /// Construct a property, encrypting `value` first when `is_secret`.
    pub fn new(name: String, value: String, is_secret: bool, crypto: &PropertyCrypto) -> Result<Self, crate::error::CryptoError> {
        let value = if is_secret { crypto.encrypt(&value)? } else { value };
        Ok(Self { name, value, is_secret })
    }

    /// The plaintext value, decrypting if necessary.
    pub fn reveal(&self, crypto: &PropertyCrypto) -> Result<String, crate::error::CryptoError> {
        if self.is_secret {
            crypto.decrypt(&self.value)
        } else {
            Ok(self.value.clone())
        }
    }

    /// Wire/response representation: secrets are masked, never decrypted
    /// for display.
    pub fn to_dto(&self) -> PropertyDto {
        PropertyDto {
            name: self.name.clone(),
            value: if self.is_secret { "******".to_string() } else { self.value.clone() },
            is_secret: self.is_secret,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyDto {
    pub name: String,
    pub value: String,
    pub is_secret: bool,
}

/// NotificationSenderDTO — despite the name this is the stored
/// record; `properties` carries ciphertext for secret entries. `type` is
/// fixed to `"message"` and immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationSender {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub provider: SenderProvider,
    pub properties: Vec<Property>,
}

pub const SENDER_TYPE: &str = "message";

impl NotificationSender {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}
