//! Grant handler provider. Pure switch on grant-type identifier;
//! unknown grant types fail at dispatch time with `unsupported_grant_type`,
//! while each handler's own `validate_grant` repeats the check so the
//! handler stays self-contained.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GrantError;
use crate::models::oauth_app::GrantType;
use crate::services::grants::GrantHandler;

pub struct GrantHandlerProvider {
    handlers: HashMap<GrantType, Arc<dyn GrantHandler>>,
}

impl GrantHandlerProvider {
    pub fn new(handlers: HashMap<GrantType, Arc<dyn GrantHandler>>) -> Self {
        Self { handlers }
    }

    pub fn handler_for(&self, grant_type: &str) -> Result<Arc<dyn GrantHandler>, GrantError> {
        let grant_type = GrantType::parse(grant_type).ok_or(GrantError::UnsupportedGrantType)?;
        self.handlers.get(&grant_type).cloned().ok_or(GrantError::UnsupportedGrantType)
    }
}
