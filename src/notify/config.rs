//! Notification channel configuration.
//!
//! Configuration-driven sender construction.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for all delivery channels.
///
/// A channel with no config section is unsupported at runtime.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// SMTP email config
    pub email: Option<SmtpConfig>,
    /// SMS gateway config
    pub sms: Option<SmsGatewayConfig>,
    /// Voice call config
    pub voice: Option<VoiceConfig>,
    /// Chat webhook config
    pub chat: Option<ChatConfig>,
}

impl ChannelsConfig {
    /// Config with every channel enabled using defaults. Test/demo use.
    pub fn all_channels() -> Self {
        Self {
            email: Some(SmtpConfig::default()),
            sms: Some(SmsGatewayConfig::default()),
            voice: Some(VoiceConfig::default()),
            chat: Some(ChatConfig {
                webhook_url: "http://localhost/hooks/backup-alerts".to_string(),
                ..Default::default()
            }),
        }
    }

    /// Email-only config.
    pub fn email_only(config: SmtpConfig) -> Self {
        Self {
            email: Some(config),
            ..Self::default()
        }
    }
}

/// SMTP configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// SMTP host
    pub host: String,
    /// SMTP port
    pub port: u16,
    /// Auth username
    pub username: String,
    /// Auth password
    pub password: String,
    /// From address on outgoing mail
    pub from_address: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_address: "alerts@localhost".to_string(),
        }
    }
}

impl SmtpConfig {
    /// Validate required fields.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Configuration("smtp host is required".to_string()));
        }
        if self.from_address.is_empty() {
            return Err(Error::Configuration(
                "smtp from_address is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// SMS gateway configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmsGatewayConfig {
    /// Gateway account SID
    pub account_sid: String,
    /// Gateway auth token
    pub auth_token: String,
    /// Sender number
    pub from_number: String,
}

impl Default for SmsGatewayConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: "+10000000000".to_string(),
        }
    }
}

impl SmsGatewayConfig {
    /// Validate required fields.
    pub fn validate(&self) -> Result<()> {
        if self.from_number.is_empty() {
            return Err(Error::Configuration(
                "sms from_number is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Voice call configuration. Shares the SMS gateway account.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// Gateway account SID
    pub account_sid: String,
    /// Gateway auth token
    pub auth_token: String,
    /// Caller number
    pub from_number: String,
}

/// Chat webhook configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Webhook URL to post messages to
    pub webhook_url: String,
    /// Channel or room name
    pub room: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            room: "#backup-alerts".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smtp_validation() {
        assert!(SmtpConfig::default().validate().is_ok());

        let bad = SmtpConfig {
            host: String::new(),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_all_channels_enabled() {
        let config = ChannelsConfig::all_channels();
        assert!(config.email.is_some());
        assert!(config.sms.is_some());
        assert!(config.voice.is_some());
        assert!(config.chat.is_some());
    }

    #[test]
    fn test_default_has_no_channels() {
        let config = ChannelsConfig::default();
        assert!(config.email.is_none());
        assert!(config.chat.is_none());
    }
}
