//! Sender factory.
//!
//! Creates notification senders based on configuration.

use crate::core::{Error, Result};
use crate::notify::channel::{ChannelKind, NotificationSender};
use crate::notify::channels::{ChatSender, EmailSender, SmsSender, VoiceSender};
use crate::notify::config::ChannelsConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Create one sender from configuration.
///
/// A channel with no config section is an `UnsupportedChannel` error.
pub fn create_sender(
    kind: ChannelKind,
    config: &ChannelsConfig,
) -> Result<Arc<dyn NotificationSender>> {
    match kind {
        ChannelKind::Email => {
            let email_config = config
                .email
                .clone()
                .ok_or_else(|| Error::UnsupportedChannel("email".to_string()))?;
            Ok(Arc::new(EmailSender::new(email_config)?))
        }
        ChannelKind::Sms => {
            let sms_config = config
                .sms
                .clone()
                .ok_or_else(|| Error::UnsupportedChannel("sms".to_string()))?;
            Ok(Arc::new(SmsSender::new(sms_config)?))
        }
        ChannelKind::Voice => {
            let voice_config = config
                .voice
                .clone()
                .ok_or_else(|| Error::UnsupportedChannel("voice".to_string()))?;
            Ok(Arc::new(VoiceSender::new(voice_config)))
        }
        ChannelKind::Chat => {
            let chat_config = config
                .chat
                .clone()
                .ok_or_else(|| Error::UnsupportedChannel("chat".to_string()))?;
            Ok(Arc::new(ChatSender::new(chat_config)?))
        }
    }
}

/// Build the sender registry for every configured channel.
pub fn create_senders(
    config: &ChannelsConfig,
) -> Result<HashMap<ChannelKind, Arc<dyn NotificationSender>>> {
    let mut senders: HashMap<ChannelKind, Arc<dyn NotificationSender>> = HashMap::new();

    if config.email.is_some() {
        senders.insert(ChannelKind::Email, create_sender(ChannelKind::Email, config)?);
    }
    if config.sms.is_some() {
        senders.insert(ChannelKind::Sms, create_sender(ChannelKind::Sms, config)?);
    }
    if config.voice.is_some() {
        senders.insert(ChannelKind::Voice, create_sender(ChannelKind::Voice, config)?);
    }
    if config.chat.is_some() {
        senders.insert(ChannelKind::Chat, create_sender(ChannelKind::Chat, config)?);
    }

    Ok(senders)
}
