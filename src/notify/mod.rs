//! Notification delivery
//!
//! Pluggable channel senders behind one trait:
//! - Email, SMS, voice call, chat message
//! - Config-driven sender factory
//! - Dispatcher with per-send timeout and isolated fan-out

pub mod channel;
pub mod channels;
pub mod config;
pub mod dispatcher;
pub mod factory;

pub use channel::{ChannelKind, DeliveryReceipt, NotificationSender, Urgency};
pub use config::{ChannelsConfig, ChatConfig, SmsGatewayConfig, SmtpConfig, VoiceConfig};
pub use dispatcher::{DispatchOutcome, Dispatcher, DEFAULT_SEND_TIMEOUT_SECS};
pub use factory::{create_sender, create_senders};
