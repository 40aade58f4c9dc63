//! Notification bus: outbound Telegram sender, inbound long-poll loop, and
//! a static command dispatch table for chat-driven fleet queries.

#![forbid(unsafe_code)]

pub mod commands;
pub mod messages;
pub mod poller;
pub mod sender;

pub use messages::Event;
pub use sender::TelegramConfig;
