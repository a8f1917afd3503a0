//! Long-polling update dispatch and reply composition for Telegram bots.
//!
//! [`dispatch::DispatchEngine`] pulls updates, folds media groups into single
//! [`platform::LogicalMessageEvent`]s and hands them to async handlers.
//! [`outbound::OutboundComposer`] sends replies within Telegram's length
//! limits.

pub mod bot;
pub mod config;
pub mod dispatch;
pub mod outbound;
pub mod platform;

pub use bot::{create, init_logging, BotKit};
pub use config::{load_config, Config};
