//! Bot steering.

mod bot;
mod bot_manager;

pub use bot::Bot;
pub use bot_manager::BotManager;
