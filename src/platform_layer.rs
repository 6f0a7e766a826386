pub mod console;
pub mod types;

pub use console::ConsolePlatform;
pub use types::{
    AppEvent, MessageSeverity, PlatformCommand, PlatformEventHandler, RevealTarget,
};
