//! Process discovery for the game client

pub mod locator;
pub mod window;

pub use locator::{
    normalize_process_name, KnownTargetNames, ProcessEntry, ProcessLocator, ProcessTable,
    SystemProcessTable, TargetProcessHandle, TargetVariant, DEFAULT_TARGET_NAMES,
};
pub use window::{try_window_rect, window_rect, WindowRect};
