//! Gamewatch library - supervise the game client process and its memory reader

pub mod attach;
pub mod bindings;
pub mod config;
pub mod error;
pub mod process;
pub mod supervisor;

// Re-export commonly used types
pub use attach::{reconcile, AttachmentAction, AttachmentState, MemoryAttach, ProcMemAttacher};
pub use bindings::{BindingExport, BindingMap, JsonBindingExporter, SharedBindings};
pub use config::{Config, ConfigSource, ConfigWatcher, LiveSettings};
pub use error::{AttachError, ConfigError, ExportError, QueryError, TickFailure};
pub use process::{KnownTargetNames, ProcessLocator, TargetProcessHandle, TargetVariant, WindowRect};
pub use supervisor::{Supervisor, SupervisorHandle, SupervisorPhase, SupervisorSnapshot, TickReport};
