//! Memory reader attachment - state and transition rules

pub mod proc_mem;

use crate::error::AttachError;
use crate::process::TargetProcessHandle;
use serde::{Deserialize, Serialize};

pub use proc_mem::ProcMemAttacher;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentState {
    #[default]
    Detached,
    Attached,
}

/// Side effect the supervisor must perform after a reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttachmentAction {
    #[default]
    None,
    Attach,
    Detach,
}

/// Decide the next attachment state from process presence and the live flag.
///
/// `Attached` is only kept while a target is held and memory reading is enabled;
/// any other combination moves toward `Detached`.
pub fn reconcile(
    current: AttachmentState,
    handle: Option<&TargetProcessHandle>,
    memory_reading_enabled: bool,
) -> (AttachmentState, AttachmentAction) {
    use AttachmentAction as A;
    use AttachmentState as S;

    match (current, handle.is_some(), memory_reading_enabled) {
        (S::Detached, true, true) => (S::Attached, A::Attach),
        (S::Attached, true, false) => (S::Detached, A::Detach),
        (S::Attached, false, _) => (S::Detached, A::Detach),
        (S::Detached, _, _) => (S::Detached, A::None),
        (S::Attached, true, true) => (S::Attached, A::None),
    }
}

/// The external memory reader. Implementations must be idempotent: attaching
/// while attached and detaching while detached are no-ops.
pub trait MemoryAttach: Send {
    fn attach(&mut self, handle: &TargetProcessHandle) -> Result<(), AttachError>;

    fn detach(&mut self);

    fn is_attached(&self) -> bool;
}
