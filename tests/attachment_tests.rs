//! Tests for attachment reconciliation and the memory session holder

use gamewatch::process::TargetVariant;
use gamewatch::{reconcile, AttachmentAction, AttachmentState, TargetProcessHandle};

fn handle(pid: u32) -> TargetProcessHandle {
    TargetProcessHandle {
        pid,
        name: "wow-64".to_string(),
        start_time: 0,
        variant: TargetVariant::Retail64,
    }
}

#[cfg(test)]
mod reconcile_tests {
    use super::*;
    use gamewatch::AttachmentAction as A;
    use gamewatch::AttachmentState as S;

    #[test]
    fn test_transition_table() {
        let h = handle(1);
        let cases = [
            (S::Detached, Some(&h), true, S::Attached, A::Attach),
            (S::Attached, Some(&h), false, S::Detached, A::Detach),
            (S::Attached, None, true, S::Detached, A::Detach),
            (S::Attached, None, false, S::Detached, A::Detach),
            (S::Detached, Some(&h), false, S::Detached, A::None),
            (S::Detached, None, true, S::Detached, A::None),
            (S::Detached, None, false, S::Detached, A::None),
            (S::Attached, Some(&h), true, S::Attached, A::None),
        ];

        for (current, target, enabled, next, action) in cases {
            assert_eq!(
                reconcile(current, target, enabled),
                (next, action),
                "reconcile({current:?}, present={}, enabled={enabled})",
                target.is_some()
            );
        }
    }

    #[test]
    fn test_reconcile_is_stable() {
        // Applying the result again must not produce another action
        let h = handle(1);
        for current in [S::Detached, S::Attached] {
            for target in [None, Some(&h)] {
                for enabled in [false, true] {
                    let (next, _) = reconcile(current, target, enabled);
                    let (again, action) = reconcile(next, target, enabled);
                    assert_eq!(again, next);
                    assert_eq!(action, A::None);
                }
            }
        }
    }

    #[test]
    fn test_default_state_is_detached() {
        assert_eq!(AttachmentState::default(), AttachmentState::Detached);
        assert_eq!(AttachmentAction::default(), AttachmentAction::None);
    }
}

#[cfg(all(test, target_os = "linux"))]
mod proc_mem_tests {
    use super::*;
    use gamewatch::{AttachError, MemoryAttach, ProcMemAttacher};

    #[test]
    fn test_attach_to_own_process() {
        let mut attacher = ProcMemAttacher::new();
        let me = handle(std::process::id());

        attacher.attach(&me).expect("own memory is always readable");
        assert!(attacher.is_attached());
        assert_eq!(attacher.attached_pid(), Some(me.pid));

        // Second attach is a no-op
        attacher.attach(&me).expect("idempotent attach");
        assert_eq!(attacher.attached_pid(), Some(me.pid));

        attacher.detach();
        assert!(!attacher.is_attached());
        attacher.detach();
        assert!(!attacher.is_attached(), "Detach while detached is a no-op");
    }

    #[test]
    fn test_attach_to_missing_process() {
        let mut attacher = ProcMemAttacher::new();
        let gone = handle(u32::MAX - 1);

        let err = attacher.attach(&gone).unwrap_err();
        assert_eq!(err, AttachError::ProcessGone { pid: gone.pid });
        assert!(!attacher.is_attached());
    }
}
