use super::*;
use pretty_assertions::assert_eq;

#[test]
fn apply_emits_validated_target_and_disables_control() {
    let mut state = probed_state();
    user(&mut state, UserAction::SetCoreTarget(12));

    let effects = user(&mut state, UserAction::ApplyCoreTarget);

    let target = gate::validate_core_target(12, 16).expect("valid");
    assert_eq!(
        effects,
        vec![TunerEffect::ApplyCoreLimit(target), TunerEffect::RequestFrame]
    );
    assert!(state.cpu.applying);
    assert!(!state.cpu.is_enabled());
    let (_, _, message) = latest_notice(&state);
    assert_eq!(message, "Applying CPU settings...");
}

#[test]
fn second_apply_while_in_flight_is_dropped() {
    let mut state = probed_state();
    user(&mut state, UserAction::ApplyCoreTarget);

    let effects = user(&mut state, UserAction::ApplyCoreTarget);

    assert!(effects.is_empty());
}

#[test]
fn target_above_observed_cores_is_rejected_before_dispatch() {
    let mut state = probed_state();
    // Bypass the spinner bound to model a tampered value.
    state.cpu.target = 20;

    let effects = user(&mut state, UserAction::ApplyCoreTarget);

    assert!(!has_privileged_effect(&effects));
    assert!(!state.cpu.applying);
    let (level, source, message) = latest_notice(&state);
    assert_eq!(level, NoticeLevel::Error);
    assert_eq!(source, NoticeSource::Gate);
    assert_eq!(message, "Core target 20 is out of the valid range (1-16)");
}

#[test]
fn spinner_is_bounded_by_observed_cores() {
    let mut state = probed_state();

    user(&mut state, UserAction::SetCoreTarget(40));
    assert_eq!(state.cpu.target, 16);
    user(&mut state, UserAction::IncreaseCoreTarget);
    assert_eq!(state.cpu.target, 16);

    user(&mut state, UserAction::SetCoreTarget(0));
    assert_eq!(state.cpu.target, 1);
    user(&mut state, UserAction::DecreaseCoreTarget);
    assert_eq!(state.cpu.target, 1);
}

#[test]
fn success_updates_online_count() {
    let mut state = probed_state();
    user(&mut state, UserAction::SetCoreTarget(4));
    user(&mut state, UserAction::ApplyCoreTarget);

    run_runtime(
        &mut state,
        RuntimeAction::CoreLimitFinished {
            target: gate::validate_core_target(4, 16).expect("valid"),
            result: Ok(()),
        },
    );

    assert!(!state.cpu.applying);
    assert_eq!(state.cpu.online, 4);
    assert_eq!(state.cpu.status_label(), "4/16");
    let (level, _, message) = latest_notice(&state);
    assert_eq!(level, NoticeLevel::Success);
    assert_eq!(message, "CPU thread limit applied.");
}

#[test]
fn failure_keeps_online_count_and_reenables() {
    let mut state = probed_state();
    user(&mut state, UserAction::SetCoreTarget(4));
    user(&mut state, UserAction::ApplyCoreTarget);

    run_runtime(
        &mut state,
        RuntimeAction::CoreLimitFinished {
            target: gate::validate_core_target(4, 16).expect("valid"),
            result: Err("Request dismissed".to_string()),
        },
    );

    assert!(state.cpu.is_enabled());
    assert_eq!(state.cpu.online, 8);
    assert_eq!(state.cpu.target, 8);
    let (level, source, message) = latest_notice(&state);
    assert_eq!(level, NoticeLevel::Error);
    assert_eq!(source, NoticeSource::Dispatch);
    assert_eq!(message, "Failed to apply CPU settings. Request dismissed");
}

#[test]
fn cpu_intents_are_ignored_until_probed() {
    let mut state = TunerState::new();

    assert!(user(&mut state, UserAction::IncreaseCoreTarget).is_empty());
    assert!(user(&mut state, UserAction::ApplyCoreTarget).is_empty());
}

#[test]
fn cursor_keys_on_cpu_section_adjust_target() {
    let mut state = probed_state();
    assert_eq!(state.selection.section, Section::Cpu);

    user(&mut state, UserAction::CursorUp);
    user(&mut state, UserAction::CursorUp);
    user(&mut state, UserAction::CursorDown);

    assert_eq!(state.cpu.target, 9);
}
