use super::*;
use crate::api::test_helpers::completed_result;
use crate::model::Platform;

fn request() -> GenerationRequest {
    GenerationRequest::new("AI in Healthcare", Platform::LinkedIn, "B2B SaaS tool")
}

// =============================================================================
// Pure transitions
// =============================================================================

#[test]
fn idle_submit_enters_submitting() {
    let next = ViewState::Idle.apply(ViewEvent::Submit(request())).unwrap();
    assert_eq!(next, ViewState::Submitting(request()));
}

#[test]
fn submitting_resolves_to_success_or_failed() {
    let submitting = ViewState::Submitting(request());
    let result = completed_result(8.0);

    let ok = submitting
        .apply(ViewEvent::Resolved(Ok(result.clone())))
        .unwrap();
    assert_eq!(ok, ViewState::Success(result));

    let failed = submitting
        .apply(ViewEvent::Resolved(Err("API Error: Internal Server Error".into())))
        .unwrap();
    assert_eq!(failed, ViewState::Failed("API Error: Internal Server Error".into()));
}

#[test]
fn terminal_states_reenter_submitting() {
    let success = ViewState::Success(completed_result(7.0));
    assert!(success.apply(ViewEvent::Submit(request())).unwrap().is_submitting());

    let failed = ViewState::Failed("nope".into());
    assert!(failed.apply(ViewEvent::Submit(request())).unwrap().is_submitting());
}

#[test]
fn submitting_rejects_second_submit() {
    let err = ViewState::Submitting(request())
        .apply(ViewEvent::Submit(request()))
        .unwrap_err();
    assert_eq!(err, InvalidTransition { state: "submitting", event: "submit" });
}

#[test]
fn resolved_outside_submitting_is_rejected() {
    let err = ViewState::Idle
        .apply(ViewEvent::Resolved(Ok(completed_result(5.0))))
        .unwrap_err();
    assert_eq!(err.state, "idle");
    assert_eq!(err.event, "resolved");
}

#[test]
fn inspect_shows_result_unless_submitting() {
    let result = completed_result(9.0);
    assert_eq!(
        ViewState::Failed("x".into())
            .apply(ViewEvent::Inspect(result.clone()))
            .unwrap(),
        ViewState::Success(result.clone())
    );
    assert!(
        ViewState::Submitting(request())
            .apply(ViewEvent::Inspect(result))
            .is_err()
    );
}

#[test]
fn detach_returns_to_idle_from_any_state() {
    for state in [
        ViewState::Idle,
        ViewState::Submitting(request()),
        ViewState::Success(completed_result(8.0)),
        ViewState::Failed("x".into()),
    ] {
        assert_eq!(state.apply(ViewEvent::Detach).unwrap(), ViewState::Idle);
    }
}

// =============================================================================
// Machine
// =============================================================================

#[tokio::test]
async fn machine_publishes_committed_transitions() {
    let machine = ViewStateMachine::new();
    let mut rx = machine.subscribe();
    assert_eq!(*rx.borrow_and_update(), ViewState::Idle);

    machine.dispatch(ViewEvent::Submit(request())).unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_submitting());

    machine
        .dispatch(ViewEvent::Resolved(Ok(completed_result(8.0))))
        .unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().name(), "success");
}

#[test]
fn machine_keeps_state_on_rejected_event() {
    let machine = ViewStateMachine::new();
    assert!(
        machine
            .dispatch(ViewEvent::Resolved(Err("late".into())))
            .is_err()
    );
    assert_eq!(machine.current(), ViewState::Idle);
    assert!(!machine.subscribe().has_changed().unwrap());
}
