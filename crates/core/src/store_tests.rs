use super::*;
use crate::clock::FakeClock;
use crate::session::{ConversationRole, MetadataValue, MetadataWarning, ValidationOutcome};

fn store() -> SessionStore<FakeClock> {
    SessionStore::new(FakeClock::new())
}

#[test]
fn new_session_starts_idle() {
    let store = store();
    let session = store.snapshot();
    assert_eq!(session.status, SessionStatus::Idle);
    assert_eq!(session.phase, DialoguePhase::Idle);
    assert_eq!(session.correction_attempt, 0);
    assert!(!session.active_processing);
}

#[test]
fn happy_path_transition_sequence_succeeds() {
    let store = store();
    store.transition(SessionStatus::UploadAcknowledged).unwrap();
    store.transition(SessionStatus::AwaitingUserInput).unwrap();
    store.transition(SessionStatus::DetectingFormat).unwrap();
    store.transition(SessionStatus::Converting).unwrap();
    store.transition(SessionStatus::Validating).unwrap();
    store.transition(SessionStatus::Completed).unwrap();

    let session = store.snapshot();
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.phase, DialoguePhase::Done);
}

#[test]
fn illegal_transition_is_refused_and_leaves_state_untouched() {
    let store = store();
    let before = store.snapshot();
    let err = store.transition(SessionStatus::Completed).unwrap_err();
    assert_eq!(err, StoreError::TransitionRefused { from: SessionStatus::Idle, to: SessionStatus::Completed });

    let after = store.snapshot();
    assert_eq!(after.status, before.status);
    assert_eq!(after.logs.len(), 1);
    assert_eq!(after.logs[0].severity, LogSeverity::Error);
}

#[test]
fn awaiting_user_input_self_loop_is_allowed() {
    let store = store();
    store.transition(SessionStatus::UploadAcknowledged).unwrap();
    store.transition(SessionStatus::AwaitingUserInput).unwrap();
    store.transition(SessionStatus::AwaitingUserInput).unwrap();
    assert_eq!(store.snapshot().status, SessionStatus::AwaitingUserInput);
}

#[test]
fn retry_decision_approve_returns_to_converting() {
    let store = store();
    for s in [
        SessionStatus::UploadAcknowledged,
        SessionStatus::AwaitingUserInput,
        SessionStatus::DetectingFormat,
        SessionStatus::Converting,
        SessionStatus::Validating,
        SessionStatus::AwaitingRetryApproval,
    ] {
        store.transition(s).unwrap();
    }
    store.increment_correction_attempt().unwrap();
    store.transition(SessionStatus::Converting).unwrap();
    let session = store.snapshot();
    assert_eq!(session.status, SessionStatus::Converting);
    assert_eq!(session.correction_attempt, 1);
}

#[test]
fn correction_attempt_cannot_exceed_retry_limit() {
    let store = store();
    for _ in 0..MAX_RETRY_ATTEMPTS {
        store.increment_correction_attempt().unwrap();
    }
    let err = store.increment_correction_attempt().unwrap_err();
    assert_eq!(err, StoreError::RetryLimitExceeded { current: MAX_RETRY_ATTEMPTS });
    assert_eq!(store.snapshot().correction_attempt, MAX_RETRY_ATTEMPTS);
}

#[test]
fn llm_slot_serializes_concurrent_callers() {
    let store = store();
    store.acquire_llm_slot().unwrap();
    assert_eq!(store.acquire_llm_slot().unwrap_err(), StoreError::Busy);
    store.release_llm_slot();
    store.acquire_llm_slot().unwrap();
}

#[test]
fn reset_restores_initial_state_and_issues_a_new_id() {
    let store = store();
    let original_id = store.snapshot().id;
    store.append_message(ConversationRole::User, "hello");
    store.transition(SessionStatus::UploadAcknowledged).unwrap();
    store.set_validation_outcome(ValidationOutcome::Passed);

    store.reset().unwrap();

    let session = store.snapshot();
    assert_ne!(session.id, original_id);
    assert_eq!(session.status, SessionStatus::Idle);
    assert!(session.conversation_history.is_empty());
    assert!(session.validation_outcome.is_none());
}

#[test]
fn reset_is_refused_while_a_call_is_in_flight() {
    let store = store();
    store.acquire_llm_slot().unwrap();
    let err = store.reset().unwrap_err();
    assert_eq!(err, StoreError::ResetWhileActive);
    assert!(store.is_active_processing());
}

#[test]
fn append_message_and_log_use_clock_for_timestamps() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(42);
    let store = SessionStore::new(clock);
    store.append_message(ConversationRole::Assistant, "hi there");
    store.append_log(LogSeverity::Info, "started");

    let session = store.snapshot();
    assert_eq!(session.conversation_history[0].timestamp_ms, 42);
    assert_eq!(session.logs[0].timestamp_ms, 42);
}

#[test]
fn confirming_metadata_warnings_clears_them_but_leaves_the_applied_value_in_place() {
    let store = store();
    store.set_metadata_field("age", MetadataValue::Text("P90D".to_string()));
    store.add_metadata_warning("age", MetadataWarning { value: MetadataValue::Text("P90D".to_string()), confidence: 30, reason: "guessed from \"adult\"".to_string() });

    let cleared = store.confirm_metadata_warnings();
    assert_eq!(cleared, vec!["age".to_string()]);

    let session = store.snapshot();
    assert!(session.metadata_warnings.is_empty());
    assert_eq!(session.user_metadata["age"], MetadataValue::Text("P90D".to_string()));
}
