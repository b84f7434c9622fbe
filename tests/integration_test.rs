/// End-to-end checks across the session, approval and arbiter crates.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tandem_approval::{
    build_response, decision_to_action, parse_request, ApprovalAction, ApprovalDecision,
};
use tandem_config::{OptionHints, PermissionMode};
use tandem_session::{MessageBuffer, SessionEvent};
use tandem_tui::{
    build_options, Action, Arbiter, ArbiterOptions, Collaborators, ExitHandler, Input, PickerField,
    PromptSink, RunSettings, SettingsCommitter, SettingsDraft,
};

struct NullSink;

#[async_trait]
impl PromptSink for NullSink {
    async fn submit(&self, _text: String) -> anyhow::Result<()> {
        Ok(())
    }
}

struct NullCommitter;

#[async_trait]
impl SettingsCommitter for NullCommitter {
    async fn commit(&self, _settings: RunSettings) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct CountingExit(AtomicUsize);

#[async_trait]
impl ExitHandler for CountingExit {
    async fn exit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn late_subscriber_sees_snapshot_then_update() {
    let buffer = MessageBuffer::default();
    buffer.append(SessionEvent::user("hi"));

    let seen: Arc<Mutex<Vec<Vec<String>>>> = Arc::default();
    let sink = seen.clone();
    let sub = buffer.subscribe(move |view| {
        sink.lock().unwrap().push(view.iter().map(|e| e.content().to_string()).collect());
        Ok(())
    });
    buffer.append(SessionEvent::assistant("hello"));
    sub.unsubscribe();
    sub.unsubscribe();
    buffer.append(SessionEvent::assistant("unseen"));

    assert_eq!(*seen.lock().unwrap(), vec![vec!["hi"], vec!["hi", "hello"]]);
}

#[test]
fn blank_model_normalizes_to_unset() {
    let draft = SettingsDraft { model: "  ".into(), ..SettingsDraft::default() };
    assert_eq!(draft.normalize().model, None);
}

#[test]
fn normalize_is_idempotent() {
    let drafts = [
        SettingsDraft::default(),
        SettingsDraft {
            permission_mode: PermissionMode::Yolo,
            model: " gpt-5 ".into(),
            profile: "\twork".into(),
            reasoning_effort: "   ".into(),
        },
        SettingsDraft { model: "a b".into(), ..SettingsDraft::default() },
    ];
    for draft in drafts {
        let once = draft.normalize();
        let twice = SettingsDraft::from_settings(&once).normalize();
        assert_eq!(once, twice, "{draft:?}");
    }
}

#[test]
fn abort_maps_to_cancel() {
    assert_eq!(decision_to_action(ApprovalDecision::Abort), ApprovalAction::Cancel);
    assert_eq!(build_response(ApprovalDecision::Abort).action, ApprovalAction::Cancel);
}

#[tokio::test(start_paused = true)]
async fn two_interrupts_without_handoff_exit_once() {
    let exit = Arc::new(CountingExit::default());
    let collab = Collaborators::new(Arc::new(NullSink), Arc::new(NullCommitter), exit.clone());
    let (mut arbiter, _handle) =
        Arbiter::new(ArbiterOptions::new(MessageBuffer::default(), OptionHints::default()), collab);

    arbiter.handle_input(Input::Action(Action::Interrupt)).await;
    tokio::time::advance(Duration::from_secs(14)).await;
    arbiter.handle_input(Input::Action(Action::Interrupt)).await;
    arbiter.handle_input(Input::Action(Action::Interrupt)).await;

    assert_eq!(exit.0.load(Ordering::SeqCst), 1);
}

#[test]
fn model_picker_lists_migration_then_default() {
    let hints = OptionHints {
        default_model: Some("gpt".into()),
        migrated_model: Some("gpt2".into()),
        ..OptionHints::default()
    };
    let labels: Vec<String> =
        build_options(PickerField::Model, &hints, "").into_iter().map(|o| o.label).collect();
    assert_eq!(labels, ["(default)", "gpt2", "gpt", "Custom…"]);
}

#[test]
fn option_values_never_repeat() {
    let hint_sets = [
        OptionHints::default(),
        OptionHints {
            default_model: Some("x".into()),
            migrated_model: Some("x".into()),
            default_reasoning_effort: Some("low".into()),
            profiles: vec!["p".into(), "p".into(), "".into()],
        },
        OptionHints {
            default_model: Some("__custom__".into()),
            default_reasoning_effort: Some("ultra".into()),
            ..OptionHints::default()
        },
    ];
    for hints in &hint_sets {
        for field in [PickerField::Model, PickerField::ReasoningEffort, PickerField::Profile] {
            for current in ["", "x", "low", "p", "ultra"] {
                let opts = build_options(field, hints, current);
                let mut values: Vec<&str> = opts.iter().map(|o| o.value.as_str()).collect();
                let n = values.len();
                values.sort_unstable();
                values.dedup();
                assert_eq!(values.len(), n, "{field} {hints:?} current={current}");
            }
        }
    }
}

#[test]
fn command_vector_survives_validation() {
    let req = parse_request(json!({
        "message": "Run?",
        "requestedSchema": {},
        "codex_command": ["/bin/sh", "-c", "echo hi"],
    }))
    .unwrap();
    assert_eq!(req.vendor.get("codex_command"), Some(&json!(["/bin/sh", "-c", "echo hi"])));
}
