use serde_json::{Value, json};

use intake_spec::{
    InputWidget, Progress, QuestionDefinition, QuestionType, QuestionView, RenderStatus,
    ResponseRecord, ResponseSet, Submission, ValidationKind, build_render_payload,
    render_json_ui, render_text, select_input,
};

fn question(question_type: &str, rules: Value, metadata: Value) -> QuestionDefinition {
    serde_json::from_value(json!({
        "id": "q7",
        "baseQuestionId": "bq7",
        "questionSetId": "set",
        "languageCode": "en",
        "questionText": "How are you feeling?",
        "baseQuestion": {
            "id": "bq7",
            "internalCode": "FEELING",
            "questionType": question_type,
            "responseDataType": "STRING",
            "validationRules": rules,
            "metadata": metadata
        }
    }))
    .expect("question fixture")
}

fn recorded(value: &str) -> ResponseSet {
    let mut responses = ResponseSet::new();
    responses.upsert(ResponseRecord {
        patient_id: "p1".into(),
        base_question_id: "bq7".into(),
        response: value.into(),
        response_meta: None,
    });
    responses
}

#[test]
fn text_widget_follows_multiline_flag() {
    let single = question("TEXT", json!({}), json!({}));
    assert_eq!(select_input(&single), InputWidget::SingleLineText);
    let multi = question("TEXT", json!({ "multiline": true }), json!({}));
    assert_eq!(select_input(&multi), InputWidget::MultiLineText);
}

#[test]
fn scale_widget_uses_defaults() {
    let q = question("SCALE", json!({ "maxLabel": "Worst" }), json!({}));
    match select_input(&q) {
        InputWidget::Scale {
            min,
            max,
            step,
            min_label,
            max_label,
        } => {
            assert_eq!((min, max, step), (0.0, 10.0, 1.0));
            assert_eq!(min_label, None);
            assert_eq!(max_label.as_deref(), Some("Worst"));
        }
        other => panic!("unexpected widget {:?}", other),
    }
}

#[test]
fn unknown_modality_renders_placeholder() {
    let q = question("FILE", json!({}), json!({}));
    let widget = select_input(&q);
    assert_eq!(
        widget,
        InputWidget::Unsupported {
            question_type: QuestionType::File
        }
    );

    let mut view = QuestionView::mount(&q, &ResponseSet::new());
    let payload = build_render_payload(&view, Progress::new(1, 1));
    assert_eq!(payload.status, RenderStatus::Unsupported);
    assert!(render_text(&payload).contains("Unsupported question type: FILE"));

    let err = view.submit().expect_err("refused");
    assert_eq!(err.kind, ValidationKind::UnsupportedType);
}

#[test]
fn mount_prefills_recorded_answer_read_only() {
    let q = question("TEXT", json!({}), json!({}));
    let mut view = QuestionView::mount(&q, &recorded("Tired"));
    assert!(view.is_submitted());
    assert_eq!(view.draft(), "Tired");
    assert!(!view.set_draft("Rested"));
    assert_eq!(view.draft(), "Tired");
    assert_eq!(view.submit(), Ok(Submission::AlreadyRecorded));

    let payload = build_render_payload(&view, Progress::new(1, 2));
    assert_eq!(payload.status, RenderStatus::Answered);
    assert!(render_text(&payload).contains("Response saved: Tired"));
}

#[test]
fn restore_draft_only_applies_before_submission() {
    let q = question("TEXT", json!({}), json!({}));
    let mut fresh = QuestionView::mount(&q, &ResponseSet::new());
    fresh.restore_draft(Some("cached".into()));
    assert_eq!(fresh.draft(), "cached");

    let mut answered = QuestionView::mount(&q, &recorded("Tired"));
    answered.restore_draft(Some("cached".into()));
    assert_eq!(answered.draft(), "Tired");
}

#[test]
fn submit_keeps_error_until_draft_changes() {
    let q = question("TEXT", json!({ "required": true }), json!({}));
    let mut view = QuestionView::mount(&q, &ResponseSet::new());
    assert!(view.submit().is_err());
    assert_eq!(
        view.last_error().map(|err| err.kind),
        Some(ValidationKind::Required)
    );
    assert!(!view.is_submitted());

    view.set_draft("Fine");
    assert!(view.last_error().is_none());
    match view.submit().expect("accepted") {
        Submission::Accepted(answer) => {
            assert_eq!(answer.base_question_id, "bq7");
            assert_eq!(answer.value, "Fine");
        }
        other => panic!("unexpected submission {:?}", other),
    }
    assert!(view.is_submitted());
}

#[test]
fn choice_answers_are_trimmed() {
    let q = question(
        "MULTIPLE_CHOICE",
        json!({}),
        json!({ "options": [{ "value": "a", "label": "Alpha" }] }),
    );
    let mut view = QuestionView::mount(&q, &ResponseSet::new());
    view.set_draft(" a ");
    assert_eq!(
        view.submit(),
        Ok(Submission::Accepted(intake_spec::Answer {
            base_question_id: "bq7".into(),
            value: "a".into(),
        }))
    );
}

#[test]
fn json_ui_exposes_widget_contract() {
    let q = question(
        "MULTIPLE_CHOICE",
        json!({ "required": true }),
        json!({ "options": [
            { "value": "a", "label": "Alpha" },
            { "value": "b", "label": "Beta" }
        ] }),
    );
    let view = QuestionView::mount(&q, &ResponseSet::new());
    let ui = render_json_ui(&build_render_payload(&view, Progress::new(2, 4)));

    assert_eq!(ui["question_id"], "q7");
    assert_eq!(ui["status"], "need_input");
    assert_eq!(ui["required"], true);
    assert_eq!(ui["input"]["type"], "choice");
    assert_eq!(ui["input"]["options"][1]["label"], "Beta");
    assert_eq!(ui["progress"]["percentage"], 50);
    assert_eq!(ui["read_only"], false);
}

#[test]
fn text_render_lists_options_and_progress() {
    let q = question(
        "MULTIPLE_CHOICE",
        json!({}),
        json!({ "options": [
            { "value": "a", "label": "Alpha" },
            { "value": "b", "label": "Beta" }
        ] }),
    );
    let view = QuestionView::mount(&q, &ResponseSet::new());
    let text = render_text(&build_render_payload(&view, Progress::new(1, 2)));
    assert!(text.starts_with("Question 1 of 2 (50%)"));
    assert!(text.contains("  1) Alpha"));
    assert!(text.contains("  2) Beta"));
}
