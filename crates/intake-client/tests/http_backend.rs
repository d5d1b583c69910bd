use mockito::{Matcher, Server};
use serde_json::json;

use intake_client::{ClientConfig, HttpBackend};
use intake_spec::{
    BackendError, BasicInfo, IntakeBackend, Patient, ResponseRecord, active_organizations,
};

fn backend_for(server: &Server) -> HttpBackend {
    let config = ClientConfig::new(format!("{}/api", server.url()));
    HttpBackend::new(&config).expect("backend")
}

#[tokio::test]
async fn lists_active_organizations() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/clients")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                { "id": "c1", "name": "Northside", "defaultLanguage": "en", "isActive": true },
                { "id": "c2", "name": "Closed", "defaultLanguage": "fr", "isActive": false }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let backend = backend_for(&server);
    let organizations = active_organizations(&backend).await.expect("organizations");
    assert_eq!(organizations.len(), 1);
    assert_eq!(organizations[0].id, "c1");
    mock.assert_async().await;
}

#[tokio::test]
async fn lists_languages() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/languages")
        .with_status(200)
        .with_body(
            json!([
                { "id": "l1", "code": "en", "name": "English" },
                { "id": "l2", "code": "es", "name": "Español" }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let languages = backend_for(&server)
        .list_languages()
        .await
        .expect("languages");
    assert_eq!(languages[1].code, "es");
    mock.assert_async().await;
}

#[tokio::test]
async fn creates_patient_under_its_organization() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/clients/c1/patients")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "clientId": "c1",
            "basicInfo": { "name": "Jane Doe" },
            "preferredLanguage": "en"
        })))
        .with_status(201)
        .with_body(
            json!({
                "id": "p-42",
                "clientId": "c1",
                "basicInfo": { "name": "Jane Doe" },
                "preferredLanguage": "en"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let draft = Patient::draft(
        "c1",
        BasicInfo {
            name: "Jane Doe".into(),
            ..Default::default()
        },
    )
    .with_language("en");
    let created = backend_for(&server)
        .create_patient(&draft)
        .await
        .expect("patient");
    assert_eq!(created.id.as_deref(), Some("p-42"));
    mock.assert_async().await;
}

#[tokio::test]
async fn fetches_questions_in_server_order() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/v1/questions/c1/pt-BR")
        .with_status(200)
        .with_body(include_str!("../../intake-spec/tests/fixtures/questions.json"))
        .create_async()
        .await;

    let questions = backend_for(&server)
        .fetch_questions("c1", "pt-BR")
        .await
        .expect("questions");
    let ids: Vec<_> = questions.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids, ["q1", "q2"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn submits_response_array() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/patients/p-42/patients-responses")
        .match_body(Matcher::Json(json!([
            { "patientId": "p-42", "baseQuestionId": "bq1", "response": "Hello" }
        ])))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let records = vec![ResponseRecord {
        patient_id: "p-42".into(),
        base_question_id: "bq1".into(),
        response: "Hello".into(),
        response_meta: None,
    }];
    backend_for(&server)
        .submit_responses("p-42", &records)
        .await
        .expect("submitted");
    mock.assert_async().await;
}

#[tokio::test]
async fn error_status_carries_body_text() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v1/clients")
        .with_status(503)
        .with_body("maintenance window")
        .create_async()
        .await;

    let err = backend_for(&server)
        .list_organizations()
        .await
        .expect_err("unavailable");
    match err {
        BackendError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "maintenance window");
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/v1/languages")
        .with_status(200)
        .with_body("[{\"code\": 5}]")
        .create_async()
        .await;

    let err = backend_for(&server)
        .list_languages()
        .await
        .expect_err("decode");
    assert!(matches!(err, BackendError::Decode { .. }));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let config = ClientConfig::new("http://127.0.0.1:9");
    let backend = HttpBackend::new(&config).expect("backend");
    let err = backend.list_languages().await.expect_err("no server");
    assert!(matches!(err, BackendError::Transport { .. }));
}
