use agency_desk::app::AppState;
use agency_desk::cli::{AgencyCli, execute};
use clap::Parser;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cli(args: &[&str]) -> AgencyCli {
    let mut full = vec!["agency-desk"];
    full.extend_from_slice(args);
    AgencyCli::try_parse_from(full).unwrap()
}

async fn signed_in(server: &MockServer, session: &str) {
    signed_in_as(server, session, "Admin").await;
}

async fn signed_in_as(server: &MockServer, session: &str, role: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Token": "jwt",
            "User": { "Id": 1, "Email": "someone@agency.test", "FirstName": "Ada", "LastName": "Min", "Role": role }
        })))
        .mount(server)
        .await;
    let uri = server.uri();
    execute(cli(&[
        "--api-url", uri.as_str(), "--session", session, "login", "--email", "someone@agency.test", "--password", "secret1",
    ]))
    .await
    .unwrap();
}

async fn no_messages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_persists_session_and_logout_clears_it() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.toml");
    let session_arg = session.to_str().unwrap();

    signed_in(&server, session_arg).await;
    let state = AppState::load_from(&session);
    assert_eq!(state.token.as_deref(), Some("jwt"));
    assert_eq!(state.base_url, server.uri());
    assert!(state.user.as_ref().is_some_and(|u| u.is_admin()));

    execute(cli(&["--session", session_arg, "logout"])).await.unwrap();
    let state = AppState::load_from(&session);
    assert!(state.token.is_none());
    assert_eq!(state.base_url, server.uri());
}

#[tokio::test]
async fn create_is_followed_by_a_full_refetch() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.toml");
    let session_arg = session.to_str().unwrap();
    signed_in(&server, session_arg).await;

    Mock::given(method("POST"))
        .and(path("/api/services"))
        .and(header("Authorization", "Bearer jwt"))
        .and(body_partial_json(json!({ "name": "SEO audit", "basePrice": 900.0 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 12, "name": "SEO audit", "basePrice": 900.0 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 12, "name": "SEO audit", "basePrice": 900.0 }])))
        .expect(1)
        .mount(&server)
        .await;

    execute(cli(&[
        "--session", session_arg, "services", "create", "--data", r#"{"name":"SEO audit","basePrice":900}"#,
    ]))
    .await
    .unwrap();
}

#[tokio::test]
async fn signing_off_an_open_task_is_refused() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.toml");
    let session_arg = session.to_str().unwrap();
    signed_in_as(&server, session_arg, "Client").await;

    Mock::given(method("GET"))
        .and(path("/api/tasks/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "title": "Banner set", "status": "InProgress", "campaignId": 2
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = execute(cli(&["--session", session_arg, "approvals", "approve", "5"])).await.unwrap_err();
    assert!(err.to_string().contains("only completed tasks"));
}

#[tokio::test]
async fn commands_needing_a_session_fail_without_one() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.toml");
    let err = execute(cli(&[
        "--api-url", "http://127.0.0.1:9", "--session", session.to_str().unwrap(), "campaigns", "list",
    ]))
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "not signed in");
}

#[tokio::test]
async fn staff_cannot_sign_off_for_a_client() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.toml");
    let session_arg = session.to_str().unwrap();
    signed_in(&server, session_arg).await;

    Mock::given(method("GET"))
        .and(path("/api/tasks/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "title": "Banner set", "status": "Completed", "campaignId": 2
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let err = execute(cli(&["--session", session_arg, "approvals", "approve", "5"])).await.unwrap_err();
    assert!(err.to_string().contains("Only the client"));
}

#[tokio::test]
async fn thread_type_option_keeps_only_matching_conversations() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.toml");
    let session_arg = session.to_str().unwrap();
    signed_in(&server, session_arg).await;

    let team = json!({ "id": 2, "subject": "Shoot schedule", "type": "AdminToTeam", "createdAt": "2026-05-01T09:00:00" });
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .and(query_param("type", "AdminToTeam"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([team.clone()])))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "subject": "Website enquiry", "type": "ContactForm", "createdAt": "2026-05-01T08:00:00" },
            team,
            { "id": 3, "subject": "Logo feedback", "type": "ClientToAdmin", "createdAt": "2026-05-01T10:00:00" }
        ])))
        .mount(&server)
        .await;

    let out = execute(cli(&["--session", session_arg, "messages", "threads", "--type", "admin-to-team"]))
        .await
        .unwrap();
    assert!(out.contains("#2 Shoot schedule [AdminToTeam]"));
    assert!(!out.contains("Website enquiry"));
    assert!(!out.contains("Logo feedback"));

    let all = execute(cli(&["--session", session_arg, "messages", "threads"])).await.unwrap();
    assert!(all.contains("Website enquiry") && all.contains("Logo feedback") && all.contains("Shoot schedule"));
}

#[tokio::test]
async fn admin_reply_attaches_to_root_and_marks_parent_replied() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.toml");
    let session_arg = session.to_str().unwrap();
    signed_in(&server, session_arg).await;

    Mock::given(method("GET"))
        .and(path("/api/messages/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "subject": "Re: Logo feedback", "content": "Any news?", "type": "ClientToAdmin",
            "status": "Unread", "senderUserId": 20, "parentMessageId": 3,
            "relatedEntityType": "Campaign", "relatedEntityId": 2, "createdAt": "2026-05-02T10:00:00"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/messages"))
        .and(body_partial_json(json!({
            "subject": "Re: Logo feedback",
            "type": "AdminToClient",
            "parentMessageId": 3,
            "recipientUserId": 20,
            "relatedEntityId": 2
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/messages/7/status"))
        .and(body_partial_json(json!({ "status": "Replied" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    no_messages(&server).await;

    let out = execute(cli(&["--session", session_arg, "messages", "reply", "7", "--content", "On its way."]))
        .await
        .unwrap();
    assert!(out.starts_with("Reply sent."));
}

#[tokio::test]
async fn logout_works_without_a_backend_url() {
    let dir = tempfile::tempdir().unwrap();
    let session = dir.path().join("session.toml");
    let state = AppState { token: Some("jwt".into()), ..AppState::default() };
    state.save_to(&session).unwrap();

    let out = execute(cli(&["--session", session.to_str().unwrap(), "logout"])).await.unwrap();
    assert_eq!(out, "Signed out.\n");
    assert!(AppState::load_from(&session).token.is_none());
}
