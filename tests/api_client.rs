use agency_desk::api::client::{ApiClient, ListQuery};
use agency_desk::api::models::{
    Campaign, CampaignDraft, CampaignStatus, LoginRequest, MessageStatus, MessageType, UserRole,
};
use agency_desk::error::ApiError;
use agency_desk::threads::assemble_threads;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn campaign_json(id: i64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "status": "Active",
        "budget": 1200.5,
        "startDate": "2026-01-05T00:00:00",
        "clientId": 2,
        "clientName": "Acme",
        "taskCount": 3,
        "completedTaskCount": 1
    })
}

fn message_json(id: i64, parent: Option<i64>, minute: u32) -> serde_json::Value {
    json!({
        "id": id,
        "subject": format!("subject {id}"),
        "content": "body",
        "type": "ClientToAdmin",
        "status": "Unread",
        "parentMessageId": parent,
        "createdAt": format!("2026-02-01T10:{minute:02}:00Z")
    })
}

#[tokio::test]
async fn list_sends_bearer_and_paging_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/campaigns"))
        .and(header("Authorization", "Bearer tok"))
        .and(query_param("pageNumber", "1"))
        .and(query_param("pageSize", "1000"))
        .and(query_param("sortDescending", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([campaign_json(1, "Spring"), campaign_json(2, "Fall")])))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok".into())).unwrap();
    let page = client.list::<Campaign>(&ListQuery::default()).await.unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].status, CampaignStatus::Active);
    assert_eq!(page.items[1].client_name.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn list_accepts_paged_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/campaigns"))
        .and(query_param("searchTerm", "spring"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [campaign_json(1, "Spring")],
            "totalCount": 1,
            "pageNumber": 1,
            "pageSize": 1000,
            "totalPages": 1
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok".into())).unwrap();
    let query = ListQuery { search_term: Some("spring".into()), ..ListQuery::default() };
    let page = client.list::<Campaign>(&query).await.unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].name, "Spring");
}

#[tokio::test]
async fn login_reads_pascal_case_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "ana@example.com", "password": "secret1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Token": "jwt-value",
            "User": { "Id": 4, "Email": "ana@example.com", "FirstName": "Ana", "LastName": "S", "Role": "Admin" }
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), None).unwrap();
    let auth = client
        .login(&LoginRequest { email: "ana@example.com".into(), password: "secret1".into() })
        .await
        .unwrap();
    assert_eq!(auth.token, "jwt-value");
    assert_eq!(auth.user.role, UserRole::Admin);
}

#[tokio::test]
async fn backend_rejection_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/campaigns"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "message": "Budget must be positive" })))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok".into())).unwrap();
    let draft = CampaignDraft {
        name: "Bad".into(),
        description: None,
        status: CampaignStatus::Planning,
        budget: -1.0,
        start_date: None,
        end_date: None,
        client_id: 2,
        service_id: None,
    };
    let err = client.create::<Campaign>(&draft).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "server returned 400: Budget must be positive");
}

#[tokio::test]
async fn no_content_update_and_delete_succeed() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/campaigns/7"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/campaigns/7"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok".into())).unwrap();
    let draft = CampaignDraft {
        name: "Renamed".into(),
        description: None,
        status: CampaignStatus::Paused,
        budget: 10.0,
        start_date: None,
        end_date: None,
        client_id: 2,
        service_id: None,
    };
    assert!(client.update::<Campaign>(7, &draft).await.unwrap().is_none());
    client.delete::<Campaign>(7).await.unwrap();
}

#[tokio::test]
async fn overlapping_message_queries_merge_into_one_thread() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .and(query_param("type", "ClientToAdmin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([message_json(1, None, 0)])))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            message_json(1, None, 0),
            message_json(2, Some(1), 5),
            message_json(3, Some(99), 9)
        ])))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok".into())).unwrap();
    let merged = client.conversation_messages(MessageType::ClientToAdmin).await.unwrap();
    assert_eq!(merged.len(), 3);
    let threads = assemble_threads(merged);
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].root.id, 1);
    assert_eq!(threads[0].replies.len(), 1);
    assert_eq!(threads[0].replies[0].status, MessageStatus::Unread);
}

#[tokio::test]
async fn failure_in_either_message_query_fails_the_load() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .and(query_param("type", "AdminToClient"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([message_json(1, None, 0)])))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Some("tok".into())).unwrap();
    let err = client.conversation_messages(MessageType::AdminToClient).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.to_string(), "server returned 500: Request failed with status 500");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let client = ApiClient::new("http://127.0.0.1:9", Some("tok".into())).unwrap();
    let err = client.list::<Campaign>(&ListQuery::default()).await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
}

#[tokio::test]
async fn me_without_token_is_rejected_locally() {
    let client = ApiClient::new("http://127.0.0.1:9", None).unwrap();
    assert!(matches!(client.me().await, Err(ApiError::Unauthenticated)));
}
