use log::debug;
use reqwest::{Client as HttpClient, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::api::Resource;
use crate::api::models::{
    AuthResponse, ListResponse, LoginRequest, Message, MessageStatus, MessageType, Page,
    ProfileUpdate, RegisterRequest, UserInfo,
};
use crate::error::ApiError;
use crate::threads;

/// Every list view asks for this many records in a single call.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    pub page_number: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    pub sort_descending: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search_term: None,
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: None,
            sort_descending: false,
        }
    }
}

impl ListQuery {
    pub fn with_page_size(page_size: u32) -> Self {
        Self { page_size, ..Self::default() }
    }
}

pub struct ApiClient {
    http: HttpClient,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        let base = Url::parse(&format!("{}/", Self::base_api(base_url)))?;
        Ok(Self {
            http: HttpClient::new(),
            base,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn base_api(base_url: &str) -> String {
        let trimmed = base_url.trim_end_matches('/');
        if trimmed.ends_with("/api") { trimmed.to_string() } else { format!("{}/api", trimmed) }
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base.join(path)?)
    }

    fn with_auth(mut req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        if let Some(t) = token {
            req = req.header("Authorization", format!("Bearer {}", t));
        }
        req
    }

    async fn execute(&self, req: RequestBuilder) -> Result<String, ApiError> {
        let resp = Self::with_auth(req, self.token.as_deref()).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        debug!("<- {} ({} bytes)", status, body.len());
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: backend_message(status, &body),
            });
        }
        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let body = self.execute(req).await?;
        Ok(serde_json::from_str(&body)?)
    }

    // Mutations may answer 204 or an empty 200; the caller refetches anyway.
    async fn fetch_optional<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Option<T>, ApiError> {
        let body = self.execute(req).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint("auth/login")?;
        debug!("-> POST {}", url);
        self.fetch(self.http.post(url).json(req)).await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint("auth/register")?;
        debug!("-> POST {}", url);
        self.fetch(self.http.post(url).json(req)).await
    }

    pub async fn me(&self) -> Result<UserInfo, ApiError> {
        if !self.is_authenticated() {
            return Err(ApiError::Unauthenticated);
        }
        let url = self.endpoint("auth/me")?;
        debug!("-> GET {}", url);
        self.fetch(self.http.get(url)).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Option<UserInfo>, ApiError> {
        if !self.is_authenticated() {
            return Err(ApiError::Unauthenticated);
        }
        let url = self.endpoint("auth/profile")?;
        debug!("-> PUT {}", url);
        self.fetch_optional(self.http.put(url).json(update)).await
    }

    pub async fn list<R: Resource>(&self, query: &ListQuery) -> Result<Page<R>, ApiError> {
        let url = self.endpoint(R::PATH)?;
        debug!("-> GET {} {:?}", url, query);
        let resp: ListResponse<R> = self.fetch(self.http.get(url).query(query)).await?;
        Ok(resp.into())
    }

    pub async fn get<R: Resource>(&self, id: i64) -> Result<R, ApiError> {
        let url = self.endpoint(&format!("{}/{}", R::PATH, id))?;
        debug!("-> GET {}", url);
        self.fetch(self.http.get(url)).await
    }

    pub async fn create<R: Resource>(&self, draft: &R::Draft) -> Result<Option<R>, ApiError> {
        let url = self.endpoint(R::PATH)?;
        debug!("-> POST {}", url);
        self.fetch_optional(self.http.post(url).json(draft)).await
    }

    pub async fn update<R: Resource>(&self, id: i64, draft: &R::Draft) -> Result<Option<R>, ApiError> {
        let url = self.endpoint(&format!("{}/{}", R::PATH, id))?;
        debug!("-> PUT {}", url);
        self.fetch_optional(self.http.put(url).json(draft)).await
    }

    pub async fn delete<R: Resource>(&self, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("{}/{}", R::PATH, id))?;
        debug!("-> DELETE {}", url);
        self.execute(self.http.delete(url)).await.map(|_| ())
    }

    /// Fetch messages, optionally restricted to one message type.
    pub async fn messages(&self, kind: Option<MessageType>) -> Result<Vec<Message>, ApiError> {
        let url = self.endpoint(<Message as Resource>::PATH)?;
        let mut req = self.http.get(url).query(&ListQuery::default());
        if let Some(kind) = kind {
            req = req.query(&[("type", kind.as_str())]);
        }
        debug!("-> GET messages type={:?}", kind);
        let resp: ListResponse<Message> = self.fetch(req).await?;
        Ok(Page::from(resp).items)
    }

    /// The unfiltered and the type-filtered message queries overlap; both are
    /// fetched together and merged by id. Either failing fails the whole load.
    pub async fn conversation_messages(&self, kind: MessageType) -> Result<Vec<Message>, ApiError> {
        let (all, typed) = tokio::try_join!(self.messages(None), self.messages(Some(kind)))?;
        Ok(threads::merge_messages([all, typed]))
    }

    pub async fn set_message_status(&self, id: i64, status: MessageStatus) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("messages/{}/status", id))?;
        debug!("-> PUT {} {}", url, status);
        let body = serde_json::json!({ "status": status });
        self.execute(self.http.put(url).json(&body)).await.map(|_| ())
    }
}

/// Pick the most useful human-readable message out of an error body.
pub fn backend_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(s) = json.as_str().filter(|s| !s.trim().is_empty()) {
            return s.to_string();
        }
        for key in ["message", "Message", "title", "error", "detail"] {
            if let Some(s) = json.get(key).and_then(|v| v.as_str()).filter(|s| !s.trim().is_empty()) {
                return s.to_string();
            }
        }
        // ASP.NET style validation errors: { "errors": { "Field": ["msg", ...] } }
        if let Some(errors) = json.get("errors").and_then(|v| v.as_object()) {
            let joined: Vec<String> = errors
                .values()
                .filter_map(|v| v.as_array())
                .flatten()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            if !joined.is_empty() {
                return joined.join("; ");
            }
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && !trimmed.starts_with('<') && trimmed.len() <= 500 {
        return trimmed.to_string();
    }
    format!("Request failed with status {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_api_appends_api_once() {
        assert_eq!(ApiClient::base_api("https://agency.test"), "https://agency.test/api");
        assert_eq!(ApiClient::base_api("https://agency.test/api/"), "https://agency.test/api");
    }

    #[test]
    fn endpoints_join_under_api() {
        let client = ApiClient::new("https://agency.test/", None).unwrap();
        assert_eq!(
            client.endpoint("campaigns/4").unwrap().as_str(),
            "https://agency.test/api/campaigns/4"
        );
    }

    #[test]
    fn backend_message_prefers_json_fields() {
        let s = StatusCode::BAD_REQUEST;
        assert_eq!(backend_message(s, r#"{"Message":"Email taken"}"#), "Email taken");
        assert_eq!(
            backend_message(s, r#"{"title":"x","errors":{}}"#),
            "x"
        );
        assert_eq!(
            backend_message(s, r#"{"errors":{"Password":["Too short"]}}"#),
            "Too short"
        );
        assert_eq!(backend_message(s, "plain failure"), "plain failure");
        assert_eq!(backend_message(s, "<html>oops</html>"), "Request failed with status 400");
        assert_eq!(backend_message(s, ""), "Request failed with status 400");
    }

    #[test]
    fn default_query_requests_a_full_page() {
        let q = ListQuery::default();
        assert_eq!(q.page_number, 1);
        assert_eq!(q.page_size, DEFAULT_PAGE_SIZE);
        assert!(!q.sort_descending);
    }
}
