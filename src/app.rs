use directories::{BaseDirs, ProjectDirs};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

use crate::api::client::{ApiClient, DEFAULT_PAGE_SIZE};
use crate::api::events::AuthEvent;
use crate::api::models::{AuthResponse, UserInfo};
use crate::error::{ApiError, AppError, AppResult};
use crate::utils::normalize_url;

pub const API_URL_ENV: &str = "AGENCY_DESK_API_URL";

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// What survives between runs: where the backend lives and who is signed in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppState {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            page_size: DEFAULT_PAGE_SIZE,
            user: None,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    // TOML is the session format. An older JSON session file is read once and
    // rewritten as TOML.
    pub fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("agency-desk").join("session.toml"))
    }

    fn legacy_json_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("com", "example", "AgencyDesk")?;
        Some(proj.config_dir().join("state.json"))
    }

    pub fn load() -> Self {
        if let Some(path) = Self::toml_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
            if let Some(legacy) = Self::legacy_json_path() {
                if let Some(state) = Self::load_legacy(&legacy) {
                    if let Err(e) = state.save_to(&path) {
                        warn!("could not migrate legacy session: {e}");
                    }
                    return state;
                }
            }
        }
        Self::new()
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => match toml::from_str::<AppState>(&text) {
                Ok(state) => state,
                Err(e) => {
                    warn!("ignoring unreadable session file {}: {e}", path.display());
                    Self::new()
                }
            },
            Err(_) => Self::new(),
        }
    }

    pub fn load_legacy(path: &Path) -> Option<Self> {
        let bytes = fs::read(path).ok()?;
        serde_json::from_slice::<AppState>(&bytes).ok()
    }

    pub fn save(&self) -> AppResult<()> {
        let path = Self::toml_path().ok_or(AppError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml)?;
        Ok(())
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// The signed-in session, passed to whatever needs it. Identity changes are
/// published to subscribers instead of through global state.
pub struct SessionContext {
    state: AppState,
    path: Option<PathBuf>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionContext {
    /// Load from `path`, or from the platform config dir when `None`.
    pub fn load(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::with_state(AppState::load_from(&path), Some(path)),
            None => Self::with_state(AppState::load(), AppState::toml_path()),
        }
    }

    pub fn with_state(state: AppState, path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self { state, path, events }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.state.user.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Resolve the backend URL: explicit override, then the environment, then
    /// the saved session.
    pub fn resolve_base_url(&mut self, override_url: Option<&str>) -> AppResult<String> {
        let env_url = std::env::var(API_URL_ENV).ok();
        let chosen = override_url
            .map(str::to_string)
            .or(env_url)
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.state.base_url.clone());
        if chosen.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "no API URL configured; pass --api-url or set {API_URL_ENV}"
            )));
        }
        let url = normalize_url(&chosen);
        self.state.base_url = url.clone();
        Ok(url)
    }

    /// A client for anonymous calls (login, register).
    pub fn anonymous_client(&self) -> AppResult<ApiClient> {
        Ok(ApiClient::new(&self.state.base_url, None)?)
    }

    /// A client carrying the session token. Fails when nobody is signed in.
    pub fn client(&self) -> AppResult<ApiClient> {
        let token = self.state.token.clone().ok_or(ApiError::Unauthenticated)?;
        Ok(ApiClient::new(&self.state.base_url, Some(token))?)
    }

    pub fn sign_in(&mut self, auth: AuthResponse) -> AppResult<()> {
        info!("signed in as {}", auth.user.email);
        self.state.token = Some(auth.token);
        self.state.user = Some(auth.user.clone());
        self.persist()?;
        let _ = self.events.send(AuthEvent::SignedIn(auth.user));
        Ok(())
    }

    pub fn update_profile(&mut self, user: UserInfo) -> AppResult<()> {
        self.state.user = Some(user.clone());
        self.persist()?;
        let _ = self.events.send(AuthEvent::ProfileUpdated(user));
        Ok(())
    }

    /// Forget the token and user but keep the backend URL.
    pub fn clear(&mut self) -> AppResult<()> {
        info!("signed out");
        self.state.token = None;
        self.state.user = None;
        self.persist()?;
        let _ = self.events.send(AuthEvent::SignedOut);
        Ok(())
    }

    pub fn persist(&self) -> AppResult<()> {
        match &self.path {
            Some(path) => self.state.save_to(path),
            None => self.state.save(),
        }
    }
}
