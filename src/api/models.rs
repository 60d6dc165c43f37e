use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::timestamp;

/// Matches a user-typed label against a closed set of variants, ignoring case,
/// spaces, dashes and underscores.
fn parse_variant<T: Copy>(raw: &str, all: &[T], label: impl Fn(&T) -> &'static str) -> Option<T> {
    let wanted = squash(raw);
    all.iter().copied().find(|v| squash(label(v)) == wanted)
}

/// Whether two status labels name the same thing, e.g. `"On Hold"` and `on-hold`.
pub fn labels_match(a: &str, b: &str) -> bool {
    squash(a) == squash(b)
}

fn squash(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

macro_rules! label_impls {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_variant(s, $ty::ALL, |v| v.as_str())
                    .ok_or_else(|| format!("unknown {}: {}", stringify!($ty), s))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    ContactForm,
    ClientToAdmin,
    AdminToClient,
    TeamToAdmin,
    AdminToTeam,
    #[serde(other)]
    Unknown,
}

impl MessageType {
    pub const ALL: &'static [MessageType] = &[
        MessageType::ContactForm,
        MessageType::ClientToAdmin,
        MessageType::AdminToClient,
        MessageType::TeamToAdmin,
        MessageType::AdminToTeam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::ContactForm => "ContactForm",
            MessageType::ClientToAdmin => "ClientToAdmin",
            MessageType::AdminToClient => "AdminToClient",
            MessageType::TeamToAdmin => "TeamToAdmin",
            MessageType::AdminToTeam => "AdminToTeam",
            MessageType::Unknown => "Unknown",
        }
    }

    /// The type that answers this one. Contact forms are answered in kind.
    pub fn counterpart(&self) -> MessageType {
        match self {
            MessageType::ClientToAdmin => MessageType::AdminToClient,
            MessageType::AdminToClient => MessageType::ClientToAdmin,
            MessageType::TeamToAdmin => MessageType::AdminToTeam,
            MessageType::AdminToTeam => MessageType::TeamToAdmin,
            other => *other,
        }
    }
}

label_impls!(MessageType);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MessageStatus {
    #[default]
    Unread,
    Read,
    Replied,
    Archived,
    #[serde(other)]
    Unknown,
}

impl MessageStatus {
    pub const ALL: &'static [MessageStatus] = &[
        MessageStatus::Unread,
        MessageStatus::Read,
        MessageStatus::Replied,
        MessageStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Unread => "Unread",
            MessageStatus::Read => "Read",
            MessageStatus::Replied => "Replied",
            MessageStatus::Archived => "Archived",
            MessageStatus::Unknown => "Unknown",
        }
    }
}

label_impls!(MessageStatus);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelatedEntityType {
    Campaign,
    Task,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub content: String,
    #[serde(rename = "type", alias = "messageType")]
    pub kind: MessageType,
    #[serde(default)]
    pub status: MessageStatus,
    #[serde(default)]
    pub sender_user_id: Option<i64>,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub recipient_user_id: Option<i64>,
    #[serde(default)]
    pub parent_message_id: Option<i64>,
    #[serde(default)]
    pub related_entity_type: Option<RelatedEntityType>,
    #[serde(default)]
    pub related_entity_id: Option<i64>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Message>,
}

impl Message {
    pub fn is_related_to(&self, kind: RelatedEntityType, id: i64) -> bool {
        self.related_entity_type == Some(kind) && self.related_entity_id == Some(id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    pub subject: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_type: Option<RelatedEntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_entity_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CampaignStatus {
    #[serde(alias = "Pending")]
    Planning,
    Active,
    Paused,
    Completed,
    Cancelled,
    #[serde(alias = "On Hold")]
    OnHold,
    #[serde(other)]
    Unknown,
}

impl CampaignStatus {
    pub const ALL: &'static [CampaignStatus] = &[
        CampaignStatus::Planning,
        CampaignStatus::Active,
        CampaignStatus::Paused,
        CampaignStatus::Completed,
        CampaignStatus::Cancelled,
        CampaignStatus::OnHold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Planning => "Planning",
            CampaignStatus::Active => "Active",
            CampaignStatus::Paused => "Paused",
            CampaignStatus::Completed => "Completed",
            CampaignStatus::Cancelled => "Cancelled",
            CampaignStatus::OnHold => "On Hold",
            CampaignStatus::Unknown => "Unknown",
        }
    }
}

label_impls!(CampaignStatus);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: CampaignStatus,
    #[serde(default)]
    pub budget: f64,
    #[serde(default, with = "timestamp::option")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub service_id: Option<i64>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub task_count: u32,
    #[serde(default)]
    pub completed_task_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: CampaignStatus,
    pub budget: f64,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub client_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    #[serde(alias = "In Progress")]
    InProgress,
    Completed,
    #[serde(alias = "On Hold")]
    OnHold,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub const ALL: &'static [TaskStatus] = &[
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::OnHold,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
            TaskStatus::OnHold => "On Hold",
            TaskStatus::Cancelled => "Cancelled",
            TaskStatus::Unknown => "Unknown",
        }
    }
}

label_impls!(TaskStatus);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
    #[serde(other)]
    Unknown,
}

impl TaskPriority {
    pub const ALL: &'static [TaskPriority] = &[
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Urgent => "Urgent",
            TaskPriority::Unknown => "Unknown",
        }
    }
}

label_impls!(TaskPriority);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub campaign_id: i64,
    #[serde(default)]
    pub campaign_name: Option<String>,
    #[serde(default)]
    pub assigned_to_team_member_id: Option<i64>,
    #[serde(default, with = "timestamp::option")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: TaskPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub campaign_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to_team_member_id: Option<i64>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: TaskPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl InvoiceStatus {
    pub const ALL: &'static [InvoiceStatus] = &[
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
        InvoiceStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Sent => "Sent",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
            InvoiceStatus::Cancelled => "Cancelled",
            InvoiceStatus::Unknown => "Unknown",
        }
    }
}

label_impls!(InvoiceStatus);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: i64,
    pub invoice_number: String,
    pub campaign_id: i64,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub total_amount: f64,
    pub status: InvoiceStatus,
    #[serde(default, with = "timestamp::option")]
    pub issue_date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub paid_date: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn due_day(&self) -> Option<NaiveDate> {
        self.due_date.map(|d| d.date_naive())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub campaign_id: i64,
    pub amount: f64,
    #[serde(default)]
    pub tax_amount: f64,
    pub status: InvoiceStatus,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub company_name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDraft {
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub base_price: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub base_price: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Client,
    #[serde(alias = "Team", alias = "Team Member")]
    TeamMember,
    #[serde(other)]
    Unknown,
}

impl UserRole {
    pub const ALL: &'static [UserRole] = &[UserRole::Admin, UserRole::Client, UserRole::TeamMember];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Client => "Client",
            UserRole::TeamMember => "TeamMember",
            UserRole::Unknown => "Unknown",
        }
    }
}

label_impls!(UserRole);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: UserRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default, alias = "fullName")]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "specialization")]
    pub position: Option<String>,
    #[serde(default)]
    pub hourly_rate: Option<f64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberDraft {
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<f64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub invoice_id: i64,
    pub amount: f64,
    #[serde(default, with = "timestamp::option")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub transaction_reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub invoice_id: i64,
    pub amount: f64,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_reference: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A page of results. List endpoints answer either with this envelope or
/// with a bare array; see [`ListResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(alias = "data")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default = "first_page")]
    pub page_number: u32,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub total_pages: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ListResponse<T> {
    Paged(Page<T>),
    Bare(Vec<T>),
}

impl<T> From<ListResponse<T>> for Page<T> {
    fn from(resp: ListResponse<T>) -> Self {
        match resp {
            ListResponse::Paged(page) => page,
            ListResponse::Bare(items) => {
                let len = items.len();
                Page {
                    items,
                    total_count: len as u64,
                    page_number: 1,
                    page_size: len as u32,
                    total_pages: 1,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// Auth endpoints answer in PascalCase; the session file stores camelCase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(alias = "Id")]
    pub id: i64,
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(default, alias = "FirstName")]
    pub first_name: String,
    #[serde(default, alias = "LastName")]
    pub last_name: String,
    #[serde(alias = "Role")]
    pub role: UserRole,
    #[serde(default, alias = "ClientId", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i64>,
    #[serde(default, alias = "TeamMemberId", skip_serializing_if = "Option::is_none")]
    pub team_member_id: Option<i64>,
}

impl UserInfo {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() { self.email.clone() } else { full.to_string() }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(alias = "Token", alias = "accessToken")]
    pub token: String,
    #[serde(default, alias = "Expiration", with = "timestamp::option")]
    pub expiration: Option<DateTime<Utc>>,
    #[serde(alias = "User")]
    pub user: UserInfo,
}
