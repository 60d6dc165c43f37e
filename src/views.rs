//! Client-side search, sort and summary helpers shared by the list pages.

use chrono::{DateTime, NaiveDate, Utc};
use std::cmp::Ordering;

use crate::api::models::{
    Campaign, CampaignStatus, Client, Invoice, InvoiceStatus, Message, Payment, Service, Task,
    TaskPriority, TaskStatus, TeamMember, User,
};

/// Case-insensitive substring search over a record's text fields.
pub trait Searchable {
    fn haystack(&self) -> Vec<&str>;

    fn matches(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        needle.is_empty() || self.haystack().iter().any(|h| h.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    Missing,
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            // Missing values sink to the end.
            (SortValue::Missing, SortValue::Missing) => Ordering::Equal,
            (SortValue::Missing, _) => Ordering::Greater,
            (_, SortValue::Missing) => Ordering::Less,
            _ => Ordering::Equal,
        }
    }
}

fn text(s: &str) -> SortValue {
    SortValue::Text(s.to_string())
}

fn date(d: Option<DateTime<Utc>>) -> SortValue {
    d.map(SortValue::Date).unwrap_or(SortValue::Missing)
}

pub trait Sortable {
    /// Field names accepted by [`Sortable::sort_value`].
    const SORT_FIELDS: &'static [&'static str];

    fn sort_value(&self, field: &str) -> Option<SortValue>;
}

/// Filter by `search` then order by `sort_by`. An unknown sort field keeps
/// the fetched order. Ties keep their relative order.
pub fn filter_and_sort<T>(items: Vec<T>, search: Option<&str>, sort_by: Option<&str>, descending: bool) -> Vec<T>
where
    T: Searchable + Sortable,
{
    let mut out: Vec<T> = match search {
        Some(term) => items.into_iter().filter(|i| i.matches(term)).collect(),
        None => items,
    };
    if let Some(field) = sort_by {
        let field = field.to_lowercase();
        if T::SORT_FIELDS.contains(&field.as_str()) {
            out.sort_by(|a, b| {
                let (va, vb) = (
                    a.sort_value(&field).unwrap_or(SortValue::Missing),
                    b.sort_value(&field).unwrap_or(SortValue::Missing),
                );
                match (&va, &vb, descending) {
                    (SortValue::Missing, _, _) | (_, SortValue::Missing, _) => va.compare(&vb),
                    (_, _, true) => vb.compare(&va),
                    (_, _, false) => va.compare(&vb),
                }
            });
        }
    }
    out
}

impl Searchable for Campaign {
    fn haystack(&self) -> Vec<&str> {
        let mut h = vec![self.name.as_str(), self.status.as_str()];
        h.extend(self.description.as_deref());
        h.extend(self.client_name.as_deref());
        h.extend(self.service_name.as_deref());
        h
    }
}

impl Sortable for Campaign {
    const SORT_FIELDS: &'static [&'static str] = &["name", "status", "budget", "startdate", "enddate", "progress"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "name" => text(&self.name),
            "status" => text(self.status.as_str()),
            "budget" => SortValue::Number(self.budget),
            "startdate" => date(self.start_date),
            "enddate" => date(self.end_date),
            "progress" => SortValue::Number(completion_percent(self)),
            _ => return None,
        })
    }
}

impl Searchable for Task {
    fn haystack(&self) -> Vec<&str> {
        let mut h = vec![self.title.as_str(), self.status.as_str(), self.priority.as_str()];
        h.extend(self.description.as_deref());
        h.extend(self.campaign_name.as_deref());
        h
    }
}

impl Sortable for Task {
    const SORT_FIELDS: &'static [&'static str] = &["title", "status", "priority", "duedate"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "title" => text(&self.title),
            "status" => text(self.status.as_str()),
            "priority" => match self.priority {
                TaskPriority::Unknown => SortValue::Missing,
                p => SortValue::Number(p as u8 as f64),
            },
            "duedate" => date(self.due_date),
            _ => return None,
        })
    }
}

impl Searchable for Client {
    fn haystack(&self) -> Vec<&str> {
        let mut h = vec![self.company_name.as_str()];
        h.extend(self.contact_name.as_deref());
        h.extend(self.email.as_deref());
        h.extend(self.industry.as_deref());
        h
    }
}

impl Sortable for Client {
    const SORT_FIELDS: &'static [&'static str] = &["company", "contact", "email"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        let opt = |v: &Option<String>| v.as_deref().map(text).unwrap_or(SortValue::Missing);
        Some(match field {
            "company" => text(&self.company_name),
            "contact" => opt(&self.contact_name),
            "email" => opt(&self.email),
            _ => return None,
        })
    }
}

impl Searchable for Service {
    fn haystack(&self) -> Vec<&str> {
        let mut h = vec![self.name.as_str()];
        h.extend(self.description.as_deref());
        h.extend(self.category.as_deref());
        h
    }
}

impl Sortable for Service {
    const SORT_FIELDS: &'static [&'static str] = &["name", "category", "price"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "name" => text(&self.name),
            "category" => self.category.as_deref().map(text).unwrap_or(SortValue::Missing),
            "price" => SortValue::Number(self.base_price),
            _ => return None,
        })
    }
}

impl Searchable for User {
    fn haystack(&self) -> Vec<&str> {
        vec![
            self.email.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.role.as_str(),
        ]
    }
}

impl Sortable for User {
    const SORT_FIELDS: &'static [&'static str] = &["email", "name", "role"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "email" => text(&self.email),
            "name" => SortValue::Text(format!("{} {}", self.last_name, self.first_name)),
            "role" => text(self.role.as_str()),
            _ => return None,
        })
    }
}

impl Searchable for TeamMember {
    fn haystack(&self) -> Vec<&str> {
        let mut h = vec![self.name.as_str()];
        h.extend(self.email.as_deref());
        h.extend(self.position.as_deref());
        h
    }
}

impl Sortable for TeamMember {
    const SORT_FIELDS: &'static [&'static str] = &["name", "position", "rate"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "name" => text(&self.name),
            "position" => self.position.as_deref().map(text).unwrap_or(SortValue::Missing),
            "rate" => self.hourly_rate.map(SortValue::Number).unwrap_or(SortValue::Missing),
            _ => return None,
        })
    }
}

impl Searchable for Invoice {
    fn haystack(&self) -> Vec<&str> {
        vec![self.invoice_number.as_str(), self.status.as_str()]
    }
}

impl Sortable for Invoice {
    const SORT_FIELDS: &'static [&'static str] = &["number", "total", "status", "duedate", "issuedate"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "number" => text(&self.invoice_number),
            "total" => SortValue::Number(self.total_amount),
            "status" => text(self.status.as_str()),
            "duedate" => date(self.due_date),
            "issuedate" => date(self.issue_date),
            _ => return None,
        })
    }
}

impl Searchable for Payment {
    fn haystack(&self) -> Vec<&str> {
        let mut h = Vec::new();
        h.extend(self.payment_method.as_deref());
        h.extend(self.transaction_reference.as_deref());
        h
    }
}

impl Sortable for Payment {
    const SORT_FIELDS: &'static [&'static str] = &["amount", "date"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "amount" => SortValue::Number(self.amount),
            "date" => date(self.payment_date),
            _ => return None,
        })
    }
}

impl Searchable for Message {
    fn haystack(&self) -> Vec<&str> {
        let mut h = vec![self.subject.as_str(), self.content.as_str()];
        h.extend(self.sender_name.as_deref());
        h.extend(self.sender_email.as_deref());
        h
    }
}

impl Sortable for Message {
    const SORT_FIELDS: &'static [&'static str] = &["date", "subject", "status"];

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "date" => SortValue::Date(self.created_at),
            "subject" => text(&self.subject),
            "status" => text(self.status.as_str()),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceDisplayStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceDisplayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceDisplayStatus::Pending => "Pending",
            InvoiceDisplayStatus::Paid => "Paid",
            InvoiceDisplayStatus::Overdue => "Overdue",
            InvoiceDisplayStatus::Cancelled => "Cancelled",
        }
    }
}

/// Draft and Sent read as Pending; anything unpaid past its due day is Overdue.
pub fn invoice_display_status(invoice: &Invoice, today: NaiveDate) -> InvoiceDisplayStatus {
    match invoice.status {
        InvoiceStatus::Paid => InvoiceDisplayStatus::Paid,
        InvoiceStatus::Cancelled => InvoiceDisplayStatus::Cancelled,
        InvoiceStatus::Overdue => InvoiceDisplayStatus::Overdue,
        InvoiceStatus::Draft | InvoiceStatus::Sent | InvoiceStatus::Unknown => match invoice.due_day() {
            Some(due) if due < today => InvoiceDisplayStatus::Overdue,
            _ => InvoiceDisplayStatus::Pending,
        },
    }
}

pub fn completion_percent(campaign: &Campaign) -> f64 {
    if campaign.task_count == 0 {
        return 0.0;
    }
    let done = campaign.completed_task_count.min(campaign.task_count);
    f64::from(done) * 100.0 / f64::from(campaign.task_count)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CampaignStats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    pub total_budget: f64,
    pub active_budget: f64,
}

impl CampaignStats {
    pub fn from_campaigns(campaigns: &[Campaign]) -> Self {
        campaigns.iter().fold(Self::default(), |mut acc, c| {
            acc.total += 1;
            acc.total_budget += c.budget;
            match c.status {
                CampaignStatus::Active => {
                    acc.active += 1;
                    acc.active_budget += c.budget;
                }
                CampaignStatus::Completed => acc.completed += 1,
                _ => {}
            }
            acc
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub overdue: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task], now: DateTime<Utc>) -> Self {
        tasks.iter().fold(Self::default(), |mut acc, t| {
            acc.total += 1;
            match t.status {
                TaskStatus::Pending => acc.pending += 1,
                TaskStatus::InProgress => acc.in_progress += 1,
                TaskStatus::Completed => acc.completed += 1,
                _ => {}
            }
            let open = !matches!(t.status, TaskStatus::Completed | TaskStatus::Cancelled);
            if open && t.due_date.is_some_and(|d| d < now) {
                acc.overdue += 1;
            }
            acc
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InvoiceStats {
    pub count: usize,
    pub billed: f64,
    pub paid: f64,
    pub outstanding: f64,
    pub overdue: f64,
}

impl InvoiceStats {
    pub fn from_invoices(invoices: &[Invoice], today: NaiveDate) -> Self {
        invoices.iter().fold(Self::default(), |mut acc, inv| {
            let status = invoice_display_status(inv, today);
            if status == InvoiceDisplayStatus::Cancelled {
                return acc;
            }
            acc.count += 1;
            acc.billed += inv.total_amount;
            match status {
                InvoiceDisplayStatus::Paid => acc.paid += inv.total_amount,
                InvoiceDisplayStatus::Overdue => {
                    acc.outstanding += inv.total_amount;
                    acc.overdue += inv.total_amount;
                }
                _ => acc.outstanding += inv.total_amount,
            }
            acc
        })
    }
}
