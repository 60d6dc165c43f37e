use chrono::{DateTime, Utc};

use crate::api::models::{Campaign, Client, Invoice, Message, Payment, Service, Task, TeamMember, User};
use crate::utils::{money, truncate};
use crate::views::{completion_percent, invoice_display_status};

/// A record that can be shown as one line of a text table.
pub trait TableRow {
    const HEADERS: &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

fn day(d: Option<DateTime<Utc>>) -> String {
    d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".into())
}

fn or_dash(s: Option<&str>) -> String {
    s.filter(|s| !s.is_empty()).unwrap_or("-").to_string()
}

pub fn render<T: TableRow>(rows: &[T]) -> String {
    let cells: Vec<Vec<String>> = rows.iter().map(T::cells).collect();
    render_rows(T::HEADERS, &cells)
}

pub fn render_rows(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{}{}", c, " ".repeat(w - c.chars().count())))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&line(headers.to_vec()));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    if rows.is_empty() {
        out.push_str("(no records)\n");
    }
    out
}

impl TableRow for Campaign {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "CLIENT", "STATUS", "BUDGET", "START", "END", "PROGRESS"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            truncate(&self.name, 32),
            or_dash(self.client_name.as_deref()),
            self.status.to_string(),
            money(self.budget),
            day(self.start_date),
            day(self.end_date),
            format!("{:.0}% ({}/{})", completion_percent(self), self.completed_task_count, self.task_count),
        ]
    }
}

impl TableRow for Task {
    const HEADERS: &'static [&'static str] = &["ID", "TITLE", "CAMPAIGN", "STATUS", "PRIORITY", "DUE", "ASSIGNEE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            truncate(&self.title, 36),
            self.campaign_name.clone().unwrap_or_else(|| format!("#{}", self.campaign_id)),
            self.status.to_string(),
            self.priority.to_string(),
            day(self.due_date),
            self.assigned_to_team_member_id.map(|id| format!("#{id}")).unwrap_or_else(|| "-".into()),
        ]
    }
}

impl TableRow for Client {
    const HEADERS: &'static [&'static str] = &["ID", "COMPANY", "CONTACT", "EMAIL", "PHONE", "INDUSTRY"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            truncate(&self.company_name, 32),
            or_dash(self.contact_name.as_deref()),
            or_dash(self.email.as_deref()),
            or_dash(self.phone.as_deref()),
            or_dash(self.industry.as_deref()),
        ]
    }
}

impl TableRow for Service {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "CATEGORY", "PRICE", "ACTIVE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            truncate(&self.name, 32),
            or_dash(self.category.as_deref()),
            money(self.base_price),
            if self.is_active { "yes".into() } else { "no".into() },
        ]
    }
}

impl TableRow for User {
    const HEADERS: &'static [&'static str] = &["ID", "EMAIL", "NAME", "ROLE", "ACTIVE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.email.clone(),
            format!("{} {}", self.first_name, self.last_name).trim().to_string(),
            self.role.to_string(),
            if self.is_active { "yes".into() } else { "no".into() },
        ]
    }
}

impl TableRow for TeamMember {
    const HEADERS: &'static [&'static str] = &["ID", "NAME", "POSITION", "RATE", "ACTIVE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            or_dash(self.position.as_deref()),
            self.hourly_rate.map(money).unwrap_or_else(|| "-".into()),
            if self.is_active { "yes".into() } else { "no".into() },
        ]
    }
}

impl TableRow for Invoice {
    const HEADERS: &'static [&'static str] = &["ID", "NUMBER", "CAMPAIGN", "AMOUNT", "TAX", "TOTAL", "DUE", "STATUS"];

    fn cells(&self) -> Vec<String> {
        let today = Utc::now().date_naive();
        vec![
            self.id.to_string(),
            self.invoice_number.clone(),
            format!("#{}", self.campaign_id),
            money(self.amount),
            money(self.tax_amount),
            money(self.total_amount),
            day(self.due_date),
            invoice_display_status(self, today).as_str().to_string(),
        ]
    }
}

impl TableRow for Payment {
    const HEADERS: &'static [&'static str] = &["ID", "INVOICE", "AMOUNT", "DATE", "METHOD", "REFERENCE"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            format!("#{}", self.invoice_id),
            money(self.amount),
            day(self.payment_date),
            or_dash(self.payment_method.as_deref()),
            or_dash(self.transaction_reference.as_deref()),
        ]
    }
}

impl TableRow for Message {
    const HEADERS: &'static [&'static str] = &["ID", "DATE", "FROM", "TYPE", "STATUS", "SUBJECT"];

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.created_at.format("%Y-%m-%d %H:%M").to_string(),
            or_dash(self.sender_name.as_deref().or(self.sender_email.as_deref())),
            self.kind.to_string(),
            self.status.to_string(),
            truncate(&self.subject, 40),
        ]
    }
}
