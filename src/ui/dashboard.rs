use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::api::models::{Campaign, Service};
use crate::approvals::{Approval, ApprovalStatus, campaign_fully_approved, summarize};
use crate::ui::table::render_rows;
use crate::utils::money;
use crate::views::{CampaignStats, InvoiceStats, TaskStats, completion_percent};

pub struct AdminOverview<'a> {
    pub campaigns: CampaignStats,
    pub tasks: TaskStats,
    pub invoices: InvoiceStats,
    pub unread_threads: usize,
    pub recent: &'a [Campaign],
}

pub fn render_admin(view: &AdminOverview<'_>) -> String {
    let mut out = String::new();
    let c = &view.campaigns;
    let t = &view.tasks;
    let i = &view.invoices;
    let _ = writeln!(out, "Campaigns   {} total, {} active, {} completed", c.total, c.active, c.completed);
    let _ = writeln!(out, "Budget      {} total, {} in active campaigns", money(c.total_budget), money(c.active_budget));
    let _ = writeln!(
        out,
        "Tasks       {} total, {} pending, {} in progress, {} completed, {} overdue",
        t.total, t.pending, t.in_progress, t.completed, t.overdue
    );
    let _ = writeln!(
        out,
        "Invoices    {} billed, {} paid, {} outstanding ({} overdue)",
        money(i.billed),
        money(i.paid),
        money(i.outstanding),
        money(i.overdue)
    );
    let _ = writeln!(out, "Messages    {} conversations with unread messages", view.unread_threads);
    if !view.recent.is_empty() {
        out.push('\n');
        out.push_str("Recent campaigns\n");
        let rows: Vec<Vec<String>> = view
            .recent
            .iter()
            .map(|c| vec![c.name.clone(), c.status.to_string(), format!("{:.0}%", completion_percent(c))])
            .collect();
        out.push_str(&render_rows(&["NAME", "STATUS", "PROGRESS"], &rows));
    }
    out
}

/// A client's campaigns with their progress and sign-off state.
pub fn render_client(campaigns: &[Campaign], approvals: &[Approval]) -> String {
    let summary = summarize(approvals);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Approvals   {} waiting for you, {} approved, {} rejected",
        summary.pending, summary.approved, summary.rejected
    );
    out.push('\n');
    let rows: Vec<Vec<String>> = campaigns
        .iter()
        .map(|c| {
            let waiting = approvals
                .iter()
                .filter(|a| a.campaign_id == c.id && a.status == ApprovalStatus::Pending)
                .count();
            let sign_off = if campaign_fully_approved(c.id, approvals) {
                "fully approved".to_string()
            } else if waiting > 0 {
                format!("{waiting} awaiting approval")
            } else {
                "-".to_string()
            };
            vec![
                c.id.to_string(),
                c.name.clone(),
                c.status.to_string(),
                format!("{:.0}%", completion_percent(c)),
                sign_off,
            ]
        })
        .collect();
    out.push_str(&render_rows(&["ID", "CAMPAIGN", "STATUS", "PROGRESS", "SIGN-OFF"], &rows));
    out
}

pub fn render_approvals(approvals: &[Approval]) -> String {
    let rows: Vec<Vec<String>> = approvals
        .iter()
        .map(|a| {
            vec![
                a.task_id.to_string(),
                a.task_title.clone(),
                format!("#{}", a.campaign_id),
                a.status.as_str().to_string(),
                a.decided_at.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".into()),
                a.note.clone().unwrap_or_default(),
            ]
        })
        .collect();
    render_rows(&["TASK", "TITLE", "CAMPAIGN", "STATUS", "DECIDED", "NOTE"], &rows)
}

/// The pricing page: active services grouped by category.
pub fn render_pricing(services: &[Service]) -> String {
    let mut groups: BTreeMap<&str, Vec<&Service>> = BTreeMap::new();
    for s in services.iter().filter(|s| s.is_active) {
        groups.entry(s.category.as_deref().unwrap_or("Other")).or_default().push(s);
    }
    if groups.is_empty() {
        return "No services on offer.\n".to_string();
    }
    let mut out = String::new();
    for (category, mut items) in groups {
        items.sort_by(|a, b| a.base_price.total_cmp(&b.base_price));
        let _ = writeln!(out, "{category}");
        for s in items {
            let _ = writeln!(out, "  {:<32} {:>12}", s.name, money(s.base_price));
            if let Some(desc) = s.description.as_deref().filter(|d| !d.is_empty()) {
                let _ = writeln!(out, "      {}", crate::utils::truncate(desc, 72));
            }
        }
    }
    out
}
