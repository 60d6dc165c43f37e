//! Client sign-off on completed tasks.
//!
//! The backend has no approval resource. A completed task is waiting for the
//! client's approval until the client sends a `ClientToAdmin` message tied to
//! the task whose content opens with `[APPROVED]` or `[REJECTED]`; the newest
//! such message decides.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::api::models::{Message, MessageDraft, MessageType, RelatedEntityType, Task, TaskStatus};

pub const APPROVED_MARKER: &str = "[APPROVED]";
pub const REJECTED_MARKER: &str = "[REJECTED]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "Pending",
            ApprovalStatus::Approved => "Approved",
            ApprovalStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    /// Approvals are keyed by the task they sign off.
    pub id: i64,
    pub task_id: i64,
    pub campaign_id: i64,
    pub task_title: String,
    pub status: ApprovalStatus,
    pub decided_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalSummary {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// The decision a message carries, with whatever text follows the marker.
pub fn decision_of(message: &Message) -> Option<(ApprovalStatus, Option<String>)> {
    if message.kind != MessageType::ClientToAdmin {
        return None;
    }
    let content = message.content.trim_start();
    for (marker, status) in [
        (APPROVED_MARKER, ApprovalStatus::Approved),
        (REJECTED_MARKER, ApprovalStatus::Rejected),
    ] {
        let matches = content
            .get(..marker.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(marker));
        if matches {
            let rest = content[marker.len()..].trim();
            let note = (!rest.is_empty()).then(|| rest.to_string());
            return Some((status, note));
        }
    }
    None
}

pub fn derive_approvals(tasks: &[Task], messages: &[Message]) -> Vec<Approval> {
    let mut latest: HashMap<i64, (&Message, ApprovalStatus, Option<String>)> = HashMap::new();
    for message in messages {
        if message.related_entity_type != Some(RelatedEntityType::Task) {
            continue;
        }
        let (Some(task_id), Some((status, note))) = (message.related_entity_id, decision_of(message)) else {
            continue;
        };
        let newer = latest
            .get(&task_id)
            .is_none_or(|(prev, _, _)| (message.created_at, message.id) > (prev.created_at, prev.id));
        if newer {
            latest.insert(task_id, (message, status, note));
        }
    }

    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .map(|task| {
            let (status, decided_at, note) = match latest.get(&task.id) {
                Some((msg, status, note)) => (*status, Some(msg.created_at), note.clone()),
                None => (ApprovalStatus::Pending, None, None),
            };
            Approval {
                id: task.id,
                task_id: task.id,
                campaign_id: task.campaign_id,
                task_title: task.title.clone(),
                status,
                decided_at,
                note,
            }
        })
        .collect()
}

/// The message a client sends to record a decision on `task`.
pub fn approval_request(task: &Task, decision: ApprovalStatus, note: Option<&str>) -> Option<MessageDraft> {
    let (marker, verb) = match decision {
        ApprovalStatus::Approved => (APPROVED_MARKER, "approved"),
        ApprovalStatus::Rejected => (REJECTED_MARKER, "rejected"),
        ApprovalStatus::Pending => return None,
    };
    let content = match note.map(str::trim).filter(|n| !n.is_empty()) {
        Some(note) => format!("{marker} {note}"),
        None => marker.to_string(),
    };
    Some(MessageDraft {
        subject: format!("Task {verb}: {}", task.title),
        content,
        kind: MessageType::ClientToAdmin,
        recipient_user_id: None,
        parent_message_id: None,
        related_entity_type: Some(RelatedEntityType::Task),
        related_entity_id: Some(task.id),
    })
}

/// True when the campaign has completed work and every piece of it is approved.
pub fn campaign_fully_approved(campaign_id: i64, approvals: &[Approval]) -> bool {
    let mut any = false;
    for approval in approvals.iter().filter(|a| a.campaign_id == campaign_id) {
        if approval.status != ApprovalStatus::Approved {
            return false;
        }
        any = true;
    }
    any
}

pub fn summarize(approvals: &[Approval]) -> ApprovalSummary {
    approvals.iter().fold(ApprovalSummary::default(), |mut acc, a| {
        match a.status {
            ApprovalStatus::Pending => acc.pending += 1,
            ApprovalStatus::Approved => acc.approved += 1,
            ApprovalStatus::Rejected => acc.rejected += 1,
        }
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{MessageStatus, TaskPriority};
    use chrono::TimeZone;

    fn task(id: i64, campaign_id: i64, status: TaskStatus) -> Task {
        Task {
            id,
            title: format!("Task {id}"),
            description: None,
            status,
            campaign_id,
            campaign_name: None,
            assigned_to_team_member_id: None,
            due_date: None,
            priority: TaskPriority::Medium,
        }
    }

    fn decision(id: i64, task_id: i64, content: &str, minute: u32) -> Message {
        Message {
            id,
            subject: String::new(),
            content: content.to_string(),
            kind: MessageType::ClientToAdmin,
            status: MessageStatus::Unread,
            sender_user_id: Some(5),
            sender_name: None,
            sender_email: None,
            recipient_user_id: None,
            parent_message_id: None,
            related_entity_type: Some(RelatedEntityType::Task),
            related_entity_id: Some(task_id),
            created_at: Utc.with_ymd_and_hms(2026, 4, 2, 9, minute, 0).unwrap(),
            replies: Vec::new(),
        }
    }

    #[test]
    fn only_completed_tasks_get_approvals() {
        let tasks = vec![task(1, 1, TaskStatus::Completed), task(2, 1, TaskStatus::InProgress)];
        let approvals = derive_approvals(&tasks, &[]);
        assert_eq!(approvals.len(), 1);
        assert_eq!(approvals[0].status, ApprovalStatus::Pending);
    }

    #[test]
    fn newest_decision_wins() {
        let tasks = vec![task(1, 1, TaskStatus::Completed)];
        let messages = vec![
            decision(20, 1, "[approved] looks great", 30),
            decision(10, 1, "[REJECTED] wrong colours", 10),
        ];
        let approvals = derive_approvals(&tasks, &messages);
        assert_eq!(approvals[0].status, ApprovalStatus::Approved);
        assert_eq!(approvals[0].note.as_deref(), Some("looks great"));
    }

    #[test]
    fn plain_messages_and_admin_messages_do_not_decide() {
        let mut from_admin = decision(3, 1, "[APPROVED]", 5);
        from_admin.kind = MessageType::AdminToClient;
        let chatter = decision(4, 1, "can we approve this tomorrow?", 6);
        assert!(decision_of(&from_admin).is_none());
        assert!(decision_of(&chatter).is_none());
        let approvals = derive_approvals(&[task(1, 1, TaskStatus::Completed)], &[from_admin, chatter]);
        assert_eq!(approvals[0].status, ApprovalStatus::Pending);
    }

    #[test]
    fn campaign_needs_every_approval() {
        let tasks = vec![
            task(1, 7, TaskStatus::Completed),
            task(2, 7, TaskStatus::Completed),
            task(3, 8, TaskStatus::Completed),
        ];
        let messages = vec![decision(1, 1, "[APPROVED]", 1), decision(2, 3, "[APPROVED]", 2)];
        let approvals = derive_approvals(&tasks, &messages);
        assert!(!campaign_fully_approved(7, &approvals));
        assert!(campaign_fully_approved(8, &approvals));
        assert!(!campaign_fully_approved(9, &approvals));
        assert_eq!(summarize(&approvals), ApprovalSummary { pending: 1, approved: 2, rejected: 0 });
    }

    #[test]
    fn approval_request_round_trips_through_decision_of() {
        let t = task(4, 2, TaskStatus::Completed);
        let draft = approval_request(&t, ApprovalStatus::Rejected, Some("  needs logo ")).unwrap();
        assert_eq!(draft.content, "[REJECTED] needs logo");
        assert_eq!(draft.related_entity_id, Some(4));
        assert!(approval_request(&t, ApprovalStatus::Pending, None).is_none());

        let mut sent = decision(9, 4, &draft.content, 0);
        sent.kind = draft.kind;
        assert_eq!(
            decision_of(&sent),
            Some((ApprovalStatus::Rejected, Some("needs logo".to_string())))
        );
    }
}
