//! Conversation threads assembled from flat message lists.
//!
//! The backend answers message queries with a mix of shapes: some roots carry
//! their replies nested, some replies come back as flat entries pointing at
//! their parent, and overlapping queries return the same message twice.
//! [`assemble_threads`] folds all of that into one thread per root.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::warn;

use crate::api::models::{Message, MessageStatus, MessageType};

#[derive(Debug, Clone)]
pub struct Thread {
    pub root: Message,
    pub replies: Vec<Message>,
}

impl Thread {
    pub fn latest_activity(&self) -> DateTime<Utc> {
        self.replies
            .last()
            .map(|r| r.created_at.max(self.root.created_at))
            .unwrap_or(self.root.created_at)
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        std::iter::once(&self.root).chain(self.replies.iter())
    }

    pub fn unread_count(&self) -> usize {
        self.messages().filter(|m| m.status == MessageStatus::Unread).count()
    }

    /// True when any message in the thread is `kind` or its counterpart.
    pub fn involves(&self, kind: MessageType) -> bool {
        let answer = kind.counterpart();
        self.messages().any(|m| m.kind == kind || m.kind == answer)
    }

    pub fn participants(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.messages()
            .filter_map(|m| m.sender_name.clone().or_else(|| m.sender_email.clone()))
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }
}

/// Merge overlapping query results. Later copies of an id replace earlier
/// ones in place, so the first-seen position is kept.
pub fn merge_messages<I>(batches: I) -> Vec<Message>
where
    I: IntoIterator<Item = Vec<Message>>,
{
    let mut out: Vec<Message> = Vec::new();
    let mut index: HashMap<i64, usize> = HashMap::new();
    for msg in batches.into_iter().flatten() {
        match index.get(&msg.id) {
            Some(&slot) => out[slot] = msg,
            None => {
                index.insert(msg.id, out.len());
                out.push(msg);
            }
        }
    }
    out
}

/// Messages sent by or addressed to `user_id`.
pub fn concerning(messages: Vec<Message>, user_id: i64) -> Vec<Message> {
    messages
        .into_iter()
        .filter(|m| m.sender_user_id == Some(user_id) || m.recipient_user_id == Some(user_id))
        .collect()
}

pub fn assemble_threads(messages: Vec<Message>) -> Vec<Thread> {
    // Pass 1: arena of distinct messages. Flat entries win over nested copies.
    let mut arena: Vec<Option<Message>> = Vec::with_capacity(messages.len());
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut nested: Vec<Message> = Vec::new();

    for mut msg in messages {
        for mut reply in std::mem::take(&mut msg.replies) {
            reply.parent_message_id.get_or_insert(msg.id);
            nested.push(reply);
        }
        match index.get(&msg.id) {
            Some(&slot) => arena[slot] = Some(msg),
            None => {
                index.insert(msg.id, arena.len());
                arena.push(Some(msg));
            }
        }
    }
    for mut reply in nested {
        // Replies of replies are flattened into the same thread.
        let parent = reply.id;
        for mut inner in std::mem::take(&mut reply.replies) {
            inner.parent_message_id.get_or_insert(parent);
            if !index.contains_key(&inner.id) {
                index.insert(inner.id, arena.len());
                arena.push(Some(inner));
            }
        }
        if !index.contains_key(&reply.id) {
            index.insert(reply.id, arena.len());
            arena.push(Some(reply));
        }
    }

    let parents: Vec<Option<i64>> = arena
        .iter()
        .map(|m| m.as_ref().and_then(|m| m.parent_message_id))
        .collect();

    // Pass 2: resolve every entry to its root slot and bucket replies.
    let mut roots: Vec<usize> = Vec::new();
    let mut buckets: HashMap<usize, Vec<usize>> = HashMap::new();
    for slot in 0..arena.len() {
        match resolve_root(slot, &parents, &index) {
            Some(root) if root == slot => roots.push(slot),
            Some(root) => buckets.entry(root).or_default().push(slot),
            None => {
                if let Some(m) = &arena[slot] {
                    warn!("dropping message {} whose parent chain is not loaded", m.id);
                }
            }
        }
    }

    let mut threads: Vec<Thread> = roots
        .into_iter()
        .filter_map(|root_slot| {
            let root = arena[root_slot].take()?;
            let mut replies: Vec<Message> = buckets
                .remove(&root_slot)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|slot| arena[slot].take())
                .collect();
            replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Some(Thread { root, replies })
        })
        .collect();

    threads.sort_by(|a, b| {
        b.root
            .created_at
            .cmp(&a.root.created_at)
            .then(b.root.id.cmp(&a.root.id))
    });
    threads
}

/// Follow parent links up to a root. `None` when a link points outside the
/// loaded set or the chain loops.
fn resolve_root(start: usize, parents: &[Option<i64>], index: &HashMap<i64, usize>) -> Option<usize> {
    let mut current = start;
    let mut visited = HashSet::new();
    loop {
        if !visited.insert(current) {
            return None;
        }
        match parents[current] {
            None => return Some(current),
            Some(parent_id) => current = *index.get(&parent_id)?,
        }
    }
}
