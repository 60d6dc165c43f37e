use std::fmt::Write as _;

use crate::api::models::{Message, MessageStatus};
use crate::threads::Thread;
use crate::utils::truncate;

fn sender(m: &Message) -> &str {
    m.sender_name
        .as_deref()
        .or(m.sender_email.as_deref())
        .unwrap_or("Unknown sender")
}

fn marker(m: &Message) -> &'static str {
    if m.status == MessageStatus::Unread { "*" } else { " " }
}

/// One block per thread: the root on the header line, replies indented below.
pub fn render_threads(threads: &[Thread], preview: usize) -> String {
    if threads.is_empty() {
        return "No conversations yet.\n".to_string();
    }
    let mut out = String::new();
    for thread in threads {
        let root = &thread.root;
        let unread = thread.unread_count();
        let _ = write!(
            out,
            "#{} {} [{}]",
            root.id,
            if root.subject.is_empty() { "(no subject)" } else { root.subject.as_str() },
            root.kind
        );
        if unread > 0 {
            let _ = write!(out, " {} unread", unread);
        }
        let _ = writeln!(out, "  last activity {}", thread.latest_activity().format("%Y-%m-%d %H:%M"));
        let _ = writeln!(
            out,
            "{} {} ({}): {}",
            marker(root),
            sender(root),
            root.created_at.format("%Y-%m-%d %H:%M"),
            truncate(&root.content, preview)
        );
        for reply in &thread.replies {
            let _ = writeln!(
                out,
                "{}   ↳ {} ({}): {}",
                marker(reply),
                sender(reply),
                reply.created_at.format("%Y-%m-%d %H:%M"),
                truncate(&reply.content, preview)
            );
        }
        out.push('\n');
    }
    out
}
