pub mod client;
pub mod events;
pub mod models;
pub mod timestamp;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::api::models::*;

/// A backend collection reachable at `/api/<PATH>` with the usual
/// list/get/create/update/delete endpoints.
pub trait Resource: DeserializeOwned + Send + 'static {
    const PATH: &'static str;
    const LABEL: &'static str;
    type Draft: Serialize + DeserializeOwned + Send + Sync;

    fn id(&self) -> i64;
}

macro_rules! resource {
    ($ty:ty, $draft:ty, $path:literal, $label:literal) => {
        impl Resource for $ty {
            const PATH: &'static str = $path;
            const LABEL: &'static str = $label;
            type Draft = $draft;

            fn id(&self) -> i64 {
                self.id
            }
        }
    };
}

resource!(Campaign, CampaignDraft, "campaigns", "campaign");
resource!(Task, TaskDraft, "tasks", "task");
resource!(Client, ClientDraft, "clients", "client");
resource!(Service, ServiceDraft, "services", "service");
resource!(User, UserDraft, "users", "user");
resource!(TeamMember, TeamMemberDraft, "teammembers", "team member");
resource!(Invoice, InvoiceDraft, "invoices", "invoice");
resource!(Payment, PaymentDraft, "payments", "payment");
resource!(Message, MessageDraft, "messages", "message");
