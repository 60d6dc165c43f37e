use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use serde::Serialize;
use std::io;
use std::path::PathBuf;

use crate::api::Resource;
use crate::api::client::{ApiClient, ListQuery};
use crate::api::models::{
    Campaign, Client, Invoice, Message, MessageDraft, MessageStatus, MessageType, Payment,
    ProfileUpdate, RelatedEntityType, Service, Task, TaskStatus, TeamMember, User, UserInfo,
    UserRole, labels_match,
};
use crate::app::SessionContext;
use crate::approvals::{self, ApprovalStatus};
use crate::error::{AppError, AppResult};
use crate::storage::Preferences;
use crate::threads;
use crate::ui::dashboard::{self, AdminOverview};
use crate::ui::table::{self, TableRow};
use crate::ui::{login, thread_view};
use crate::utils::block_on;
use crate::views::{
    CampaignStats, InvoiceStats, Searchable, Sortable, TaskStats, filter_and_sort,
    invoice_display_status,
};

#[derive(Parser)]
#[command(name = "agency-desk")]
#[command(about = "Campaigns, tasks, invoices and client messaging for the agency backend")]
pub struct AgencyCli {
    /// Backend base URL; overrides AGENCY_DESK_API_URL and the saved session
    #[arg(long, global = true)]
    pub api_url: Option<String>,
    /// Session file to use instead of the one in the config directory
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and sign in with it
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        role: Option<UserRole>,
    },
    /// Forget the saved token
    Logout,
    /// Show who is signed in
    Whoami {
        /// Ask the backend instead of trusting the saved session
        #[arg(long)]
        refresh: bool,
    },
    /// Update your own name or email
    Profile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    Campaigns(CrudArgs),
    Tasks(CrudArgs),
    Clients(CrudArgs),
    Services(CrudArgs),
    Invoices(CrudArgs),
    Payments(CrudArgs),
    Users(CrudArgs),
    Team(CrudArgs),
    Messages(MessagesArgs),
    Approvals(ApprovalsArgs),
    /// Active services grouped by category
    Pricing,
    /// Summary for the signed-in user
    Dashboard,
    /// Locally stored preference blobs
    Prefs(PrefsArgs),
}

#[derive(Args)]
pub struct CrudArgs {
    #[command(subcommand)]
    pub command: CrudCommand,
}

#[derive(Subcommand)]
pub enum CrudCommand {
    List(ListArgs),
    Show { id: i64 },
    /// Create from a JSON body (`--data '{...}'` or `--data @file.json`)
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: i64,
        #[arg(long)]
        data: String,
    },
    Delete { id: i64 },
}

#[derive(Args, Default, Clone)]
pub struct ListArgs {
    #[arg(long)]
    pub search: Option<String>,
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub desc: bool,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub campaign: Option<i64>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct MessagesArgs {
    #[command(subcommand)]
    pub command: MessagesCommand,
}

#[derive(Subcommand)]
pub enum MessagesCommand {
    /// Conversations, newest first
    Threads {
        /// Only threads carrying this message type or its answer
        #[arg(long = "type")]
        kind: Option<MessageType>,
        /// Only messages you sent or received
        #[arg(long)]
        mine: bool,
        /// Only messages about this task
        #[arg(long)]
        task: Option<i64>,
        #[arg(long, default_value_t = 80)]
        width: usize,
    },
    List(ListArgs),
    Show { id: i64 },
    Send {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        content: String,
        #[arg(long = "type")]
        kind: Option<MessageType>,
        #[arg(long)]
        to: Option<i64>,
        #[arg(long, conflicts_with = "task")]
        campaign: Option<i64>,
        #[arg(long)]
        task: Option<i64>,
    },
    Reply {
        parent: i64,
        #[arg(long)]
        content: String,
    },
    Status { id: i64, status: MessageStatus },
    Delete { id: i64 },
}

#[derive(Args)]
pub struct ApprovalsArgs {
    #[command(subcommand)]
    pub command: ApprovalsCommand,
}

#[derive(Subcommand)]
pub enum ApprovalsCommand {
    List {
        #[arg(long)]
        campaign: Option<i64>,
    },
    Approve {
        task: i64,
        #[arg(long)]
        note: Option<String>,
    },
    Reject {
        task: i64,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Args)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub command: PrefsCommand,
}

#[derive(Subcommand)]
pub enum PrefsCommand {
    List,
    Get { key: String },
    /// Store a JSON value under `key`
    Set { key: String, value: String },
    Clear { key: String },
}

/// A resource that can be shown on a list page.
trait Listing: Resource + TableRow + Searchable + Sortable + Serialize {
    fn status_label(&self) -> Option<&'static str> {
        None
    }

    fn campaign(&self) -> Option<i64> {
        None
    }
}

impl Listing for Campaign {
    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }

    fn campaign(&self) -> Option<i64> {
        Some(self.id)
    }
}

impl Listing for Task {
    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }

    fn campaign(&self) -> Option<i64> {
        Some(self.campaign_id)
    }
}

impl Listing for Invoice {
    // Filter on what the table shows, so `--status overdue` works.
    fn status_label(&self) -> Option<&'static str> {
        Some(invoice_display_status(self, chrono::Utc::now().date_naive()).as_str())
    }

    fn campaign(&self) -> Option<i64> {
        Some(self.campaign_id)
    }
}

impl Listing for Message {
    fn status_label(&self) -> Option<&'static str> {
        Some(self.status.as_str())
    }

    fn campaign(&self) -> Option<i64> {
        if self.related_entity_type == Some(RelatedEntityType::Campaign) {
            self.related_entity_id
        } else {
            None
        }
    }
}

impl Listing for Client {}
impl Listing for Service {}
impl Listing for Payment {}
impl Listing for TeamMember {}

impl Listing for User {
    fn status_label(&self) -> Option<&'static str> {
        Some(if self.is_active { "Active" } else { "Inactive" })
    }
}

impl Commands {
    /// Signing out and local preferences work without a backend URL.
    fn needs_backend(&self) -> bool {
        !matches!(self, Commands::Logout | Commands::Prefs(_))
    }
}

pub fn run() -> AppResult<()> {
    let cli = AgencyCli::parse();
    let output = block_on(execute(cli))?;
    print!("{output}");
    Ok(())
}

/// Run one command and return the page it renders.
pub async fn execute(cli: AgencyCli) -> AppResult<String> {
    let mut session = SessionContext::load(cli.session.clone());
    let mut auth_events = session.subscribe();

    if cli.command.needs_backend() {
        session.resolve_base_url(cli.api_url.as_deref())?;
    }
    let output = dispatch(&mut session, cli.command).await?;

    while let Ok(event) = auth_events.try_recv() {
        match event.user() {
            Some(user) => info!("session now belongs to {} ({})", user.email, user.role),
            None => info!("session cleared"),
        }
    }
    Ok(output)
}

async fn dispatch(session: &mut SessionContext, command: Commands) -> AppResult<String> {
    let page_size = session.state().page_size;
    match command {
        Commands::Login { email, password } => {
            let req = login::read_credentials(&mut io::stdin().lock(), email, password)?;
            let auth = session.anonymous_client()?.login(&req).await?;
            session.sign_in(auth)?;
            Ok(signed_in_line(session.user()))
        }
        Commands::Register { email, first_name, last_name, password, role } => {
            let req = login::registration(&mut io::stdin().lock(), email, first_name, last_name, password, role)?;
            let auth = session.anonymous_client()?.register(&req).await?;
            session.sign_in(auth)?;
            Ok(signed_in_line(session.user()))
        }
        Commands::Logout => {
            session.clear()?;
            Ok("Signed out.\n".to_string())
        }
        Commands::Whoami { refresh } => {
            if refresh {
                let user = session.client()?.me().await?;
                session.update_profile(user)?;
            }
            Ok(signed_in_line(session.user()))
        }
        Commands::Profile { first_name, last_name, email } => {
            if let Some(email) = email.as_deref() {
                login::validate_email(email)?;
            }
            let update = ProfileUpdate { first_name, last_name, email };
            let client = session.client()?;
            let user = match client.update_profile(&update).await? {
                Some(user) => user,
                None => client.me().await?,
            };
            session.update_profile(user)?;
            Ok(signed_in_line(session.user()))
        }
        Commands::Campaigns(args) => crud::<Campaign>(&session.client()?, page_size, args.command).await,
        Commands::Tasks(args) => crud::<Task>(&session.client()?, page_size, args.command).await,
        Commands::Clients(args) => crud::<Client>(&session.client()?, page_size, args.command).await,
        Commands::Services(args) => crud::<Service>(&session.client()?, page_size, args.command).await,
        Commands::Invoices(args) => crud::<Invoice>(&session.client()?, page_size, args.command).await,
        Commands::Payments(args) => crud::<Payment>(&session.client()?, page_size, args.command).await,
        Commands::Users(args) => crud::<User>(&session.client()?, page_size, args.command).await,
        Commands::Team(args) => crud::<TeamMember>(&session.client()?, page_size, args.command).await,
        Commands::Messages(args) => messages(session, page_size, args.command).await,
        Commands::Approvals(args) => approvals_page(session, page_size, args.command).await,
        Commands::Pricing => {
            let services = session.client()?.list::<Service>(&ListQuery::with_page_size(page_size)).await?;
            Ok(dashboard::render_pricing(&services.items))
        }
        Commands::Dashboard => dashboard_page(session, page_size).await,
        Commands::Prefs(args) => prefs(args.command),
    }
}

fn signed_in_line(user: Option<&UserInfo>) -> String {
    match user {
        Some(user) => format!("Signed in as {} <{}> ({})\n", user.display_name(), user.email, user.role),
        None => "Not signed in.\n".to_string(),
    }
}

fn parse_data<T: serde::de::DeserializeOwned>(raw: &str) -> AppResult<T> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).map_err(|e| AppError::Validation(format!("invalid record: {e}")))
}

async fn fetch_listing<R: Listing>(client: &ApiClient, page_size: u32, args: &ListArgs) -> AppResult<Vec<R>> {
    if let Some(field) = args.sort.as_deref() {
        if !R::SORT_FIELDS.contains(&field.to_lowercase().as_str()) {
            return Err(AppError::Validation(format!(
                "cannot sort {}s by {field}; use one of: {}",
                R::LABEL,
                R::SORT_FIELDS.join(", ")
            )));
        }
    }
    let page = client.list::<R>(&ListQuery::with_page_size(page_size)).await?;
    debug!("fetched {} of {} {}s", page.items.len(), page.total_count, R::LABEL);
    let mut items = page.items;
    if let Some(status) = args.status.as_deref() {
        items.retain(|i| i.status_label().is_some_and(|label| labels_match(label, status)));
    }
    if let Some(campaign) = args.campaign {
        items.retain(|i| i.campaign() == Some(campaign));
    }
    Ok(filter_and_sort(items, args.search.as_deref(), args.sort.as_deref(), args.desc))
}

fn render_listing<R: Listing>(items: &[R], json: bool) -> AppResult<String> {
    if json {
        let mut out = serde_json::to_string_pretty(items)?;
        out.push('\n');
        Ok(out)
    } else {
        Ok(table::render(items))
    }
}

async fn crud<R: Listing>(client: &ApiClient, page_size: u32, command: CrudCommand) -> AppResult<String> {
    let notice = match command {
        CrudCommand::List(args) => {
            let items: Vec<R> = fetch_listing(client, page_size, &args).await?;
            return render_listing(&items, args.json);
        }
        CrudCommand::Show { id } => {
            let record: R = client.get(id).await?;
            let mut out = serde_json::to_string_pretty(&record)?;
            out.push('\n');
            return Ok(out);
        }
        CrudCommand::Create { data } => {
            let draft: R::Draft = parse_data(&data)?;
            match client.create::<R>(&draft).await? {
                Some(created) => format!("Created {} #{}.", R::LABEL, created.id()),
                None => format!("Created {}.", R::LABEL),
            }
        }
        CrudCommand::Update { id, data } => {
            let draft: R::Draft = parse_data(&data)?;
            client.update::<R>(id, &draft).await?;
            format!("Updated {} #{id}.", R::LABEL)
        }
        CrudCommand::Delete { id } => {
            client.delete::<R>(id).await?;
            format!("Deleted {} #{id}.", R::LABEL)
        }
    };
    // Every mutation is followed by a full reload of the collection.
    let items: Vec<R> = fetch_listing(client, page_size, &ListArgs::default()).await?;
    Ok(format!("{notice}\n\n{}", render_listing(&items, false)?))
}

/// Which message type a viewer's conversation page is built around.
pub fn default_thread_type(role: UserRole) -> MessageType {
    match role {
        UserRole::TeamMember => MessageType::TeamToAdmin,
        _ => MessageType::ClientToAdmin,
    }
}

/// The type a reply carries, given who writes it and what it answers.
pub fn reply_type(role: UserRole, parent: MessageType) -> MessageType {
    match role {
        UserRole::Admin => match parent {
            MessageType::TeamToAdmin | MessageType::AdminToTeam => MessageType::AdminToTeam,
            _ => MessageType::AdminToClient,
        },
        UserRole::TeamMember => MessageType::TeamToAdmin,
        UserRole::Client | UserRole::Unknown => MessageType::ClientToAdmin,
    }
}

fn current_user(session: &SessionContext) -> AppResult<&UserInfo> {
    session
        .user()
        .ok_or_else(|| AppError::Validation("Sign in first: agency-desk login".into()))
}

async fn thread_page(
    client: &ApiClient,
    kind: MessageType,
    only: Option<MessageType>,
    viewer: Option<i64>,
    task: Option<i64>,
    width: usize,
) -> AppResult<String> {
    let mut messages = client.conversation_messages(kind).await?;
    if let Some(user_id) = viewer {
        messages = threads::concerning(messages, user_id);
    }
    let mut threads = threads::assemble_threads(messages);
    if let Some(only) = only {
        threads.retain(|t| t.involves(only));
    }
    if let Some(task_id) = task {
        threads.retain(|t| t.root.is_related_to(RelatedEntityType::Task, task_id));
    }
    Ok(thread_view::render_threads(&threads, width))
}

async fn messages(session: &SessionContext, page_size: u32, command: MessagesCommand) -> AppResult<String> {
    let client = session.client()?;
    let user = current_user(session)?;
    match command {
        MessagesCommand::Threads { kind, mine, task, width } => {
            let only = kind;
            let kind = kind.unwrap_or_else(|| default_thread_type(user.role));
            let viewer = mine.then_some(user.id);
            thread_page(&client, kind, only, viewer, task, width).await
        }
        MessagesCommand::List(args) => {
            let items: Vec<Message> = fetch_listing(&client, page_size, &args).await?;
            render_listing(&items, args.json)
        }
        MessagesCommand::Show { id } => {
            let msg: Message = client.get(id).await?;
            if msg.status == MessageStatus::Unread && msg.recipient_user_id == Some(user.id) {
                client.set_message_status(id, MessageStatus::Read).await?;
            }
            let mut out = serde_json::to_string_pretty(&msg)?;
            out.push('\n');
            Ok(out)
        }
        MessagesCommand::Send { subject, content, kind, to, campaign, task } => {
            if subject.trim().is_empty() || content.trim().is_empty() {
                return Err(AppError::Validation("Subject and message are required.".into()));
            }
            let kind = kind.unwrap_or_else(|| reply_type(user.role, MessageType::ContactForm));
            let (related_entity_type, related_entity_id) = match (campaign, task) {
                (Some(id), _) => (Some(RelatedEntityType::Campaign), Some(id)),
                (_, Some(id)) => (Some(RelatedEntityType::Task), Some(id)),
                _ => (None, None),
            };
            let draft = MessageDraft {
                subject,
                content,
                kind,
                recipient_user_id: to,
                parent_message_id: None,
                related_entity_type,
                related_entity_id,
            };
            client.create::<Message>(&draft).await?;
            let page = thread_page(&client, default_thread_type(user.role), None, None, None, 80).await?;
            Ok(format!("Message sent.\n\n{page}"))
        }
        MessagesCommand::Reply { parent, content } => {
            if content.trim().is_empty() {
                return Err(AppError::Validation("Reply cannot be empty.".into()));
            }
            let parent_msg: Message = client.get(parent).await?;
            // Replies hang off the thread root, never off another reply.
            let root_id = parent_msg.parent_message_id.unwrap_or(parent_msg.id);
            let subject = if parent_msg.subject.starts_with("Re: ") {
                parent_msg.subject.clone()
            } else {
                format!("Re: {}", parent_msg.subject)
            };
            let recipient = parent_msg.sender_user_id.filter(|id| *id != user.id);
            let draft = MessageDraft {
                subject,
                content,
                kind: reply_type(user.role, parent_msg.kind),
                recipient_user_id: recipient,
                parent_message_id: Some(root_id),
                related_entity_type: parent_msg.related_entity_type,
                related_entity_id: parent_msg.related_entity_id,
            };
            client.create::<Message>(&draft).await?;
            if user.is_admin() && parent_msg.status != MessageStatus::Replied {
                client.set_message_status(parent_msg.id, MessageStatus::Replied).await?;
            }
            let page = thread_page(&client, default_thread_type(user.role), None, None, None, 80).await?;
            Ok(format!("Reply sent.\n\n{page}"))
        }
        MessagesCommand::Status { id, status } => {
            client.set_message_status(id, status).await?;
            let items: Vec<Message> = fetch_listing(&client, page_size, &ListArgs::default()).await?;
            Ok(format!("Message #{id} marked {status}.\n\n{}", table::render(&items)))
        }
        MessagesCommand::Delete { id } => {
            client.delete::<Message>(id).await?;
            let items: Vec<Message> = fetch_listing(&client, page_size, &ListArgs::default()).await?;
            Ok(format!("Deleted message #{id}.\n\n{}", table::render(&items)))
        }
    }
}

async fn load_approvals(client: &ApiClient, page_size: u32) -> AppResult<Vec<approvals::Approval>> {
    let query = ListQuery::with_page_size(page_size);
    let (tasks, messages) = tokio::try_join!(
        client.list::<Task>(&query),
        client.conversation_messages(MessageType::ClientToAdmin)
    )?;
    Ok(approvals::derive_approvals(&tasks.items, &messages))
}

async fn approvals_page(session: &SessionContext, page_size: u32, command: ApprovalsCommand) -> AppResult<String> {
    let client = session.client()?;
    let (task_id, decision, note) = match command {
        ApprovalsCommand::List { campaign } => {
            let mut list = load_approvals(&client, page_size).await?;
            if let Some(id) = campaign {
                list.retain(|a| a.campaign_id == id);
            }
            return Ok(dashboard::render_approvals(&list));
        }
        ApprovalsCommand::Approve { task, note } => (task, ApprovalStatus::Approved, note),
        ApprovalsCommand::Reject { task, note } => (task, ApprovalStatus::Rejected, note),
    };

    // A sign-off is the client's decision; staff cannot record one for them.
    if current_user(session)?.role != UserRole::Client {
        return Err(AppError::Validation(
            "Only the client who owns the campaign can approve or reject its tasks.".into(),
        ));
    }

    let task: Task = client.get(task_id).await?;
    if task.status != TaskStatus::Completed {
        return Err(AppError::Validation(format!(
            "Task #{} is {}; only completed tasks can be signed off.",
            task.id, task.status
        )));
    }
    let Some(draft) = approvals::approval_request(&task, decision, note.as_deref()) else {
        return Err(AppError::Validation("nothing to record".into()));
    };
    client.create::<Message>(&draft).await?;

    let mut list = load_approvals(&client, page_size).await?;
    list.retain(|a| a.campaign_id == task.campaign_id);
    let mut out = format!("Task #{} {}.\n", task.id, decision.as_str().to_lowercase());
    if approvals::campaign_fully_approved(task.campaign_id, &list) {
        out.push_str("Every completed task in this campaign is now approved.\n");
    }
    out.push('\n');
    out.push_str(&dashboard::render_approvals(&list));
    Ok(out)
}

async fn dashboard_page(session: &SessionContext, page_size: u32) -> AppResult<String> {
    let client = session.client()?;
    let user = current_user(session)?;
    let query = ListQuery::with_page_size(page_size);

    if user.role == UserRole::Client {
        let (campaigns, tasks, messages) = tokio::try_join!(
            client.list::<Campaign>(&query),
            client.list::<Task>(&query),
            client.conversation_messages(MessageType::ClientToAdmin)
        )?;
        let mut campaigns = campaigns.items;
        if let Some(client_id) = user.client_id {
            campaigns.retain(|c| c.client_id == Some(client_id));
        }
        let ids: Vec<i64> = campaigns.iter().map(|c| c.id).collect();
        let tasks: Vec<Task> = tasks.items.into_iter().filter(|t| ids.contains(&t.campaign_id)).collect();
        let approvals = approvals::derive_approvals(&tasks, &messages);
        return Ok(dashboard::render_client(&campaigns, &approvals));
    }

    let (campaigns, tasks, invoices, messages) = tokio::try_join!(
        client.list::<Campaign>(&query),
        client.list::<Task>(&query),
        client.list::<Invoice>(&query),
        client.conversation_messages(default_thread_type(user.role))
    )?;
    let now = chrono::Utc::now();
    let threads = threads::assemble_threads(messages);
    let recent = filter_and_sort(campaigns.items.clone(), None, Some("startdate"), true);
    let recent = &recent[..recent.len().min(5)];
    let overview = AdminOverview {
        campaigns: CampaignStats::from_campaigns(&campaigns.items),
        tasks: TaskStats::from_tasks(&tasks.items, now),
        invoices: InvoiceStats::from_invoices(&invoices.items, now.date_naive()),
        unread_threads: threads.iter().filter(|t| t.unread_count() > 0).count(),
        recent,
    };
    Ok(dashboard::render_admin(&overview))
}

fn prefs(command: PrefsCommand) -> AppResult<String> {
    let store = Preferences::open_default()?;
    match command {
        PrefsCommand::List => {
            let keys = store.keys()?;
            if keys.is_empty() {
                return Ok("No preferences stored.\n".to_string());
            }
            Ok(keys.into_iter().map(|k| k + "\n").collect())
        }
        PrefsCommand::Get { key } => match store.get_raw(&key)? {
            Some(value) => Ok(format!("{}\n", serde_json::to_string_pretty(&value)?)),
            None => Ok(format!("{key} is not set.\n")),
        },
        PrefsCommand::Set { key, value } => {
            let value: serde_json::Value = parse_data(&value)?;
            store.put(&key, &value)?;
            Ok(format!("Saved {key}.\n"))
        }
        PrefsCommand::Clear { key } => {
            if store.remove(&key)? {
                Ok(format!("Cleared {key}.\n"))
            } else {
                Ok(format!("{key} was not set.\n"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn cli_requires_subcommand() {
        let err = match AgencyCli::try_parse_from(["agency-desk"]) {
            Ok(_) => panic!("expected missing subcommand parse error"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand);
    }

    #[test]
    fn local_commands_skip_url_resolution() {
        let parsed = |args: &[&str]| AgencyCli::try_parse_from(args.iter().copied()).unwrap().command;
        assert!(!parsed(&["agency-desk", "logout"]).needs_backend());
        assert!(!parsed(&["agency-desk", "prefs", "list"]).needs_backend());
        assert!(parsed(&["agency-desk", "whoami"]).needs_backend());
    }

    #[test]
    fn list_flags_parse() {
        let cli = AgencyCli::try_parse_from([
            "agency-desk", "--api-url", "agency.test", "campaigns", "list", "--search", "spring", "--sort", "budget", "--desc",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("agency.test"));
        match cli.command {
            Commands::Campaigns(CrudArgs { command: CrudCommand::List(args) }) => {
                assert_eq!(args.search.as_deref(), Some("spring"));
                assert_eq!(args.sort.as_deref(), Some("budget"));
                assert!(args.desc);
            }
            _ => panic!("expected campaigns list"),
        }
    }

    #[test]
    fn message_enums_parse_from_flags() {
        let cli = AgencyCli::try_parse_from(["agency-desk", "messages", "threads", "--type", "admin-to-client"]).unwrap();
        match cli.command {
            Commands::Messages(MessagesArgs { command: MessagesCommand::Threads { kind, .. } }) => {
                assert_eq!(kind, Some(MessageType::AdminToClient));
            }
            _ => panic!("expected messages threads"),
        }
        assert!(AgencyCli::try_parse_from(["agency-desk", "messages", "status", "4", "shouted"]).is_err());
    }

    #[test]
    fn reply_types_follow_the_writer() {
        assert_eq!(reply_type(UserRole::Admin, MessageType::ClientToAdmin), MessageType::AdminToClient);
        assert_eq!(reply_type(UserRole::Admin, MessageType::TeamToAdmin), MessageType::AdminToTeam);
        assert_eq!(reply_type(UserRole::Client, MessageType::AdminToClient), MessageType::ClientToAdmin);
        assert_eq!(reply_type(UserRole::TeamMember, MessageType::AdminToTeam), MessageType::TeamToAdmin);
        assert_eq!(default_thread_type(UserRole::TeamMember), MessageType::TeamToAdmin);
    }

    #[test]
    fn parse_data_reports_bad_records() {
        let err = parse_data::<crate::api::models::ServiceDraft>(r#"{"name": "SEO"}"#);
        assert!(matches!(err, Err(AppError::Validation(m)) if m.contains("basePrice")));
        let ok = parse_data::<crate::api::models::ServiceDraft>(r#"{"name": "SEO", "basePrice": 10}"#).unwrap();
        assert!(ok.is_active);
    }
}
