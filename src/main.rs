
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use classhub::App;
use classhub::config::{AppConfig, UploadRejected};
use classhub::net::error::ApiError;
use classhub::net::http::Query;
use classhub::net::types::{
    ActivityDraft, ActivityPatch, CommentDraft, Credentials, MediaType, MediaUpload, ProfileUpdate, RegisterRequest,
};
use classhub::notify::TracingNotifier;
use classhub::router::{NavigationError, Route};
use classhub::router::history::History;
use classhub::storage::FileStorage;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("no storage path; pass --storage, set CLASSHUB_STORAGE_PATH, or set HOME")]
    MissingStoragePath,
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Navigation(#[from] NavigationError),
    #[error("{0} failed")]
    Rejected(&'static str),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("page size {0} is not one of the allowed sizes")]
    PageSize(u32),
    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("upload rejected: {0}")]
    Upload(#[from] UploadRejected),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "classhub", about = "Class community client CLI", version)]
struct Cli {
    /// Backend API base URL; overrides `CLASSHUB_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// File holding the persisted session token.
    #[arg(long, env = "CLASSHUB_STORAGE_PATH")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        username: String,
        #[arg(long, env = "CLASSHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register(RegisterArgs),
    Logout,
    /// Restore the stored session and print the current user.
    Whoami,
    /// Run a guarded navigation and print where it lands.
    Open {
        path: String,
    },
    Users(UsersCommand),
    Activities(ActivitiesCommand),
    Media(MediaCommand),
    Comments(CommentsCommand),
    Notifications(NotificationsCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    full_name: String,
    #[arg(long, env = "CLASSHUB_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    student_id: Option<String>,
    #[command(flatten)]
    profile: ProfileArgs,
}

/// Optional profile fields shared by `register` and `users update`.
#[derive(Args, Debug, Default)]
struct ProfileArgs {
    #[arg(long)]
    bio: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    qq: Option<String>,
    #[arg(long)]
    wechat: Option<String>,
    #[arg(long)]
    dormitory: Option<String>,
    #[arg(long)]
    hometown: Option<String>,
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long)]
    skip: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
}

#[derive(Args, Debug)]
struct UsersCommand {
    #[command(subcommand)]
    command: UsersSubcommand,
}

#[derive(Subcommand, Debug)]
enum UsersSubcommand {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        id: i64,
    },
    /// Update the logged-in user's profile.
    Update {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    Stats,
}

#[derive(Args, Debug)]
struct ActivitiesCommand {
    #[command(subcommand)]
    command: ActivitiesSubcommand,
}

#[derive(Subcommand, Debug)]
enum ActivitiesSubcommand {
    List {
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        id: i64,
    },
    Create {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },
    Delete {
        id: i64,
    },
    Stats,
}

#[derive(Args, Debug)]
struct MediaCommand {
    #[command(subcommand)]
    command: MediaSubcommand,
}

#[derive(Subcommand, Debug)]
enum MediaSubcommand {
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        activity_id: Option<i64>,
        #[arg(long, value_parser = parse_media_type)]
        media_type: Option<MediaType>,
    },
    Get {
        id: i64,
    },
    Upload {
        activity_id: i64,
        file: PathBuf,
        /// Defaults to the file name without extension.
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: i64,
    },
    Stats,
}

#[derive(Args, Debug)]
struct CommentsCommand {
    #[command(subcommand)]
    command: CommentsSubcommand,
}

#[derive(Subcommand, Debug)]
enum CommentsSubcommand {
    List {
        media_id: i64,
        #[command(flatten)]
        page: PageArgs,
    },
    Get {
        id: i64,
    },
    Create {
        media_id: i64,
        content: String,
        /// Reply to this comment.
        #[arg(long)]
        parent_id: Option<i64>,
    },
    Delete {
        id: i64,
    },
}

#[derive(Args, Debug)]
struct NotificationsCommand {
    #[command(subcommand)]
    command: NotificationsSubcommand,
}

#[derive(Subcommand, Debug)]
enum NotificationsSubcommand {
    List {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, default_value_t = false)]
        unread_only: bool,
    },
    Read {
        id: i64,
    },
    ReadAll,
    Delete {
        id: i64,
    },
    Stats,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(base_url) = cli.base_url {
        config.api_base_url = base_url.trim_end_matches('/').to_owned();
    }
    let storage_path = match cli.storage {
        Some(path) => path,
        None => default_storage_path().ok_or(CliError::MissingStoragePath)?,
    };
    tracing::debug!(path = %storage_path.display(), "using session storage");

    let app = App::new(
        config,
        Arc::new(FileStorage::new(storage_path)),
        Arc::new(TracingNotifier),
        Arc::new(History::new(start_location(&cli.command))),
    )?;

    match cli.command {
        Command::Login { username, password } => run_login(&app, username, password).await,
        Command::Register(args) => run_register(&app, args).await,
        Command::Logout => run_logout(&app).await,
        Command::Whoami => run_whoami(&app).await,
        Command::Open { path } => run_open(&app, &path).await,
        Command::Users(users) => run_users(&app, users).await,
        Command::Activities(activities) => run_activities(&app, activities).await,
        Command::Media(media) => run_media(&app, media).await,
        Command::Comments(comments) => run_comments(&app, comments).await,
        Command::Notifications(notifications) => run_notifications(&app, notifications).await,
    }
}

/// Page the command acts from. Credential commands stand on their own form,
/// where a rejected login is not an expired session.
fn start_location(command: &Command) -> &'static str {
    match command {
        Command::Login { .. } => Route::Login.path(),
        Command::Register(_) => Route::Register.path(),
        _ => Route::Home.path(),
    }
}

fn default_storage_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").filter(|h| !h.is_empty())?;
    Some(PathBuf::from(home).join(".classhub").join("storage.json"))
}

// =============================================================================
// SESSION
// =============================================================================

async fn run_login(app: &App, username: String, password: String) -> Result<(), CliError> {
    if !app.auth.login(&Credentials { username, password }).await {
        return Err(CliError::Rejected("login"));
    }
    print_json(&app.auth.user())
}

async fn run_register(app: &App, args: RegisterArgs) -> Result<(), CliError> {
    let ProfileArgs { bio, phone, qq, wechat, dormitory, hometown } = args.profile;
    let request = RegisterRequest {
        username: args.username,
        email: args.email,
        full_name: args.full_name,
        password: args.password,
        student_id: args.student_id,
        bio,
        phone,
        qq,
        wechat,
        dormitory,
        hometown,
    };
    if !app.auth.register(&request).await {
        return Err(CliError::Rejected("registration"));
    }
    print_json(&json!({ "registered": request.username }))
}

async fn run_logout(app: &App) -> Result<(), CliError> {
    if app.auth.token().is_some() {
        if let Err(e) = app.api.auth().logout().await {
            tracing::debug!(error = %e, "backend logout failed; clearing local session anyway");
        }
    }
    app.auth.logout();
    Ok(())
}

async fn run_whoami(app: &App) -> Result<(), CliError> {
    if !app.auth.initialize_auth().await {
        return Err(CliError::NotLoggedIn);
    }
    print_json(&app.auth.user())
}

async fn run_open(app: &App, path: &str) -> Result<(), CliError> {
    let resolved = app.router.navigate(path).await?;
    print_json(&json!({
        "location": resolved.location,
        "route": resolved.route.map(|r| r.name()),
        "authenticated": app.auth.is_authenticated(),
    }))
}

// =============================================================================
// RESOURCES
// =============================================================================

async fn run_users(app: &App, users: UsersCommand) -> Result<(), CliError> {
    let api = app.api.users();
    match users.command {
        UsersSubcommand::List { page } => print_json(&api.list(&page_query(app, &page)?).await?),
        UsersSubcommand::Get { id } => print_json(&api.get(id).await?),
        UsersSubcommand::Update { full_name, avatar_url, profile } => {
            let ProfileArgs { bio, phone, qq, wechat, dormitory, hometown } = profile;
            let update = ProfileUpdate { full_name, bio, phone, qq, wechat, dormitory, hometown, avatar_url };
            if !app.auth.update_profile(&update).await {
                return Err(CliError::Rejected("profile update"));
            }
            print_json(&app.auth.user())
        }
        UsersSubcommand::Stats => print_json(&api.stats().await?),
    }
}

async fn run_activities(app: &App, activities: ActivitiesCommand) -> Result<(), CliError> {
    let api = app.api.activities();
    match activities.command {
        ActivitiesSubcommand::List { page } => print_json(&api.list(&page_query(app, &page)?).await?),
        ActivitiesSubcommand::Get { id } => print_json(&api.get(id).await?),
        ActivitiesSubcommand::Create { title, description, date, location } => {
            let draft = ActivityDraft { title, description, activity_date: date, location };
            print_json(&api.create(&draft).await?)
        }
        ActivitiesSubcommand::Update { id, title, description, date, location } => {
            let patch = ActivityPatch { title, description, activity_date: date, location };
            print_json(&api.update(id, &patch).await?)
        }
        ActivitiesSubcommand::Delete { id } => print_json(&api.delete(id).await?),
        ActivitiesSubcommand::Stats => print_json(&api.stats().await?),
    }
}

async fn run_media(app: &App, media: MediaCommand) -> Result<(), CliError> {
    let api = app.api.media();
    match media.command {
        MediaSubcommand::List { page, activity_id, media_type } => {
            let mut query = page_query(app, &page)?;
            if let Some(activity_id) = activity_id {
                query.push("activity_id", activity_id);
            }
            if let Some(media_type) = media_type {
                query.push("media_type", media_type_name(media_type));
            }
            print_json(&api.list(&query).await?)
        }
        MediaSubcommand::Get { id } => print_json(&api.get(id).await?),
        MediaSubcommand::Upload { activity_id, file, title, description } => {
            let upload = read_upload(app, activity_id, &file, title, description).await?;
            print_json(&api.upload(upload).await?)
        }
        MediaSubcommand::Delete { id } => print_json(&api.delete(id).await?),
        MediaSubcommand::Stats => print_json(&api.stats().await?),
    }
}

async fn run_comments(app: &App, comments: CommentsCommand) -> Result<(), CliError> {
    let api = app.api.comments();
    match comments.command {
        CommentsSubcommand::List { media_id, page } => {
            print_json(&api.list_for_media(media_id, &page_query(app, &page)?).await?)
        }
        CommentsSubcommand::Get { id } => print_json(&api.get(id).await?),
        CommentsSubcommand::Create { media_id, content, parent_id } => {
            let draft = CommentDraft { content, media_item_id: media_id, parent_id };
            print_json(&api.create(&draft).await?)
        }
        CommentsSubcommand::Delete { id } => print_json(&api.delete(id).await?),
    }
}

async fn run_notifications(app: &App, notifications: NotificationsCommand) -> Result<(), CliError> {
    let api = app.api.notifications();
    match notifications.command {
        NotificationsSubcommand::List { page, unread_only } => {
            let mut query = page_query(app, &page)?;
            if unread_only {
                query.push("unread_only", true);
            }
            print_json(&api.list(&query).await?)
        }
        NotificationsSubcommand::Read { id } => print_json(&api.mark_as_read(id).await?),
        NotificationsSubcommand::ReadAll => print_json(&api.mark_all_as_read().await?),
        NotificationsSubcommand::Delete { id } => print_json(&api.delete(id).await?),
        NotificationsSubcommand::Stats => print_json(&api.stats().await?),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn page_query(app: &App, page: &PageArgs) -> Result<Query, CliError> {
    let mut query = Query::new();
    if let Some(skip) = page.skip {
        query.push("skip", skip);
    }
    if let Some(limit) = page.limit {
        if !app.config.pagination.is_allowed(limit) {
            return Err(CliError::PageSize(limit));
        }
        query.push("limit", limit);
    }
    Ok(query)
}

async fn read_upload(
    app: &App,
    activity_id: i64,
    file: &Path,
    title: Option<String>,
    description: Option<String>,
) -> Result<MediaUpload, CliError> {
    let content_type = mime_for(file);
    let size = tokio::fs::metadata(file)
        .await
        .map_err(|source| CliError::ReadFile { path: file.to_path_buf(), source })?
        .len();
    app.config.upload.check(size, content_type)?;

    let bytes = tokio::fs::read(file)
        .await
        .map_err(|source| CliError::ReadFile { path: file.to_path_buf(), source })?;
    let file_name = file
        .file_name()
        .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
    let title = title.unwrap_or_else(|| {
        file.file_stem()
            .map_or_else(|| file_name.clone(), |s| s.to_string_lossy().into_owned())
    });
    Ok(MediaUpload { activity_id, title, description, file_name, content_type: content_type.to_owned(), bytes })
}

fn mime_for(file: &Path) -> &'static str {
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/mov",
        _ => "application/octet-stream",
    }
}

fn parse_media_type(raw: &str) -> Result<MediaType, String> {
    match raw {
        "photo" => Ok(MediaType::Photo),
        "video" => Ok(MediaType::Video),
        other => Err(format!("unknown media type `{other}`; expected photo or video")),
    }
}

fn media_type_name(media_type: MediaType) -> &'static str {
    match media_type {
        MediaType::Photo => "photo",
        MediaType::Video => "video",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
