use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use log::{error, info};

use anime_catalog_client::draft::EntryDraft;
use anime_catalog_client::filters::{find_genre, is_sentinel, CatalogFilters, GENRES, YEARS};
use anime_catalog_client::manage::{pick_random, ManageQuery, Selection, SortKey};
use anime_catalog_client::models::{CatalogEntry, ContentType, Rating};
use anime_catalog_client::notifications::Severity;
use anime_catalog_client::upload::{MediaKind, UploadFile};
use anime_catalog_client::{ApiConfig, CatalogSession, Outcome};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse and manage the anime catalog", long_about = None)]
struct Cli {
    /// Session file to use instead of CATALOG_SESSION_FILE
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List catalog entries
    List(FilterArgs),
    /// Show one entry with its comments
    Show { id: i64 },
    /// Sign in and remember the session
    Login(Credentials),
    /// Create an account and sign in
    Register(Credentials),
    /// Forget the stored session
    Logout,
    /// Print the signed-in user
    Whoami,
    /// Rate an entry from 1 to 10
    Rate { id: i64, value: u8 },
    /// Comment on an entry
    Comment { id: i64, text: String },
    /// Open a random entry from the filtered list
    Random(FilterArgs),
    /// List the catalog genres, or browse one of them
    Genres {
        /// Genre to browse, e.g. Драма
        name: Option<String>,
    },
    /// List active promotional banners
    Banners,
    /// Change the account password
    Password {
        #[arg(long)]
        old: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
    /// Content management
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// series, movie or all
    #[arg(long = "type", default_value = "all")]
    content_type: String,
    /// One of the names printed by `genres`, or Все
    #[arg(long, default_value = "Все")]
    genre: String,
    #[arg(long, default_value = "Все")]
    year: String,
    #[arg(long, default_value = "")]
    search: String,
}

impl From<FilterArgs> for CatalogFilters {
    fn from(args: FilterArgs) -> Self {
        CatalogFilters::new()
            .content_type(args.content_type)
            .genre(args.genre)
            .year(args.year)
            .search(args.search)
    }
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    /// Add a new entry
    Create(EntryArgs),
    /// Edit an existing entry; unset fields keep their current value
    Update {
        id: i64,
        #[command(flatten)]
        fields: EntryArgs,
    },
    /// Delete one or more entries
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Upload a media file and print its URL
    Upload {
        #[arg(long, value_enum)]
        kind: KindArg,
        path: PathBuf,
    },
    /// Search and sort the full list
    Manage {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, default_value = "title")]
        sort: SortKey,
    },
}

#[derive(Args, Debug)]
struct EntryArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long = "type")]
    content_type: Option<ContentType>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    episodes: Option<i32>,
    /// Image file to upload as the cover
    #[arg(long)]
    thumbnail: Option<PathBuf>,
    /// Video file to upload
    #[arg(long)]
    video: Option<PathBuf>,
    /// Audio file to upload as the theme music
    #[arg(long)]
    music: Option<PathBuf>,
}

impl EntryArgs {
    fn apply(&self, draft: &mut EntryDraft) {
        if let Some(title) = &self.title {
            draft.set_title(title.clone());
        }
        if let Some(description) = &self.description {
            draft.set_description(description.clone());
        }
        if let Some(content_type) = self.content_type {
            draft.set_content_type(content_type);
        }
        if let Some(genre) = &self.genre {
            draft.set_genre(genre.clone());
        }
        if let Some(year) = self.year {
            draft.set_year(year);
        }
        if let Some(episodes) = self.episodes {
            draft.set_episodes(episodes);
        }
    }

    fn media(&self) -> Vec<(MediaKind, &PathBuf)> {
        let mut media = Vec::new();
        if let Some(path) = &self.thumbnail {
            media.push((MediaKind::Image, path));
        }
        if let Some(path) = &self.video {
            media.push((MediaKind::Video, path));
        }
        if let Some(path) = &self.music {
            media.push((MediaKind::Audio, path));
        }
        media
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Image,
    Video,
    Audio,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Image => MediaKind::Image,
            KindArg::Video => MediaKind::Video,
            KindArg::Audio => MediaKind::Audio,
        }
    }
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let mut config = ApiConfig::from_env();
    if let Some(path) = cli.session_file {
        config = config.with_session_file(path);
    }

    let app = match CatalogSession::with_session_file(&config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    // Silent: an expired or missing session just means anonymous
    if let Some(user) = app.start().await {
        info!("Resumed session for {}", user.email);
    }

    let outcome = run(&app, cli.command).await;
    print_notifications(&app);

    if outcome.is_failure() {
        std::process::exit(1);
    }
}

async fn run(app: &CatalogSession, command: Command) -> Outcome {
    match command {
        Command::List(filters) => {
            note_unknown_filters(&filters);
            let outcome = app.browse(filters.into()).await;
            if outcome.is_success() {
                print_entries(&app.catalog().entries());
            }
            outcome
        }
        Command::Show { id } => {
            let outcome = app.open_detail(id).await;
            if let Some(entry) = app.catalog().selected() {
                print_detail(&entry);
            }
            outcome
        }
        Command::Login(creds) => app.auth().login(&creds.email, &creds.password).await,
        Command::Register(creds) => app.auth().register(&creds.email, &creds.password).await,
        Command::Logout => {
            app.teardown();
            Outcome::Success
        }
        Command::Whoami => {
            match app.auth().current_user() {
                Some(user) if user.is_admin => println!("{} (admin)", user.email),
                Some(user) => println!("{}", user.email),
                None => println!("Not signed in"),
            }
            Outcome::Success
        }
        Command::Rate { id, value } => {
            let rating = match Rating::new(value) {
                Some(rating) => rating,
                None => {
                    let choices: Vec<String> = Rating::all().map(|r| r.value().to_string()).collect();
                    eprintln!("Rating must be one of {}", choices.join(", "));
                    return Outcome::Failure;
                }
            };
            if app.open_detail(id).await.is_failure() {
                return Outcome::Failure;
            }
            let outcome = app.rate_selected(rating).await;
            if let Some(entry) = app.catalog().selected() {
                println!("{}: {:.1} ({} ratings)", entry.title, entry.rating, entry.rating_count);
            }
            outcome
        }
        Command::Comment { id, text } => {
            if app.open_detail(id).await.is_failure() {
                return Outcome::Failure;
            }
            app.comments().set_draft(text);
            let outcome = app.comment_on_selected().await;
            if let Some(entry) = app.catalog().selected() {
                print_detail(&entry);
            }
            outcome
        }
        Command::Random(filters) => {
            let outcome = app.browse(filters.into()).await;
            if !outcome.is_success() {
                return outcome;
            }
            let entries = app.catalog().entries();
            match pick_random(&entries) {
                Some(entry) => {
                    let outcome = app.open_detail(entry.id).await;
                    if let Some(entry) = app.catalog().selected() {
                        print_detail(&entry);
                    }
                    outcome
                }
                None => {
                    println!("Nothing to pick from");
                    Outcome::Skipped
                }
            }
        }
        Command::Genres { name: None } => {
            for genre in GENRES.iter() {
                println!("{} {:<12} {}", genre.emoji, genre.name, genre.description);
            }
            Outcome::Success
        }
        Command::Genres { name: Some(name) } => match find_genre(&name) {
            Some(genre) => {
                let outcome = app.browse(CatalogFilters::for_genre(genre)).await;
                if outcome.is_success() {
                    println!("{} {}", genre.emoji, genre.name);
                    print_entries(&app.catalog().entries());
                }
                outcome
            }
            None => {
                eprintln!("Unknown genre: {}. Known genres: {}", name, genre_names());
                Outcome::Failure
            }
        },
        Command::Banners => {
            let carousel = app.load_banners().await;
            if carousel.is_empty() {
                println!("No active banners");
            }
            for banner in carousel.banners() {
                match &banner.link_url {
                    Some(link) => println!("[{}] {} -> {}", banner.display_order, banner.title, link),
                    None => println!("[{}] {}", banner.display_order, banner.title),
                }
            }
            Outcome::Success
        }
        Command::Password { old, new, confirm } => app.auth().change_password(&old, &new, &confirm).await,
        Command::Admin(command) => run_admin(app, command).await,
    }
}

async fn run_admin(app: &CatalogSession, command: AdminCommand) -> Outcome {
    match command {
        AdminCommand::Create(fields) => {
            app.catalog().edit_draft(|draft| fields.apply(draft));
            for (kind, path) in fields.media() {
                if upload_into_draft(app, kind, path).await.is_failure() {
                    return Outcome::Failure;
                }
            }
            app.create_and_reload().await
        }
        AdminCommand::Update { id, fields } => {
            if app.open_detail(id).await.is_failure() {
                return Outcome::Failure;
            }
            let current = match app.catalog().selected() {
                Some(entry) => entry,
                None => return Outcome::Failure,
            };
            let mut draft = EntryDraft::from_entry(&current);
            fields.apply(&mut draft);
            for (kind, path) in fields.media() {
                let file = match read_file(app, path).await {
                    Some(file) => file,
                    None => return Outcome::Failure,
                };
                match app.catalog().upload_media(kind, &file).await {
                    Some(url) => {
                        draft.set_media(kind, url);
                    }
                    None => return Outcome::Failure,
                }
            }
            app.update_and_reload(&draft.apply_to(&current)).await
        }
        AdminCommand::Delete { ids } => {
            let mut selection = Selection::new();
            for id in ids {
                if !selection.contains(id) {
                    selection.toggle(id);
                }
            }
            let report = app.bulk_delete(&mut selection).await;
            for (id, message) in &report.failed {
                eprintln!("{}: {}", id, message);
            }
            if report.is_complete() {
                Outcome::Success
            } else {
                Outcome::Failure
            }
        }
        AdminCommand::Upload { kind, path } => {
            let file = match read_file(app, &path).await {
                Some(file) => file,
                None => return Outcome::Failure,
            };
            match app.catalog().upload_media(kind.into(), &file).await {
                Some(url) => {
                    println!("{}", url);
                    Outcome::Success
                }
                None => Outcome::Failure,
            }
        }
        AdminCommand::Manage { search, sort } => {
            let outcome = app.browse(CatalogFilters::default()).await;
            if !outcome.is_success() {
                return outcome;
            }
            let entries = app.catalog().entries();
            let visible = ManageQuery::new(search, sort).apply(&entries);
            println!("{} of {} entries", visible.len(), entries.len());
            for entry in visible {
                print_entry_line(entry);
            }
            Outcome::Success
        }
    }
}

async fn upload_into_draft(app: &CatalogSession, kind: MediaKind, path: &Path) -> Outcome {
    match read_file(app, path).await {
        Some(file) => app.catalog().upload_into_draft(kind, &file).await,
        None => Outcome::Failure,
    }
}

async fn read_file(app: &CatalogSession, path: &Path) -> Option<UploadFile> {
    match UploadFile::from_path(path).await {
        Ok(file) => Some(file),
        Err(e) => {
            app.notifications().failure("Error", e.to_string());
            None
        }
    }
}

fn genre_names() -> String {
    GENRES.iter().map(|g| g.name).collect::<Vec<_>>().join(", ")
}

// The server matches genre and year exactly, so a typo just returns nothing
fn note_unknown_filters(args: &FilterArgs) {
    if !is_sentinel(&args.genre) && find_genre(&args.genre).is_none() {
        eprintln!("note: {} is not a catalog genre ({})", args.genre, genre_names());
    }
    let known_year = args
        .year
        .trim()
        .parse::<i32>()
        .map(|y| YEARS.contains(&y))
        .unwrap_or(false);
    if !is_sentinel(&args.year) && !known_year {
        let years: Vec<String> = YEARS.iter().map(|y| y.to_string()).collect();
        eprintln!("note: catalog years are {}", years.join(", "));
    }
}

fn print_entries(entries: &[CatalogEntry]) {
    if entries.is_empty() {
        println!("Nothing found");
        return;
    }
    for entry in entries {
        print_entry_line(entry);
    }
}

fn print_entry_line(entry: &CatalogEntry) {
    println!(
        "#{:<5} {:<40} {:<7} {:<14} {} ★{:.1} ({})",
        entry.id,
        entry.title,
        entry.content_type,
        entry.genre,
        entry.year,
        entry.rating,
        entry.rating_count
    );
}

fn print_detail(entry: &CatalogEntry) {
    println!("{} ({}, {})", entry.title, entry.content_type, entry.year);
    println!("Genre: {}  Episodes: {}", entry.genre, entry.episodes);
    println!("Rating: {:.1} from {} ratings", entry.rating, entry.rating_count);
    if let Some(description) = entry.description.as_deref().filter(|d| !d.is_empty()) {
        println!();
        println!("{}", description);
    }
    if let Some(url) = &entry.video_url {
        println!("Video: {}", url);
    }
    if let Some(url) = &entry.music_url {
        println!("Music: {}", url);
    }
    let comments = entry.comments.as_deref().unwrap_or_default();
    println!();
    println!("Comments ({}):", comments.len());
    for comment in comments {
        println!(
            "  {} [{}]: {}",
            comment.email,
            comment.created_at.as_deref().unwrap_or("-"),
            comment.comment_text
        );
    }
}

fn print_notifications(app: &CatalogSession) {
    for n in app.notifications().drain() {
        let line = match &n.description {
            Some(description) => format!("{}: {}", n.title, description),
            None => n.title.clone(),
        };
        match n.severity {
            Severity::Info => eprintln!("{}", line),
            Severity::Destructive => eprintln!("error: {}", line),
        }
    }
}
