use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use articlesync_core::articles::ArticleList;
use articlesync_core::config::{CONFIG_FILENAME, SyncConfig, load_config};
use articlesync_core::{Article, CreateOptions, HttpItemApi, Workspace, fetch_workspaces};
use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    name = "articlesync",
    version,
    about = "Keep Markdown article files in sync with a Qiita-style item service"
)]
struct Cli {
    #[arg(long, global = true, value_name = "DIR", help = "Local article root")]
    root: Option<PathBuf>,
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(short, long, global = true, help = "Log debug output to stderr")]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone)]
struct RuntimeOptions {
    root: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl RuntimeOptions {
    fn from_cli(cli: &Cli) -> Self {
        Self {
            root: cli.root.clone(),
            config: cli.config.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    Generate(GenerateArgs),
    Fetch(FetchArgs),
    Show(ShowArgs),
    Create(CreateArgs),
    Update(UpdateArgs),
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[command(subcommand)]
    command: GenerateSubcommand,
}

#[derive(Debug, Subcommand)]
enum GenerateSubcommand {
    #[command(about = "Write an empty article file for a new post")]
    File {
        #[arg(short, long)]
        title: String,
        #[arg(short = 'T', long, value_name = "ID")]
        team: Option<String>,
    },
}

#[derive(Debug, Args)]
struct FetchArgs {
    #[command(subcommand)]
    command: FetchSubcommand,
}

#[derive(Debug, Subcommand)]
enum FetchSubcommand {
    #[command(about = "Download every post in the personal space and active teams")]
    Posts,
    #[command(about = "Download a single post by id")]
    Post {
        id: String,
        #[arg(short = 'T', long, value_name = "ID")]
        team: Option<String>,
    },
}

#[derive(Debug, Args)]
struct ShowArgs {
    #[command(subcommand)]
    command: ShowSubcommand,
}

#[derive(Debug, Subcommand)]
enum ShowSubcommand {
    #[command(about = "List remote posts without writing files")]
    Posts {
        #[arg(short = 'T', long, value_name = "ID")]
        team: Option<String>,
    },
}

#[derive(Debug, Args)]
struct CreateArgs {
    #[command(subcommand)]
    command: CreateSubcommand,
}

#[derive(Debug, Subcommand)]
enum CreateSubcommand {
    #[command(about = "Publish a local article file as a new post")]
    Post {
        file: PathBuf,
        #[arg(long, help = "Announce the post on Twitter")]
        tweet: bool,
        #[arg(long, help = "Mirror code blocks to Gist")]
        gist: bool,
    },
}

#[derive(Debug, Args)]
struct UpdateArgs {
    #[command(subcommand)]
    command: UpdateSubcommand,
}

#[derive(Debug, Subcommand)]
enum UpdateSubcommand {
    #[command(about = "Push local edits of an article file")]
    Post { file: PathBuf },
}

#[derive(Debug, Args)]
struct DeleteArgs {
    #[command(subcommand)]
    command: DeleteSubcommand,
}

#[derive(Debug, Subcommand)]
enum DeleteSubcommand {
    #[command(about = "Delete a post remotely and remove its file")]
    Post { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let runtime = RuntimeOptions::from_cli(&cli);

    match cli.command {
        Some(Commands::Generate(GenerateArgs {
            command: GenerateSubcommand::File { title, team },
        })) => run_generate_file(&runtime, &title, team),
        Some(Commands::Fetch(FetchArgs { command })) => match command {
            FetchSubcommand::Posts => run_fetch_posts(&runtime),
            FetchSubcommand::Post { id, team } => run_fetch_post(&runtime, &id, team),
        },
        Some(Commands::Show(ShowArgs {
            command: ShowSubcommand::Posts { team },
        })) => run_show_posts(&runtime, team),
        Some(Commands::Create(CreateArgs {
            command: CreateSubcommand::Post { file, tweet, gist },
        })) => run_create_post(&runtime, &file, CreateOptions { tweet, gist }),
        Some(Commands::Update(UpdateArgs {
            command: UpdateSubcommand::Post { file },
        })) => run_update_post(&runtime, &file),
        Some(Commands::Delete(DeleteArgs {
            command: DeleteSubcommand::Post { file },
        })) => run_delete_post(&runtime, &file),
        None => {
            let mut command = Cli::command();
            command.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn run_generate_file(runtime: &RuntimeOptions, title: &str, team: Option<String>) -> Result<()> {
    let context = resolve_context(runtime)?;
    let mut article = Article::new(title, None, team.map(team_workspace));
    let written = article.save(&context.root)?;
    println!("{}", normalize_path(&written));
    Ok(())
}

fn run_fetch_posts(runtime: &RuntimeOptions) -> Result<()> {
    let context = resolve_context(runtime)?;
    let mut api = context.api()?;

    let mut personal = ArticleList::fetch(&mut api, None).context("failed to list personal posts")?;
    report_saved("mine", &personal.save(&context.root)?);

    for team in fetch_workspaces(&mut api)?
        .into_iter()
        .filter(|team| team.active)
    {
        let mut posts = ArticleList::fetch(&mut api, Some(&team))
            .with_context(|| format!("failed to list posts in team {}", team.id))?;
        report_saved(&team.id, &posts.save(&context.root)?);
    }
    Ok(())
}

fn run_fetch_post(runtime: &RuntimeOptions, id: &str, team: Option<String>) -> Result<()> {
    let context = resolve_context(runtime)?;
    let mut api = context.api()?;
    let workspace = team.map(team_workspace);

    let mut article = Article::fetch(&mut api, id, workspace.as_ref())
        .with_context(|| format!("failed to fetch post {id}"))?;
    let written = article.save(&context.root)?;
    println!("{}", normalize_path(&written));
    Ok(())
}

fn run_show_posts(runtime: &RuntimeOptions, team: Option<String>) -> Result<()> {
    let context = resolve_context(runtime)?;
    let mut api = context.api()?;

    if let Some(team) = team {
        let workspace = team_workspace(team);
        let posts = ArticleList::fetch(&mut api, Some(&workspace))?;
        print!("{}", format_listing(&workspace_heading(&workspace), &posts));
        return Ok(());
    }

    let personal = ArticleList::fetch(&mut api, None)?;
    print!("{}", format_listing("Posts in Qiita:", &personal));
    for team in fetch_workspaces(&mut api)?
        .into_iter()
        .filter(|team| team.active)
    {
        let posts = ArticleList::fetch(&mut api, Some(&team))?;
        print!("{}", format_listing(&workspace_heading(&team), &posts));
    }
    Ok(())
}

fn run_create_post(runtime: &RuntimeOptions, file: &Path, options: CreateOptions) -> Result<()> {
    let context = resolve_context(runtime)?;
    let mut article = load_valid_article(&context, file)?;
    let mut api = context.api()?;

    article
        .create(&mut api, &options)
        .with_context(|| format!("failed to create post from {}", normalize_path(file)))?;
    let written = article.save(&context.root)?;
    println!("id: {}", article.id);
    println!("url: {}", article.url);
    println!("path: {}", normalize_path(&written));
    Ok(())
}

fn run_update_post(runtime: &RuntimeOptions, file: &Path) -> Result<()> {
    let context = resolve_context(runtime)?;
    let mut article = load_valid_article(&context, file)?;
    let mut api = context.api()?;

    article
        .update(&mut api)
        .with_context(|| format!("failed to update post from {}", normalize_path(file)))?;
    let written = article.save(&context.root)?;
    println!("id: {}", article.id);
    println!("updated_at: {}", article.updated_at);
    println!("path: {}", normalize_path(&written));
    Ok(())
}

fn run_delete_post(runtime: &RuntimeOptions, file: &Path) -> Result<()> {
    let context = resolve_context(runtime)?;
    let path = absolute_path(file)?;
    let mut article = Article::load(&context.root, &path)?;
    let mut api = context.api()?;

    article
        .delete(&mut api, &context.root)
        .with_context(|| format!("failed to delete post {}", article.id))?;
    println!("deleted: {}", article.id);
    println!("removed: {}", normalize_path(&path));
    Ok(())
}

struct CliContext {
    config: SyncConfig,
    root: PathBuf,
}

impl CliContext {
    fn api(&self) -> Result<HttpItemApi> {
        HttpItemApi::from_config(&self.config).context("failed to build API client")
    }
}

fn resolve_context(runtime: &RuntimeOptions) -> Result<CliContext> {
    dotenvy::dotenv().ok();

    let cwd = env::current_dir().context("failed to read current directory")?;
    let config_path = runtime
        .config
        .clone()
        .unwrap_or_else(|| cwd.join(CONFIG_FILENAME));
    let config = load_config(&config_path)?;

    let root = match &runtime.root {
        Some(root) if root.is_absolute() => root.clone(),
        Some(root) => cwd.join(root),
        None => config.root_dir(&cwd),
    };
    let root_env = root.join(".env");
    if root_env.exists() {
        let _ = dotenvy::from_path_override(&root_env);
    }

    Ok(CliContext { config, root })
}

fn load_valid_article(context: &CliContext, file: &Path) -> Result<Article> {
    let path = absolute_path(file)?;
    let article = Article::load(&context.root, &path)?;
    let validation = article.validate();
    if !validation.is_valid() {
        bail!("{}: {validation}", normalize_path(&path));
    }
    Ok(article)
}

fn absolute_path(file: &Path) -> Result<PathBuf> {
    if file.is_absolute() {
        return Ok(file.to_path_buf());
    }
    Ok(env::current_dir()
        .context("failed to read current directory")?
        .join(file))
}

/// A workspace named only by its id, for commands that take `--team`.
fn team_workspace(id: String) -> Workspace {
    Workspace::new(id, String::new())
}

fn workspace_heading(team: &Workspace) -> String {
    let name = if team.name.is_empty() { &team.id } else { &team.name };
    format!("Posts in Qiita:Team ({name}):")
}

fn format_listing(heading: &str, posts: &ArticleList) -> String {
    let mut out = format!("{heading}\n");
    for post in posts {
        let (year, month, day) = post.created_at.date_segments();
        out.push_str(&format!("{} {year}/{month}/{day} {}\n", post.id, post.title));
    }
    out
}

fn report_saved(space: &str, written: &[PathBuf]) {
    println!("{space}: {} saved", written.len());
    for path in written {
        println!("  {}", normalize_path(path));
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr);
    let filter_layer = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

fn normalize_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
