use std::{path::PathBuf, str::FromStr, sync::Arc};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::{
    compose::{register_site_functions, render_site, setup_template_engine},
    context::Context,
    highlighter::Highlighter,
    output::write_site,
    server::{run_server, AppState},
    site::Site,
};

mod compose;
mod config;
mod context;
mod frontmatter;
mod functions;
mod highlighter;
mod markdown;
mod output;
mod page;
mod section;
mod server;
mod site;

#[derive(Parser, Debug)]
#[command(name = "docsite")]
#[command(author, version, about = "Static documentation site composer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compose every page and write the site to the output directory.
    Build(BuildArgs),
    /// Compose every page and serve the site over HTTP.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[arg(default_value = ".")]
    path: String,
    #[arg(default_value = "public")]
    output_dir: String,
    /// Use the local server address as base URL.
    #[arg(short, long)]
    local: bool,
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(default_value = ".")]
    path: String,
    #[arg(long)]
    host: Option<String>,
    #[arg(short, long)]
    port: Option<u16>,
    #[arg(short, long)]
    verbose: bool,
}

impl Command {
    fn verbose(&self) -> bool {
        match self {
            Command::Build(args) => args.verbose,
            Command::Serve(args) => args.verbose,
        }
    }
}

/// Loads templates and content; the returned site is final.
fn load_site(context: &Context) -> anyhow::Result<(tera::Tera, Arc<Site>)> {
    let highlighter = Highlighter::new(
        &context.absolute("syntaxes"),
        &context.config.highlight_theme,
    )?;

    let mut tera = setup_template_engine(context)?;

    let site = Arc::new(Site::load(context, &tera, &highlighter)?);

    register_site_functions(&mut tera, site.clone());

    tracing::info!(
        pages = site.pages.len(),
        assets = site.assets.len(),
        "loaded site"
    );

    Ok((tera, site))
}

fn build(args: BuildArgs) -> anyhow::Result<()> {
    let home = PathBuf::from_str(&args.path)?;
    let output_dir = home.join(&args.output_dir);

    let mut context = Context::new(home, output_dir)?;

    if args.local {
        context.config.base_url = context.config.server.local_url()?;
    }

    let (tera, site) = load_site(&context)?;

    write_site(&context, &tera, &site)
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let home = PathBuf::from_str(&args.path)?;
    let output_dir = home.join("public");

    let mut context = Context::new(home, output_dir)?;

    if let Some(host) = args.host {
        context.config.server.host = host;
    }
    if let Some(port) = args.port {
        context.config.server.port = port;
    }
    context.config.base_url = context.config.server.local_url()?;

    let (tera, site) = load_site(&context)?;

    let rendered = render_site(&context.config, &tera, &site)?;
    let state = AppState::new(site, rendered, context.absolute("static"));

    let server = &context.config.server;
    run_server(state, &server.host, server.port).await
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.command.verbose() {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(?cli, "running");

    match cli.command {
        Command::Build(args) => build(args),
        Command::Serve(args) => tokio::runtime::Runtime::new()?.block_on(serve(args)),
    }
}
