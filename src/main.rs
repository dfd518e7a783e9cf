use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use travelog::backend::{Backend, PostgrestBackend, SnapshotBackend};
use travelog::config::{self, Credentials, SiteConfig};
use travelog::{export, output, queries, serve};

#[derive(Parser)]
#[command(name = "travelog")]
#[command(about = "Server-rendered pages for a personal travel journal")]
#[command(long_about = "\
Server-rendered pages for a personal travel journal

Reads trips, countries and posts from a PostgREST (Supabase) backend and
renders them as HTML, either on request or as a static export.

Backend credentials come from the environment (a .env file is read first):

  SUPABASE_URL         https://<project>.supabase.co
  SUPABASE_ANON_KEY    public read key

Pass --snapshot <file> to read from a JSON snapshot instead.

Routes:

  /                    stats, trips, recent posts
  /trips, /trips/:id   trip list and trip pages
  /countries, /map     countries, by continent
  /journal[/page/:n]   the full timeline, paginated
  /post/:id            a single post

Run 'travelog gen-config' to generate a documented travelog.toml.")]
#[command(version)]
struct Cli {
    /// Site config file (missing file means stock defaults)
    #[arg(long, default_value = "travelog.toml", global = true)]
    config: PathBuf,

    /// Read journal rows from a JSON snapshot instead of the backend
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve pages on request, re-rendering after the revalidation window
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Render every page into a static site
    Export {
        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// Fetch the homepage counters to verify backend access
    Check,
    /// Print a stock travelog.toml with all options documented
    GenConfig,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The snapshot when given, otherwise the PostgREST backend from the
/// environment. Also returns a description of the source for output.
fn open_backend(snapshot: Option<&Path>) -> Result<(Arc<dyn Backend>, String), Box<dyn Error>> {
    if let Some(path) = snapshot {
        let backend = SnapshotBackend::load(path)?;
        return Ok((Arc::new(backend), path.display().to_string()));
    }
    let credentials = Credentials::from_env()?;
    tracing::debug!(?credentials, "backend credentials");
    let backend = PostgrestBackend::new(&credentials.url, &credentials.anon_key)?;
    let source = backend.rest_url().to_string();
    Ok((Arc::new(backend), source))
}

fn setup(
    config_path: &Path,
    snapshot: Option<&Path>,
) -> Result<(SiteConfig, Arc<dyn Backend>, String), Box<dyn Error>> {
    let site_config = config::load_config(config_path)?;
    let (backend, source) = open_backend(snapshot)?;
    tracing::info!(%source, "journal source");
    Ok((site_config, backend, source))
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let snapshot = cli.snapshot.as_deref();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Serve { bind } => {
            init_tracing();
            let (site_config, backend, _) = setup(&cli.config, snapshot)?;
            let bind = bind.unwrap_or_else(|| site_config.server.bind.clone());
            serve::run(serve::AppState::new(backend, site_config), &bind).await?;
        }
        Command::Export { output: output_dir } => {
            init_tracing();
            let (site_config, backend, _) = setup(&cli.config, snapshot)?;
            let assets_dir = PathBuf::from(&site_config.server.assets_dir);
            let manifest =
                export::export_site(backend.as_ref(), &site_config, &output_dir, &assets_dir)
                    .await?;
            output::print_export_output(&manifest);
        }
        Command::Check => {
            init_tracing();
            let (_, backend, source) = setup(&cli.config, snapshot)?;
            let stats = queries::get_stats(backend.as_ref()).await?;
            output::print_check_output(&source, &stats);
        }
    }
    Ok(())
}
