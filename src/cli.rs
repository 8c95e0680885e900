use crate::config::Config;
use crate::engine::http::HttpTransport;
use crate::engine::IngestEngine;
use crate::model::{DownloadRoute, FormEvent, Identity, Status, Submission, UploadFile};
use crate::navigation::{self, Navigated, Navigator, PrintUrl, SaveToDisk};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    /// Written to stdout exactly as given, without a trailing newline.
    StdoutRaw(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::StdoutRaw(msg) => {
                    let _ = out.write_all(msg.as_bytes());
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "radar-ingest",
    version,
    about = "Submit files and URLs to a radar ingest service, with an optional TUI form"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a config file (default: <config dir>/radar-ingest/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the ingest service
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Identity to attribute ingest actions to
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Request timeout (e.g. 30s); no timeout when unset
    #[arg(long, global = true)]
    pub timeout: Option<humantime::Duration>,

    /// Print JSON result and exit (no TUI)
    #[arg(long, global = true)]
    pub json: bool,

    /// Print text result and exit (no TUI)
    #[arg(long, global = true)]
    pub text: bool,

    /// Run silently: suppress all output except errors (for cron usage)
    #[arg(long, global = true)]
    pub silent: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Submit files and URLs to the ingest endpoint
    Ingest(IngestArgs),
    /// Print the audit log for the configured user
    Audit,
    /// Fetch one of the download routes
    Download(DownloadArgs),
    /// Open the interactive form (default)
    Form,
}

#[derive(Debug, Args, Clone)]
pub struct IngestArgs {
    /// Files to upload
    pub files: Vec<PathBuf>,

    /// URL list, passed to the server as-is
    #[arg(long, conflicts_with = "urls_file")]
    pub urls: Option<String>,

    /// Read the URL list from a file
    #[arg(long)]
    pub urls_file: Option<PathBuf>,

    /// Why these items are being flagged
    #[arg(long, default_value = "")]
    pub flag_reason: String,

    /// API key (overrides config / RADAR_INGEST_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RouteArg {
    Public,
    Private,
}

impl From<RouteArg> for DownloadRoute {
    fn from(r: RouteArg) -> Self {
        match r {
            RouteArg::Public => DownloadRoute::Public,
            RouteArg::Private => DownloadRoute::Private,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct DownloadArgs {
    #[arg(value_enum)]
    pub route: RouteArg,

    /// Directory to save into (default: config download_dir, else current directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Print the URL instead of fetching it
    #[arg(long)]
    pub print_url: bool,
}

impl Cli {
    /// Whether this invocation opens the TUI.
    pub fn wants_tui(&self) -> bool {
        !self.json
            && !self.text
            && !self.silent
            && matches!(self.command, None | Some(Command::Form))
    }
}

/// Load configuration and apply command-line overrides on top.
pub fn load_config(args: &Cli) -> Result<Config> {
    let mut cfg = Config::load_from(args.config.clone()).context("load configuration")?;
    if let Some(base_url) = &args.base_url {
        cfg.base_url = base_url.clone();
    }
    if let Some(user) = &args.user {
        cfg.user = Identity::new(user.clone());
    }
    if let Some(t) = args.timeout {
        cfg.timeout = Some(t.into());
    }
    if let Some(Command::Ingest(ingest)) = &args.command {
        if let Some(key) = &ingest.api_key {
            cfg.api_key = Some(key.clone());
        }
    }
    cfg.validate().context("invalid configuration")?;
    Ok(cfg)
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }

    let cfg = load_config(&args)?;

    match args.command.clone() {
        Some(Command::Ingest(ingest)) => run_ingest(&args, &cfg, ingest).await,
        Some(Command::Audit) => run_audit(&args, &cfg).await,
        Some(Command::Download(dl)) => run_download(&args, &cfg, dl).await,
        None | Some(Command::Form) => {
            if !args.wants_tui() {
                return Err(anyhow::anyhow!(
                    "the interactive form has no --json/--text mode; use the ingest, audit or download subcommands"
                ));
            }
            run_form(cfg).await
        }
    }
}

#[cfg(feature = "tui")]
async fn run_form(cfg: Config) -> Result<()> {
    crate::tui::run(cfg).await
}

#[cfg(not(feature = "tui"))]
async fn run_form(_cfg: Config) -> Result<()> {
    // Fallback when built without TUI support.
    Err(anyhow::anyhow!(
        "built without TUI support; use the ingest, audit or download subcommands"
    ))
}

fn upload_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string()
}

/// Read one file into an upload part named after its final path component.
pub(crate) async fn load_upload(path: &Path) -> Result<UploadFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    Ok(UploadFile::new(upload_name(path), bytes))
}

/// Same as [`load_upload`], for the TUI thread which runs outside the runtime.
#[cfg(feature = "tui")]
pub(crate) fn load_upload_blocking(path: &Path) -> Result<UploadFile> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    Ok(UploadFile::new(upload_name(path), bytes))
}

/// Build a `Submission` from CLI arguments and configuration.
pub async fn build_submission(args: &IngestArgs, cfg: &Config) -> Result<Submission> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        files.push(load_upload(path).await?);
    }
    let urls = match (&args.urls, &args.urls_file) {
        (Some(u), _) => u.clone(),
        (None, Some(p)) => tokio::fs::read_to_string(p)
            .await
            .with_context(|| format!("read {}", p.display()))?,
        (None, None) => String::new(),
    };
    Ok(Submission {
        files,
        urls,
        flag_reason: args.flag_reason.clone(),
        api_key: cfg.api_key.clone().unwrap_or_default(),
        user: cfg.user.clone(),
    })
}

fn engine_for(cfg: &Config) -> Result<(IngestEngine, HttpTransport)> {
    let transport = HttpTransport::new(cfg)?;
    let engine = IngestEngine::new(Arc::new(transport.clone()));
    Ok((engine, transport))
}

async fn run_ingest(args: &Cli, cfg: &Config, ingest: IngestArgs) -> Result<()> {
    let submission = build_submission(&ingest, cfg).await?;
    let (engine, _) = engine_for(cfg)?;
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<FormEvent>();

    let handle = tokio::spawn(async move { engine.submit(submission, &evt_tx).await });

    while let Some(ev) = evt_rx.recv().await {
        if args.json || args.silent {
            continue;
        }
        match ev {
            FormEvent::Status(Status::Ingesting) => {
                let _ = out_tx.send(OutputLine::Stderr(Status::Ingesting.message().into()));
            }
            FormEvent::AuditRevealed => {
                let _ = out_tx.send(OutputLine::Stderr("Fetching audit log...".into()));
            }
            FormEvent::Info(msg) => {
                let _ = out_tx.send(OutputLine::Stderr(msg));
            }
            _ => {}
        }
    }

    let outcome = handle.await.context("ingest task failed")?;

    if args.json {
        if !args.silent {
            let out = serde_json::to_string_pretty(&outcome)?;
            let _ = out_tx.send(OutputLine::Stdout(out));
        }
    } else {
        let summary = crate::text_summary::build_text_summary(&outcome);
        for line in summary.stderr {
            let _ = out_tx.send(OutputLine::Stderr(line));
        }
        for line in summary.stdout {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
        if let Some(text) = summary.audit_log {
            let _ = out_tx.send(OutputLine::StdoutRaw(text));
        }
    }
    drop(out_tx);
    let _ = out_handle.await;

    if outcome.status == Status::Failed {
        return Err(anyhow::anyhow!(
            "{}",
            outcome
                .error
                .unwrap_or_else(|| Status::Failed.message().to_string())
        ));
    }
    Ok(())
}

async fn run_audit(args: &Cli, cfg: &Config) -> Result<()> {
    let (engine, _) = engine_for(cfg)?;
    let text = engine
        .fetch_audit(&cfg.user)
        .await
        .context("fetch audit log")?;

    if args.silent {
        return Ok(());
    }
    if args.json {
        let out = serde_json::json!({ "user": cfg.user, "audit_log": text });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        // Verbatim: no trailing newline is added.
        print!("{text}");
        std::io::stdout().flush().ok();
    }
    Ok(())
}

async fn run_download(args: &Cli, cfg: &Config, dl: DownloadArgs) -> Result<()> {
    let transport = HttpTransport::new(cfg)?;
    let navigator: Box<dyn Navigator> = if dl.print_url {
        Box::new(PrintUrl)
    } else {
        let dir = dl.output_dir.clone().unwrap_or_else(|| cfg.download_dir());
        Box::new(SaveToDisk::new(transport.clone(), dir))
    };
    let route = DownloadRoute::from(dl.route);

    let navigated =
        navigation::trigger_download(&transport, navigator.as_ref(), route, &cfg.user)
            .await
            .with_context(|| format!("download {}", route.path()))?;

    if let Navigated::Saved(path) = navigated {
        if args.json && !args.silent {
            let out = serde_json::json!({ "route": route, "path": path });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else if !args.silent {
            eprintln!("Saved: {}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_arguments_parse() {
        let cli = Cli::try_parse_from([
            "radar-ingest",
            "ingest",
            "a.csv",
            "b.pdf",
            "--urls",
            "https://a.example https://b.example",
            "--flag-reason",
            "dupe",
            "--user",
            "analyst",
        ])
        .unwrap();
        let Some(Command::Ingest(ingest)) = &cli.command else {
            panic!("expected ingest subcommand");
        };
        assert_eq!(ingest.files.len(), 2);
        assert_eq!(ingest.flag_reason, "dupe");
        assert_eq!(cli.user.as_deref(), Some("analyst"));
        assert!(!cli.wants_tui());
    }

    #[test]
    fn urls_and_urls_file_conflict() {
        let res = Cli::try_parse_from([
            "radar-ingest",
            "ingest",
            "--urls",
            "x",
            "--urls-file",
            "y.txt",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn no_subcommand_means_form() {
        let cli = Cli::try_parse_from(["radar-ingest"]).unwrap();
        assert!(cli.wants_tui());
        let cli = Cli::try_parse_from(["radar-ingest", "--json"]).unwrap();
        assert!(!cli.wants_tui());
    }

    #[test]
    fn download_route_values() {
        let cli = Cli::try_parse_from(["radar-ingest", "download", "private", "--print-url"])
            .unwrap();
        let Some(Command::Download(dl)) = cli.command else {
            panic!("expected download subcommand");
        };
        assert_eq!(DownloadRoute::from(dl.route), DownloadRoute::Private);
        assert!(dl.print_url);
        assert!(Cli::try_parse_from(["radar-ingest", "download", "secret"]).is_err());
    }

    #[test]
    fn cli_overrides_config_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "base_url = \"https://file.example\"\nuser = \"from-file\"").unwrap();
        let path = f.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from([
            "radar-ingest",
            "--config",
            &path,
            "ingest",
            "--user",
            "from-cli",
            "--api-key",
            "k1",
            "--timeout",
            "5s",
        ])
        .unwrap();
        let cfg = load_config(&cli).unwrap();
        assert_eq!(cfg.base_url, "https://file.example");
        assert_eq!(cfg.user, Identity::new("from-cli"));
        assert_eq!(cfg.api_key.as_deref(), Some("k1"));
        assert_eq!(cfg.timeout, Some(std::time::Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn submission_reads_files_and_url_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.txt");
        std::fs::write(&file, b"hello").unwrap();
        let urls = dir.path().join("urls.txt");
        std::fs::write(&urls, "https://a.example\n").unwrap();

        let args = IngestArgs {
            files: vec![file],
            urls: None,
            urls_file: Some(urls),
            flag_reason: String::new(),
            api_key: None,
        };
        let cfg = Config {
            api_key: Some("from-config".into()),
            ..Default::default()
        };
        let sub = build_submission(&args, &cfg).await.unwrap();
        assert_eq!(sub.files, vec![UploadFile::new("report.txt", b"hello".to_vec())]);
        assert_eq!(sub.urls, "https://a.example\n");
        assert_eq!(sub.api_key, "from-config");
        assert_eq!(sub.user, Identity::default());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let args = IngestArgs {
            files: vec![PathBuf::from("/definitely/not/here.bin")],
            urls: None,
            urls_file: None,
            flag_reason: String::new(),
            api_key: None,
        };
        let err = build_submission(&args, &Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("here.bin"));
    }
}
