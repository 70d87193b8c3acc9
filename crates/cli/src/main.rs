use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use cli::output::{ConsoleNotifier, format_results, spinner};
use cli::{AppContext, init_tracing_with_config, shell};
use console::style;
use core_types::config::load_or_create_config;
use std::path::PathBuf;
use std::process::ExitCode;
use workflow::{ImportTransition, SessionStore};

/// Import JSON into a session and search it in natural language.
#[derive(Parser, Debug)]
#[command(name = "vectorvista", version, about = "VectorVista semantic search client")]
struct Cli {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true, env = "VECTORVISTA_CONFIG")]
    config: Option<PathBuf>,
    /// Service base URL, overriding config and environment.
    #[arg(long, global = true)]
    server: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send a JSON document for embedding and bind the returned session.
    Import {
        /// JSON file to import; `-` reads standard input.
        file: Option<PathBuf>,
        /// Accept FILE only if it is declared as JSON (drag-and-drop rules).
        #[arg(long, requires = "file")]
        drop: bool,
        /// Inline JSON instead of a file.
        #[arg(long, conflicts_with = "file")]
        text: Option<String>,
    },
    /// Run one query against the current session.
    Search {
        /// Query text; may be omitted with --voice.
        #[arg(required_unless_present = "voice")]
        query: Vec<String>,
        /// Maximum number of results (values below 1 become 1).
        #[arg(short, long, allow_negative_numbers = true)]
        limit: Option<i64>,
        /// Append a spoken phrase to the query before searching.
        #[arg(long)]
        voice: bool,
        /// Copy the matched records to the clipboard as JSON.
        #[arg(long)]
        copy: bool,
        /// Write search-results.json into DIR.
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
        /// Print only the matched records as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Interactive query shell.
    Shell,
    /// Print the stored session id.
    Session,
    /// Check that the service is reachable.
    Status,
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    cli::runtime()?.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut cfg = load_or_create_config(cli.config.as_deref())?;
    if let Some(url) = cli.server {
        cfg.server.url = url;
    }
    let _guard = init_tracing_with_config(&cfg.logging)?;
    tracing::debug!(server = %cfg.server.url, version = cli::VERSION, "starting");

    let ctx = AppContext::new(cfg);
    match cli.command {
        Commands::Import { file, drop, text } => import(&ctx, file, drop, text).await,
        Commands::Search {
            query,
            limit,
            voice,
            copy,
            export,
            json,
        } => {
            let opts = SearchOpts {
                query: query.join(" "),
                limit,
                voice,
                copy,
                export,
                json,
            };
            search(&ctx, opts).await
        }
        Commands::Shell => {
            shell::run(&ctx).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Session => {
            match ctx.sessions.get() {
                Some(id) => println!("{id}"),
                None => println!("none"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => status(&ctx).await,
    }
}

async fn import(
    ctx: &AppContext,
    file: Option<PathBuf>,
    drop: bool,
    text: Option<String>,
) -> Result<ExitCode> {
    let mut stage = ctx.import_stage();
    let candidate = stage.candidate_mut();
    let loaded = match (text, file) {
        (Some(text), _) => {
            candidate.set_from_text(text);
            true
        }
        (None, Some(path)) if path.as_os_str() == "-" => {
            candidate.set_from_reader(tokio::io::stdin(), Some("stdin")).await
        }
        (None, Some(path)) if drop => candidate.set_from_drop(&path).await,
        (None, Some(path)) => candidate.set_from_file(&path).await,
        (None, None) => bail!("nothing to import: pass a FILE, `-` for stdin, or --text JSON"),
    };
    if !loaded {
        bail!("could not load the document (missing, unreadable, not UTF-8, or not declared as JSON)");
    }
    if !stage.can_submit() {
        eprintln!("{}", style("document is empty or unchanged from the sample; nothing sent").yellow());
        return Ok(ExitCode::FAILURE);
    }

    let mut notifier = ConsoleNotifier::default();
    let pb = spinner("Importing...");
    let transition = stage.next(&mut notifier).await;
    pb.finish_and_clear();

    match transition {
        ImportTransition::Query(outcome) => {
            println!("{}", outcome.session_id);
            Ok(ExitCode::SUCCESS)
        }
        ImportTransition::Stay => Ok(ExitCode::FAILURE),
    }
}

struct SearchOpts {
    query: String,
    limit: Option<i64>,
    voice: bool,
    copy: bool,
    export: Option<PathBuf>,
    json: bool,
}

async fn search(ctx: &AppContext, opts: SearchOpts) -> Result<ExitCode> {
    let mut stage = ctx.query_stage();
    stage.set_text(opts.query);
    if let Some(limit) = opts.limit {
        stage.set_limit_input(limit);
    }

    if opts.voice {
        if !stage.voice().is_available() {
            eprintln!("{}", style("voice input is not available; using typed text only").yellow());
        } else if !shell::capture_voice(&mut stage).await {
            eprintln!("{}", style("nothing recognized").yellow());
        }
    }
    if !stage.can_search() {
        eprintln!("{}", style("empty query; nothing sent").yellow());
        return Ok(ExitCode::FAILURE);
    }

    let mut notifier = ConsoleNotifier::default();
    let pb = spinner("Searching...");
    let ok = stage.submit(&mut notifier).await;
    pb.finish_and_clear();
    let Some(presenter) = stage.presenter().filter(|_| ok) else {
        return Ok(ExitCode::FAILURE);
    };

    if opts.json {
        println!("{}", presenter.export_json()?);
    } else {
        println!("{}", format_results(&presenter));
    }
    if opts.copy {
        let mut clipboard = ctx.clipboard();
        let _ = presenter.copy_to_clipboard(&mut clipboard, &mut notifier);
    }
    if let Some(dir) = opts.export {
        if let Ok(path) = presenter.download_as_file(&dir, &mut notifier) {
            eprintln!("{}", path.display());
        }
    }

    Ok(if notifier.errors() == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn status(ctx: &AppContext) -> Result<ExitCode> {
    let pb = spinner("Contacting service...");
    let reply = ctx.backend.health().await;
    pb.finish_and_clear();
    match reply {
        Ok(health) => {
            println!(
                "{} {} {}",
                style("✔").green().bold(),
                ctx.backend.base_url(),
                health.message.unwrap_or_default()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!(
                "{} {} {}",
                style("✖").red().bold(),
                ctx.backend.base_url(),
                style(err.user_message()).red()
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_joins_words_and_accepts_negative_limit() {
        let cli = Cli::try_parse_from(["vectorvista", "search", "pending", "orders", "-l", "-3"]).unwrap();
        match cli.command {
            Commands::Search { query, limit, voice, .. } => {
                assert_eq!(query.join(" "), "pending orders");
                assert_eq!(limit, Some(-3));
                assert!(!voice);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn search_needs_text_unless_voice() {
        assert!(Cli::try_parse_from(["vectorvista", "search"]).is_err());
        assert!(Cli::try_parse_from(["vectorvista", "search", "--voice"]).is_ok());
    }

    #[test]
    fn import_sources_are_exclusive() {
        assert!(Cli::try_parse_from(["vectorvista", "import", "a.json", "--text", "[]"]).is_err());
        assert!(Cli::try_parse_from(["vectorvista", "import", "--drop"]).is_err());
        let cli = Cli::try_parse_from(["vectorvista", "--server", "http://h:1", "import", "-"]).unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://h:1"));
        assert!(matches!(cli.command, Commands::Import { file: Some(ref f), .. } if f.as_os_str() == "-"));
    }
}
