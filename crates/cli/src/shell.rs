//! Interactive query shell.
//!
//! Plain lines are queries against the stored session; lines starting with
//! `:` are shell commands.

use anyhow::Result;
use console::style;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::path::PathBuf;
use workflow::{NOT_SEARCHED, Notifier, QueryStage, SessionStore};

use crate::context::AppContext;
use crate::output::{ConsoleNotifier, format_results, spinner};

const COMMANDS: &[&str] = &[":voice", ":limit", ":copy", ":export", ":session", ":help", ":quit"];

const HELP: &str = "\
:voice        append a spoken phrase to the last query and run it
:limit N      results per query (at least 1)
:copy         copy the latest results as JSON
:export [DIR] write search-results.json to DIR (default: current dir)
:session      show the stored session id
:quit         leave the shell
anything else runs as a query";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Query(String),
    Voice,
    Limit(i64),
    Copy,
    Export(Option<PathBuf>),
    Session,
    Help,
    Quit,
    Empty,
}

/// Parse one input line.
pub fn parse_line(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ShellCommand::Empty);
    }
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(ShellCommand::Query(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();
    match (name, arg) {
        ("voice" | "v", None) => Ok(ShellCommand::Voice),
        ("limit" | "l", Some(n)) => n
            .parse()
            .map(ShellCommand::Limit)
            .map_err(|_| format!("not a number: {n}")),
        ("limit" | "l", None) => Err("usage: :limit N".to_string()),
        ("copy" | "c", None) => Ok(ShellCommand::Copy),
        ("export" | "e", dir) => Ok(ShellCommand::Export(dir.map(PathBuf::from))),
        ("session" | "s", None) => Ok(ShellCommand::Session),
        ("help" | "h" | "?", None) => Ok(ShellCommand::Help),
        ("quit" | "q" | "exit", None) => Ok(ShellCommand::Quit),
        _ => Err(format!("unknown command :{rest} (try :help)")),
    }
}

#[derive(Clone)]
struct ShellHelper;

impl Helper for ShellHelper {}
impl Highlighter for ShellHelper {}
impl Validator for ShellHelper {}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with(':') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with(':') {
            return Ok((0, Vec::new()));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: (*cmd).to_string(),
                replacement: (*cmd).to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

/// Run the shell until `:quit`, Ctrl-C or end of input.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let mut editor: Editor<ShellHelper, _> = Editor::new()?;
    editor.set_helper(Some(ShellHelper));

    let mut stage = ctx.query_stage();
    let mut notifier = ConsoleNotifier::default();
    let mut clipboard = ctx.clipboard();

    println!("{}", style("VectorVista shell").magenta().bold());
    match ctx.sessions.get() {
        Some(id) => println!("session {}", style(id).cyan()),
        None => println!("{}", style("no session yet; run `vectorvista import` first").yellow()),
    }
    println!("{}", style(":help lists commands").dim());

    loop {
        let line = match editor.readline(&prompt(&stage)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let _ = editor.add_history_entry(line.as_str());

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(msg) => {
                eprintln!("{}", style(msg).yellow());
                continue;
            }
        };

        match command {
            ShellCommand::Empty => {}
            ShellCommand::Quit => break,
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Query(text) => {
                stage.set_text(text);
                search(&mut stage, &mut notifier).await;
            }
            ShellCommand::Voice => {
                if !stage.voice().is_available() {
                    eprintln!("{}", style("voice input is not configured ([voice] command)").yellow());
                    continue;
                }
                if capture_voice(&mut stage).await {
                    println!("{} {}", style("heard:").dim(), stage.text());
                    search(&mut stage, &mut notifier).await;
                } else {
                    eprintln!("{}", style("nothing recognized").yellow());
                }
            }
            ShellCommand::Limit(n) => {
                stage.set_limit_input(n);
                println!("limit {}", stage.limit());
            }
            ShellCommand::Copy => match stage.presenter() {
                Some(presenter) => {
                    let _ = presenter.copy_to_clipboard(&mut clipboard, &mut notifier);
                }
                None => println!("{NOT_SEARCHED}"),
            },
            ShellCommand::Export(dir) => match stage.presenter() {
                Some(presenter) => {
                    let dir = dir.unwrap_or_else(|| PathBuf::from("."));
                    if let Ok(path) = presenter.download_as_file(&dir, &mut notifier) {
                        println!("{}", path.display());
                    }
                }
                None => println!("{NOT_SEARCHED}"),
            },
            ShellCommand::Session => match ctx.sessions.get() {
                Some(id) => println!("{id}"),
                None => println!("none"),
            },
        }
    }
    Ok(())
}

/// Run one voice capture; the transcript extends the last query text.
pub async fn capture_voice<B: api::Backend>(stage: &mut QueryStage<B>) -> bool {
    stage.toggle_voice();
    if !stage.voice().is_listening() {
        return false;
    }
    let pb = spinner("Listening...");
    let heard = stage.listen().await;
    pb.finish_and_clear();
    heard
}

fn prompt<B: api::Backend>(stage: &QueryStage<B>) -> String {
    format!("query[{}]> ", stage.limit())
}

async fn search<B: api::Backend>(stage: &mut QueryStage<B>, notifier: &mut impl Notifier) {
    let pb = spinner("Searching...");
    let ok = stage.submit(notifier).await;
    pb.finish_and_clear();
    if ok {
        if let Some(presenter) = stage.presenter() {
            println!("{}", format_results(&presenter));
        }
    }
}
