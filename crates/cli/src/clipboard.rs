//! Clipboard sinks for exported results.

use core_types::config::ClipboardSection;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;
use workflow::{Clipboard, WorkflowError};

/// Pipes text into an external clipboard program (`wl-copy`, `pbcopy`,
/// `xclip -selection clipboard`, ...).
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Clipboard for CommandClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), WorkflowError> {
        debug!(program = %self.program, bytes = text.len(), "writing clipboard");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }
        let status = child.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(std::io::Error::other(format!("{} exited with {status}", self.program)).into())
        }
    }
}

/// Fallback when no clipboard program is configured: print to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutClipboard;

impl Clipboard for StdoutClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), WorkflowError> {
        let mut out = std::io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

/// Clipboard picked from configuration.
#[derive(Debug, Clone)]
pub enum SystemClipboard {
    Command(CommandClipboard),
    Stdout(StdoutClipboard),
}

impl SystemClipboard {
    pub fn from_config(cfg: &ClipboardSection) -> Self {
        CommandClipboard::from_argv(&cfg.command)
            .map_or(Self::Stdout(StdoutClipboard), Self::Command)
    }
}

impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), WorkflowError> {
        match self {
            Self::Command(clipboard) => clipboard.write_text(text),
            Self::Stdout(clipboard) => clipboard.write_text(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_falls_back_to_stdout() {
        let clipboard = SystemClipboard::from_config(&ClipboardSection::default());
        assert!(matches!(clipboard, SystemClipboard::Stdout(_)));
        assert!(CommandClipboard::from_argv(&[" ".to_string()]).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn command_receives_text_on_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("clip.txt");
        let argv = vec![
            "sh".to_string(),
            "-c".to_string(),
            "cat > \"$1\"".to_string(),
            "sh".to_string(),
            target.to_string_lossy().into_owned(),
        ];
        let mut clipboard = SystemClipboard::from_config(&ClipboardSection { command: argv });
        clipboard.write_text("[\n  1\n]").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "[\n  1\n]");
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_an_error() {
        let mut clipboard = CommandClipboard::from_argv(&["false".to_string()]).unwrap();
        assert!(clipboard.write_text("x").is_err());
    }
}
