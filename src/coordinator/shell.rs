//! Interactive shell for the coordinator
//!
//! One command per line, keyword case-insensitive:
//! `GET key`, `PUT key value`, `UPDATE key value`, `DELETE key`, `NODES`, `EXIT`.

use std::io::{BufRead, Write};

use crate::error::{KvError, Result};

use super::Coordinator;

/// A parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Get { key: String },
    Put { key: String, value: String },
    Update { key: String, value: String },
    Delete { key: String },
    Nodes,
    Exit,
}

impl ShellCommand {
    /// Parse one line of input
    pub fn parse(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(keyword) = parts.first() else {
            return Err(KvError::InvalidCommand("empty input".to_string()));
        };

        match (keyword.to_ascii_uppercase().as_str(), &parts[1..]) {
            ("GET", [key]) => Ok(Self::Get {
                key: key.to_string(),
            }),
            ("PUT", [key, value]) => Ok(Self::Put {
                key: key.to_string(),
                value: value.to_string(),
            }),
            ("UPDATE", [key, value]) => Ok(Self::Update {
                key: key.to_string(),
                value: value.to_string(),
            }),
            ("DELETE", [key]) => Ok(Self::Delete {
                key: key.to_string(),
            }),
            ("NODES", []) => Ok(Self::Nodes),
            ("EXIT", []) => Ok(Self::Exit),
            ("GET", _) => Err(usage("GET key")),
            ("PUT", _) => Err(usage("PUT key value")),
            ("UPDATE", _) => Err(usage("UPDATE key value")),
            ("DELETE", _) => Err(usage("DELETE key")),
            ("NODES", _) => Err(usage("NODES")),
            ("EXIT", _) => Err(usage("EXIT")),
            (other, _) => Err(KvError::InvalidCommand(format!(
                "unknown command {:?}",
                other
            ))),
        }
    }
}

fn usage(form: &str) -> KvError {
    KvError::InvalidCommand(format!("usage: {}", form))
}

/// Read commands from `input` until EXIT or end of input
///
/// Per-command failures are printed and the loop continues; only errors
/// writing to `output` end the shell early.
pub fn run_shell<R: BufRead, W: Write>(
    coordinator: &mut Coordinator,
    input: R,
    mut output: W,
) -> Result<()> {
    let mut lines = input.lines();
    loop {
        write!(output, ">> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            return Ok(());
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                writeln!(output, "{}", e)?;
                continue;
            }
        };

        if command == ShellCommand::Exit {
            writeln!(output, "Exiting...")?;
            return Ok(());
        }

        match execute(coordinator, command) {
            Ok(message) => writeln!(output, "{}", message)?,
            Err(e) => writeln!(output, "error: {}", e)?,
        }
    }
}

fn execute(coordinator: &mut Coordinator, command: ShellCommand) -> Result<String> {
    Ok(match command {
        ShellCommand::Get { key } => match coordinator.get(&key)? {
            (node, Some(value)) => {
                format!("Node[{}] Value : {}", node, String::from_utf8_lossy(&value))
            }
            (node, None) => format!("Node[{}] Key not found", node),
        },
        ShellCommand::Put { key, value } => {
            let (node, created) = coordinator.put(&key, value.as_bytes())?;
            format!("Node[{}] Created : {}", node, created)
        }
        ShellCommand::Update { key, value } => {
            let (node, existed) = coordinator.update(&key, value.as_bytes())?;
            format!("Node[{}] Update Status : {}", node, existed)
        }
        ShellCommand::Delete { key } => {
            let (node, existed) = coordinator.delete(&key)?;
            format!("Node[{}] Delete Status : {}", node, existed)
        }
        ShellCommand::Nodes => coordinator
            .nodes()
            .into_iter()
            .map(|(id, addr)| format!("{} {}", id, addr))
            .collect::<Vec<_>>()
            .join("\n"),
        ShellCommand::Exit => String::new(),
    })
}
