use std::path::PathBuf;

use crate::error::{Result, ShellError};
use crate::scheduler::{Priority, TaskId};

/// Priority level used by `jschedule` when none is given.
pub const DEFAULT_PRIORITY_LEVEL: i64 = 2;

/// One classified input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// `jschedule <path> [priority]`
    Schedule { path: String, priority: Priority },
    /// `jschedulexecute`
    Execute,
    /// `jscheduleview`
    View,
    /// `jschedulesave <path>`
    Save { path: PathBuf },
    /// `jscheduleload <path>`
    Load { path: PathBuf },
    /// `jschedulecancel <id>`
    Cancel { id: TaskId },
    /// `jschedulemodify <id> <command...>`
    Modify { id: TaskId, command: String },
    Help,
    Exit,
    /// Anything else: run as an external command line.
    External { tokens: Vec<String>, background: bool },
}

impl ShellCommand {
    /// Classify a whitespace-tokenized line. Returns `None` for a blank line.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Option<Self>> {
        let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();
        let Some((&name, args)) = tokens.split_first() else {
            return Ok(None);
        };

        let cmd = match name {
            "jschedule" => {
                let path = args
                    .first()
                    .ok_or_else(|| usage("jschedule <filename> [priority]"))?;
                let level = match args.get(1) {
                    Some(level) => level
                        .parse::<i64>()
                        .map_err(|_| usage("jschedule <filename> [priority]"))?,
                    None => DEFAULT_PRIORITY_LEVEL,
                };
                ShellCommand::Schedule {
                    path: path.to_string(),
                    priority: Priority::from_level(level),
                }
            }
            "jschedulexecute" => ShellCommand::Execute,
            "jscheduleview" => ShellCommand::View,
            "jschedulesave" => {
                let path = args.first().ok_or_else(|| usage("jschedulesave <filename>"))?;
                ShellCommand::Save {
                    path: PathBuf::from(path),
                }
            }
            "jscheduleload" => {
                let path = args.first().ok_or_else(|| usage("jscheduleload <filename>"))?;
                ShellCommand::Load {
                    path: PathBuf::from(path),
                }
            }
            "jschedulecancel" => {
                let id = args
                    .first()
                    .and_then(|id| parse_id(id))
                    .ok_or_else(|| usage("jschedulecancel <task_id>"))?;
                ShellCommand::Cancel { id }
            }
            "jschedulemodify" => {
                let usage_msg = "jschedulemodify <task_id> <command>";
                let id = args
                    .first()
                    .and_then(|id| parse_id(id))
                    .ok_or_else(|| usage(usage_msg))?;
                if args.len() < 2 {
                    return Err(usage(usage_msg));
                }
                ShellCommand::Modify {
                    id,
                    command: args[1..].join(" "),
                }
            }
            "help" => ShellCommand::Help,
            "exit" => ShellCommand::Exit,
            _ => {
                let (tokens, background) = match tokens.split_last() {
                    Some((&"&", rest)) => (rest, true),
                    _ => (&tokens[..], false),
                };
                if tokens.is_empty() {
                    return Err(ShellError::Syntax("missing command before '&'".to_string()));
                }
                ShellCommand::External {
                    tokens: tokens.iter().map(|t| t.to_string()).collect(),
                    background,
                }
            }
        };
        Ok(Some(cmd))
    }
}

fn parse_id(token: &str) -> Option<TaskId> {
    token.parse::<TaskId>().ok()
}

fn usage(msg: &str) -> ShellError {
    ShellError::Usage(msg.to_string())
}

/// Split a line the way the shell does: on whitespace, no quoting.
pub fn tokenize(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

pub const HELP_TEXT: &str = "\
=========== JAM Shell Help Menu ===========
General Commands:
  help                         - Show this help menu
  exit                         - Exit the JAM Shell

Scheduling:
  jschedule <file> [priority]  - Schedule a script (1 = high/round robin, 2 = low/FCFS)
  jschedulexecute              - Execute all scheduled tasks
  jscheduleview                - View tasks in scheduling queue
  jschedulesave <filename>     - Save current queues to file
  jscheduleload <filename>     - Restore queues saved with jschedulesave
  jschedulecancel <task_id>    - Cancel a scheduled task by ID
  jschedulemodify <id> <cmd>   - Modify a scheduled task's command

Pipes & Redirection:
  command > file               - Redirect stdout to file (overwrite)
  command >> file              - Redirect stdout to file (append)
  command < file               - Redirect stdin from file
  command1 | command2          - Pipe output of one command into another

Background Execution:
  command &                    - Run command in background
===========================================";
