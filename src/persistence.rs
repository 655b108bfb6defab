//! Flat-file snapshots of the scheduling queues.
//!
//! One task per line as `<id>,<priority>,<command>`, high queue first, each
//! queue in FIFO order. There is no header and commas inside a command are
//! written as-is; loading splits on the first two commas only, so such
//! commands still read back intact.

use std::path::Path;

use tokio::fs;

use crate::error::{Result, ShellError};
use crate::scheduler::{Priority, Task, TaskId, TaskStore};

/// Render tasks in the snapshot line format.
pub fn render(tasks: &[Task]) -> String {
    let mut out = String::new();
    for task in tasks {
        out.push_str(&format!(
            "{},{},{}\n",
            task.id,
            task.priority.level(),
            task.command
        ));
    }
    out
}

/// Parse snapshot contents. `path` is only used for error messages.
pub fn parse(contents: &str, path: &Path) -> Result<Vec<Task>> {
    let mut tasks = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let malformed = |reason: String| ShellError::Persistence {
            path: path.to_path_buf(),
            line: idx + 1,
            reason,
        };

        let mut fields = line.splitn(3, ',');
        let (Some(id), Some(level), Some(command)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed(
                "expected <id>,<priority>,<command>".to_string(),
            ));
        };

        let id = id
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| malformed(format!("invalid task id '{}'", id)))?;
        if id == TaskId::MAX {
            return Err(malformed("task id out of range".to_string()));
        }
        let level = level
            .trim()
            .parse::<i64>()
            .map_err(|_| malformed(format!("invalid priority '{}'", level)))?;
        if command.trim().is_empty() {
            return Err(malformed("empty command".to_string()));
        }

        tasks.push(Task::new(id, command, Priority::from_level(level)));
    }
    Ok(tasks)
}

/// Write the store's current snapshot to `path`, replacing the file.
pub async fn save(store: &TaskStore, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let tasks = store.snapshot();
    fs::write(path, render(&tasks))
        .await
        .map_err(|e| ShellError::io(path, e))?;
    tracing::info!(path = %path.display(), count = tasks.len(), "Saved task queues");
    Ok(tasks.len())
}

/// Read a snapshot written by [`save`].
pub async fn load(path: impl AsRef<Path>) -> Result<Vec<Task>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .await
        .map_err(|e| ShellError::io(path, e))?;
    let tasks = parse(&contents, path)?;
    tracing::info!(path = %path.display(), count = tasks.len(), "Loaded task queues");
    Ok(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_writes_id_level_command() {
        let tasks = vec![
            Task::new(1, "a.script", Priority::High),
            Task::new(2, "b.script", Priority::Low),
        ];
        assert_eq!(render(&tasks), "1,1,a.script\n2,2,b.script\n");
    }

    #[test]
    fn render_empty_is_empty() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn parse_keeps_commas_in_command() {
        let tasks = parse("4,2,run a,b,c\n", Path::new("q.txt")).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, 4);
        assert_eq!(tasks[0].priority, Priority::Low);
        assert_eq!(tasks[0].command, "run a,b,c");
    }

    #[test]
    fn parse_skips_blank_lines() {
        let tasks = parse("\n1,1,a\n\n", Path::new("q.txt")).unwrap();
        assert_eq!(tasks.len(), 1);
    }

    #[test]
    fn parse_rejects_id_without_successor() {
        let err = parse("18446744073709551615,1,a.script\n", Path::new("q.txt")).unwrap_err();
        match err {
            ShellError::Persistence { line, reason, .. } => {
                assert_eq!(line, 1);
                assert_eq!(reason, "task id out of range");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_reports_line_number() {
        let err = parse("1,1,a\nnot-a-task\n", Path::new("q.txt")).unwrap_err();
        match err {
            ShellError::Persistence { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parse_rejects_bad_id_and_priority() {
        assert!(parse("x,1,a\n", Path::new("q")).is_err());
        assert!(parse("0,1,a\n", Path::new("q")).is_err());
        assert!(parse("1,high,a\n", Path::new("q")).is_err());
        assert!(parse("1,1,\n", Path::new("q")).is_err());
    }
}
