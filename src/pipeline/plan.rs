use std::path::PathBuf;

use crate::error::{Result, ShellError};

/// Where a stage reads its standard input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Inherit,
    /// `< path`
    File(PathBuf),
    /// Fed by the previous stage of the pipeline.
    Pipe,
}

/// Where a stage writes its standard output to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Inherit,
    /// `> path`: create or truncate.
    Truncate(PathBuf),
    /// `>> path`: create or append.
    Append(PathBuf),
    /// Feeds the next stage of the pipeline.
    Pipe,
}

/// One process of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Input,
    pub stdout: Output,
}

impl Stage {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: Input::Inherit,
            stdout: Output::Inherit,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn stdin(mut self, input: Input) -> Self {
        self.stdin = input;
        self
    }

    pub fn stdout(mut self, output: Output) -> Self {
        self.stdout = output;
        self
    }
}

/// Declarative process graph for one command line: one stage, or two stages
/// joined by a pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub(crate) stages: Vec<Stage>,
    pub(crate) background: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Pipe,
    Truncate,
    Append,
    Read,
}

impl Operator {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "|" => Some(Operator::Pipe),
            ">" => Some(Operator::Truncate),
            ">>" => Some(Operator::Append),
            "<" => Some(Operator::Read),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Operator::Pipe => "|",
            Operator::Truncate => ">",
            Operator::Append => ">>",
            Operator::Read => "<",
        }
    }
}

impl Pipeline {
    /// A single-stage pipeline.
    pub fn single(stage: Stage) -> Self {
        Self {
            stages: vec![stage],
            background: false,
        }
    }

    /// Two stages, the first one's stdout feeding the second one's stdin.
    pub fn piped(upstream: Stage, downstream: Stage) -> Self {
        Self {
            stages: vec![upstream.stdout(Output::Pipe), downstream.stdin(Input::Pipe)],
            background: false,
        }
    }

    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_background(&self) -> bool {
        self.background
    }

    pub fn is_piped(&self) -> bool {
        self.stages.len() > 1
    }

    /// Build a pipeline from an already expanded, whitespace-split command
    /// line. The trailing `&` must already be stripped and passed as
    /// `background`.
    ///
    /// Tokens are scanned left to right and the first operator decides the
    /// shape. A redirection operator binds the following filename and ends
    /// the scan. A `|` splits the line in two, and a second `|` is rejected.
    pub fn parse<S: AsRef<str>>(tokens: &[S], background: bool) -> Result<Self> {
        let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref()).collect();

        let first_op = tokens
            .iter()
            .enumerate()
            .find_map(|(i, t)| Operator::from_token(t).map(|op| (i, op)));

        let pipeline = match first_op {
            Some((pos, Operator::Pipe)) => {
                let (left, right) = (&tokens[..pos], &tokens[pos + 1..]);
                if right.iter().any(|t| *t == "|") {
                    return Err(ShellError::UnsupportedPipeline(
                        "only one '|' per command line is supported".to_string(),
                    ));
                }

                let upstream = command_stage(left, "|")?;
                let downstream = parse_stage(right)?;
                if downstream.stdin != Input::Inherit {
                    return Err(ShellError::UnsupportedPipeline(
                        "stdin of a piped command cannot also be redirected".to_string(),
                    ));
                }
                Pipeline::piped(upstream, downstream)
            }
            _ => Pipeline::single(parse_stage(&tokens)?),
        };

        Ok(pipeline.background(background))
    }
}

/// Parse one stage, honouring the first redirection operator only.
fn parse_stage(tokens: &[&str]) -> Result<Stage> {
    let Some((pos, op)) = tokens
        .iter()
        .enumerate()
        .find_map(|(i, t)| Operator::from_token(t).map(|op| (i, op)))
    else {
        return command_stage(tokens, "|");
    };

    let stage = command_stage(&tokens[..pos], op.as_str())?;
    let target = tokens.get(pos + 1).ok_or_else(|| {
        ShellError::Syntax(format!("expected a filename after '{}'", op.as_str()))
    })?;
    if Operator::from_token(target).is_some() {
        return Err(ShellError::Syntax(format!(
            "expected a filename after '{}', found '{}'",
            op.as_str(),
            target
        )));
    }

    let path = PathBuf::from(*target);
    Ok(match op {
        Operator::Truncate => stage.stdout(Output::Truncate(path)),
        Operator::Append => stage.stdout(Output::Append(path)),
        Operator::Read => stage.stdin(Input::File(path)),
        Operator::Pipe => {
            return Err(ShellError::UnsupportedPipeline(
                "only one '|' per command line is supported".to_string(),
            ))
        }
    })
}

fn command_stage(tokens: &[&str], near: &str) -> Result<Stage> {
    let (program, args) = tokens
        .split_first()
        .ok_or_else(|| ShellError::Syntax(format!("missing command near '{}'", near)))?;
    Ok(Stage {
        program: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        stdin: Input::Inherit,
        stdout: Output::Inherit,
    })
}
