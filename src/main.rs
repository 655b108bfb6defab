use std::io::{BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;

use clap::{Parser, ValueEnum};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use jamsh::config::{InterpreterConfig, OutputFormat, ShellConfig, DEFAULT_MAX_PARALLEL};
use jamsh::shutdown::install_shutdown_handler;
use jamsh::{Reply, Shell};

#[derive(Parser, Debug)]
#[command(name = "jamsh")]
#[command(version)]
#[command(about = "Interactive shell with a two-level script scheduler")]
struct Args {
    /// Program used to run scheduled scripts (invoked as `<program> [args] <script>`)
    #[arg(long, default_value = "sh")]
    interpreter: String,

    /// Extra argument passed to the interpreter before the script path (repeatable)
    #[arg(long = "interpreter-arg", allow_hyphen_values = true)]
    interpreter_args: Vec<String>,

    /// Maximum number of low-priority tasks running at once
    #[arg(long, default_value_t = DEFAULT_MAX_PARALLEL)]
    max_parallel: usize,

    /// Output format for jscheduleview
    #[arg(long, short = 'o', value_enum, default_value = "table")]
    output: OutputArg,

    /// Run a single command line and exit
    #[arg(long, short = 'c')]
    command: Option<String>,

    /// File of command lines to run instead of reading standard input
    file: Option<PathBuf>,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputArg {
    Table,
    Json,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Table => OutputFormat::Table,
            OutputArg::Json => OutputFormat::Json,
        }
    }
}

fn shell_config(args: &Args) -> ShellConfig {
    let interpreter = args
        .interpreter_args
        .iter()
        .fold(InterpreterConfig::new(&args.interpreter), |cfg, arg| {
            cfg.with_arg(arg)
        });

    ShellConfig::default()
        .with_interpreter(interpreter)
        .with_max_parallel(args.max_parallel)
        .with_output(args.output.clone().into())
}

fn show_banner() {
    println!("-----------------------------------------------------------");
    println!("                  Welcome to the JAM Shell                 ");
    println!("-----------------------------------------------------------");
    println!("       Type help to view available commands.");
    println!("-----------------------------------------------------------");
}

fn prompt() {
    print!("JAM [{}]> ", chrono::Local::now().format("%a %b %e %H:%M:%S %Y"));
    let _ = std::io::stdout().flush();
}

/// Handle one line and print its outcome. Returns false once the session
/// should end.
async fn run_line(shell: &Shell, line: &str) -> bool {
    match shell.handle_line(line).await {
        Ok(Reply::Text(text)) => {
            println!("{}", text);
            true
        }
        Ok(Reply::Silent) => true,
        Ok(Reply::Exit) => false,
        Err(e) => {
            eprintln!("jamsh: {}", e);
            true
        }
    }
}

async fn run_file(shell: &Shell, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    for line in contents.lines() {
        if !run_line(shell, line).await {
            break;
        }
    }
    Ok(())
}

/// Reads standard input on a plain thread, one line per request.
///
/// Lines are only read when asked for, so a foreground command that inherits
/// stdin never races the shell for input.
struct LineReader {
    request: std_mpsc::Sender<()>,
    lines: mpsc::Receiver<std::io::Result<Option<String>>>,
}

impl LineReader {
    fn spawn() -> Self {
        let (request, request_rx) = std_mpsc::channel::<()>();
        let (tx, lines) = mpsc::channel(1);
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for () in request_rx {
                let mut buf = String::new();
                let line = match stdin.lock().read_line(&mut buf) {
                    Ok(0) => Ok(None),
                    Ok(_) => Ok(Some(buf.trim_end_matches(['\n', '\r']).to_string())),
                    Err(e) => Err(e),
                };
                let eof = !matches!(line, Ok(Some(_)));
                if tx.blocking_send(line).is_err() || eof {
                    break;
                }
            }
        });
        Self { request, lines }
    }

    async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        if self.request.send(()).is_err() {
            return Ok(None);
        }
        self.lines.recv().await.unwrap_or(Ok(None))
    }
}

async fn run_interactive(shell: &Shell) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = install_shutdown_handler()?;
    let interactive = std::io::stdin().is_terminal();
    let mut reader = LineReader::spawn();

    if interactive {
        show_banner();
    }

    loop {
        if interactive {
            prompt();
        }

        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = reader.next_line() => line?,
        };

        let Some(line) = line else {
            if interactive {
                println!("\nSession terminated.");
            }
            break;
        };

        if !run_line(shell, &line).await {
            break;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so they never end up in redirected output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let shell = Shell::new(shell_config(&args));

    if let Some(line) = &args.command {
        match shell.handle_line(line).await {
            Ok(Reply::Text(text)) => println!("{}", text),
            Ok(_) => {}
            Err(e) => {
                eprintln!("jamsh: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    if let Some(path) = &args.file {
        return run_file(&shell, path).await;
    }

    run_interactive(&shell).await
}
