// pysplain: line-by-line plain-English explanations of Python source

use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;

use clap::Parser as ClapParser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pysplain::explainer;
use pysplain::output::{self, OutputFormat};
use pysplain::ui::App;

/// Explain Python source code line by line
#[derive(ClapParser, Debug)]
#[command(name = "pysplain", version, about)]
struct Cli {
    /// Python file to explain (takes precedence over --code)
    file: Option<PathBuf>,

    /// Inline Python source to explain
    #[arg(short, long, value_name = "TEXT")]
    code: Option<String>,

    /// Output format; defaults to tui on a terminal and text otherwise
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Print only the one-line summaries in text output
    #[arg(long)]
    no_paragraphs: bool,

    /// Log parse and explain summaries to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Install the stderr subscriber. `RUST_LOG` overrides `default_level`.
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Source from the file argument, `--code`, or standard input
fn read_source(cli: &Cli) -> io::Result<String> {
    if let Some(path) = &cli.file {
        debug!(path = %path.display(), "reading source file");
        return fs::read_to_string(path);
    }
    if let Some(code) = &cli.code {
        return Ok(code.clone());
    }
    debug!("reading source from stdin");
    io::read_to_string(io::stdin())
}

fn run_tui(source: String, explanations: Vec<explainer::Explanation>) -> io::Result<()> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create and run app
    let mut app = App::new(source, explanations);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let format = cli.format.unwrap_or(if io::stdout().is_terminal() {
        OutputFormat::Tui
    } else {
        OutputFormat::Text
    });

    // Log lines would tear the alternate screen, so the TUI stays quiet by default
    let default_level = match (cli.verbose, format) {
        (true, _) => "debug",
        (false, OutputFormat::Tui) => "off",
        (false, _) => "warn",
    };
    init_logging(default_level);

    let source = match read_source(&cli) {
        Ok(source) => source,
        Err(e) => {
            match &cli.file {
                Some(path) => eprintln!("Error: cannot read '{}': {}", path.display(), e),
                None => eprintln!("Error: cannot read source: {}", e),
            }
            std::process::exit(1);
        }
    };

    let explanations = explainer::explain(&source);
    info!(records = explanations.len(), ?format, "explanations ready");

    match format {
        OutputFormat::Tui => {
            if let Err(err) = run_tui(source, explanations) {
                eprintln!("Error: {:?}", err);
            }
        }
        OutputFormat::Text => {
            let text = output::render_text(&explanations, !cli.no_paragraphs);
            io::stdout().write_all(text.as_bytes())?;
        }
        OutputFormat::Json => {
            let json = output::render_json(&explanations)?;
            writeln!(io::stdout(), "{}", json)?;
        }
    }

    Ok(())
}
