extern crate libpod;

use std::io::Write;

use clap::{ArgAction, Parser, Subcommand};
use libpod::{Container, ReadOptions, Track};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "POD CLI")]
#[command(about, author, version, long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode a POD file and write its cleartext payload
    #[command(arg_required_else_help = true)]
    Decode {
        /// POD file
        file: String,
        /// Overwrite the output file
        #[arg(short, long, default_value_t = false, value_name = "TRUE|FALSE")]
        force: bool,
        /// Output file
        #[arg(short, long, value_name = "FILE")]
        out: String,
    },
    /// Print the events of a track file
    #[command(arg_required_else_help = true)]
    Events {
        /// Track file
        file: String,
        /// Filter results by event name
        #[arg(long)]
        name: Option<String>,
        /// Reject tracks with unexpected reserved fields
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Print the header and cipher parameters of a POD file
    #[command(arg_required_else_help = true)]
    Info {
        /// POD file
        file: String,
    },
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let stdout = console::Term::stdout();

    match cli.command {
        Commands::Decode { file, force, out } => command_decode(stdout, file, out, force)?,
        Commands::Events { file, name, strict } => command_events(stdout, file, name, strict)?,
        Commands::Info { file } => command_info(stdout, file)?,
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn command_decode(_stdout: console::Term, file: String, out: String, force: bool) -> Result<()> {
    if !force && is_exist_file(&out) {
        let message = format!("File \"{}\" exists. Overwrite it?", out);

        if !dialoguer::Confirm::new()
            .with_prompt(message)
            .interact()
            .into_diagnostic()?
        {
            return Ok(());
        }
    }

    let container = Container::open_path(file)?;
    let mut output = std::fs::File::create(out).into_diagnostic()?;
    output.write_all(container.payload()).into_diagnostic()?;

    Ok(())
}

fn command_events(
    stdout: console::Term,
    file: String,
    name: Option<String>,
    strict: bool,
) -> Result<()> {
    let opts = ReadOptions {
        strict_reserved: strict,
        ..ReadOptions::default()
    };
    let mut track = Track::open_path(file, &opts)?;

    if let Some(name) = name {
        track.events.retain(|event| event.name.contains(&name));
    };

    for event in &track.events {
        let text = format!(
            "{}: {} x {} bytes",
            event.name,
            event.params.len(),
            event.param_size
        );
        stdout.write_line(&text).into_diagnostic()?;
    }

    let text = format!(
        "Total events: {};\nMacro section: {} (bytes);",
        track.events.len(),
        track.macros.len()
    );
    stdout.write_line(&text).into_diagnostic()?;

    Ok(())
}

fn command_info(stdout: console::Term, file: String) -> Result<()> {
    let container = Container::open_path(file)?;
    let header = container.header();

    let text = format!(
        "File size: {} (bytes);\nCoder key: {:#010x};\nBlock size: {} (bytes);\nPayload size: {} (bytes);\nOffsets: {};",
        header.file_size,
        container.coder_key(),
        container.block_size(),
        container.payload().len(),
        header.offsets.len()
    );
    stdout.write_line(&text).into_diagnostic()?;

    for (index, offset) in header.offsets.iter().enumerate() {
        let text = format!("Offset {}: {:#010x};", index, offset);
        stdout.write_line(&text).into_diagnostic()?;
    }

    Ok(())
}

fn is_exist_file(path: &String) -> bool {
    let metadata = std::path::Path::new(path);
    metadata.exists()
}
