// ABOUTME: Main entry point for the present-tex program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use log::info;
use present_tex::{LinkPolicy, RenderConfig};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown fragment to LaTeX
    Render(RenderArgs),

    /// List links whose targets look dangerous
    CheckLinks(CheckLinksArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Path to the markdown file (stdin if omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Path to the output LaTeX file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Resolution used to size images without explicit dimensions
    #[arg(long)]
    dpi: Option<u32>,

    /// Directory relative image paths are resolved against
    #[arg(long)]
    base: Option<PathBuf>,

    /// What to do with links to dangerous targets
    #[arg(long, value_enum)]
    link_policy: Option<LinkPolicy>,
}

#[derive(Args)]
struct CheckLinksArgs {
    /// Path to the markdown file (stdin if omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,
}

fn read_input(input: Option<&Path>) -> anyhow::Result<String> {
    match input {
        Some(path) => {
            present_tex::utils::validate_file_exists(path)?;
            info!("input:  [{}]", path.display());
            std::fs::read_to_string(path)
                .with_context(|| format!("could not read input file [{}]", path.display()))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("could not read stdin")?;
            Ok(buf)
        }
    }
}

fn run_render(args: &RenderArgs) -> anyhow::Result<()> {
    let markdown = read_input(args.input.as_deref())?;

    let mut config = RenderConfig::from_env()?.with_overrides(
        args.dpi,
        args.base.clone(),
        args.link_policy,
    );
    // Images are relative to the input file unless told otherwise
    if config.base_dir.is_none() {
        config.base_dir = args
            .input
            .as_deref()
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
    }

    let output = present_tex::markdown_to_latex(&markdown, &config)?;
    info!("Rendered {} bytes (has code: {})", output.latex.len(), output.has_code);

    match &args.output {
        Some(path) => present_tex::utils::write_output(path, &output.latex)?,
        None => io::stdout()
            .write_all(output.latex.as_bytes())
            .context("could not write to stdout")?,
    }
    Ok(())
}

fn run_check_links(args: &CheckLinksArgs) -> anyhow::Result<bool> {
    let markdown = read_input(args.input.as_deref())?;
    let doc = present_tex::parse_markdown(&markdown);
    let dangerous = present_tex::dangerous_links(&doc);

    let mut stdout = io::stdout().lock();
    for url in &dangerous {
        writeln!(stdout, "{}", url)?;
    }
    Ok(dangerous.is_empty())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::Render(args)) => run_render(args).map(|()| true),
        Some(Commands::CheckLinks(args)) => run_check_links(args),
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Ok(true)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
