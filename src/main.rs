use clap::{Parser, Subcommand};
use gengo::config::{self, BuildConfig};
use gengo::progress::{FileStatus, ProgressBoard};
use gengo::{generate, output};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup; called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "gengo")]
#[command(about = "Manifest-driven static site generator")]
#[command(long_about = "\
Manifest-driven static site generator

A YAML manifest describes the site. Every page, section index, tag index,
home page and static asset becomes an independent task; tasks are built in
parallel and reported per output file.

Manifest structure:

  title: My Site
  default-layout-template: templates/layout.html
  default-page-template: templates/page.html
  default-section-template: templates/section.html   # enables index + tag pages
  home-template: templates/home.html                 # enables index.html
  metadata: { author: Ada }                          # site → section → page
  static-assets:
    - { path: assets, destination: assets }
  external-data:
    weather: { url: https://example.com/weather }
  sections:
    blog:
      pages:
        - markdown-path: posts/hello.md              # → blog/hello.html
          tags: [intro]                              # → blog/tags/intro.html
          flags: [pinned]
          external-data: { forecast: { source: weather } }

Paths are relative to the first manifest's directory. Later manifests
override scalars and metadata; the first to define a section wins.

Set RUST_LOG=debug for per-task diagnostics.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site described by one or more manifests
    Generate(GenerateArgs),
    /// Print the version
    Version,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Manifest file; repeat to merge several, later files override earlier
    #[arg(long = "manifest", short = 'm', default_value = "gengo.yaml")]
    manifests: Vec<PathBuf>,

    /// Output directory
    #[arg(long, short = 'o', default_value = "output")]
    output: PathBuf,

    /// Print one line per finished file instead of every transition
    #[arg(long)]
    plain: bool,

    /// Worker threads (default: number of CPU cores)
    #[arg(long)]
    workers: Option<usize>,

    /// Render ```LANG fenced blocks by POSTing them to URL
    #[arg(long = "fence", value_name = "LANG=URL", value_parser = config::parse_fence_spec)]
    fences: Vec<(String, String)>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args)?,
        Command::Version => println!("gengo {}", version_string()),
    }

    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = BuildConfig {
        max_workers: args.workers,
        fence_renderers: args.fences.into_iter().collect(),
    };
    let build = generate::generate(&args.manifests, &args.output, &config)?;

    let mut board = ProgressBoard::new(build.initial().to_vec());
    if !args.plain {
        output::print_board(board.files());
    }
    for event in build.events() {
        board.apply(&event);
        if !args.plain {
            output::print_board_line(&event);
        } else if event.status.is_terminal() {
            output::print_event(&event);
        }
    }
    build.wait();

    let summary = board.summary();
    output::print_summary(&summary);
    if board.count(FileStatus::Failed) > 0 {
        return Err(format!("{} file(s) failed to build", summary.failed.len()).into());
    }
    Ok(())
}
