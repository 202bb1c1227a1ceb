//! CLI entry point for castscrape.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// castscrape — resolve castxml output into a typed C type AST.
#[derive(Parser, Debug)]
#[command(name = "castscrape", version, about)]
struct Cli {
    /// C header to parse, or an existing castxml `.xml` dump.
    input: PathBuf,

    /// Path to a castscrape.toml configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// castxml binary to invoke (overrides config).
    #[arg(long)]
    castxml: Option<PathBuf>,

    /// Keep a copy of the intermediate XML dump in this directory.
    #[arg(long)]
    save_xml: Option<PathBuf>,

    /// Add an include directory (repeatable).
    #[arg(short = 'I', value_name = "DIR")]
    include: Vec<PathBuf>,

    /// Extra clang-side argument (repeatable).
    #[arg(long = "clang-arg")]
    clang_args: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("castscrape=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => castscrape::config::load_config(path)?,
        None => castscrape::Config::default(),
    };
    if cli.castxml.is_some() {
        cfg.binary = cli.castxml.clone();
    }
    if cli.save_xml.is_some() {
        cfg.save_xml = cli.save_xml.clone();
    }
    cfg.include_paths.extend(cli.include.iter().cloned());
    cfg.clang_args.extend(cli.clang_args.iter().cloned());

    let ast = if cli.input.extension().is_some_and(|ext| ext == "xml") {
        castscrape::parse_xml_file(&cli.input)?
    } else {
        castscrape::parse_with(&cfg, &cli.input)?
    };

    for &decl in &ast.roots {
        println!("{}", ast.types.describe(decl));
    }
    Ok(())
}
