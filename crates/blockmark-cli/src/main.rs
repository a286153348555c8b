use anyhow::{Context, Result, bail};
use blockmark_config::Config;
use blockmark_engine::{Document, io};
use std::{env, fs, path::PathBuf, process};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("fmt") => fmt(&args[2..]),
        Some("check") => check(&args[2..]),
        Some("blocks") => blocks(&args[2..]),
        _ => {
            eprintln!("Usage: {} <command> [paths...]", args[0]);
            eprintln!();
            eprintln!("Commands:");
            eprintln!("  fmt [paths...]    Rewrite markdown files in canonical form");
            eprintln!("  check [paths...]  Fail if any file is not in canonical form");
            eprintln!("  blocks <path>     Print the block sequence of one file");
            eprintln!();
            eprintln!(
                "Without paths, fmt and check process every markdown file under the"
            );
            eprintln!(
                "docs_path configured in {}",
                Config::config_path().display()
            );
            process::exit(1);
        }
    }
}

/// Rewrite each file as import followed by export, leaving already-canonical
/// files untouched.
fn fmt(paths: &[String]) -> Result<()> {
    let files = resolve_files(paths)?;
    let mut changed = 0;
    for path in &files {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let canonical = Document::from_markdown(&text).to_markdown();
        if canonical != text {
            fs::write(path, &canonical)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("formatted {}", path.display());
            changed += 1;
        }
    }
    println!("{changed} of {} files rewritten", files.len());
    Ok(())
}

fn check(paths: &[String]) -> Result<()> {
    let files = resolve_files(paths)?;
    let mut dirty = 0;
    for path in &files {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let canonical = Document::from_markdown(&text).to_markdown();
        if canonical != text {
            println!("not canonical: {}", path.display());
            dirty += 1;
        }
    }
    if dirty > 0 {
        eprintln!("{dirty} of {} files need formatting", files.len());
        process::exit(1);
    }
    println!("all {} files canonical", files.len());
    Ok(())
}

fn blocks(paths: &[String]) -> Result<()> {
    let [path] = paths else {
        eprintln!("Usage: blockmark blocks <path>");
        process::exit(1);
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let document = Document::from_markdown(&text);
    for (index, block) in document.iter().enumerate() {
        let text = block.text();
        let first_line = text.lines().next().unwrap_or("");
        println!(
            "{index:>4}  {:<9} {:>2}  {first_line}",
            block.kind.name(),
            block.indent
        );
    }
    Ok(())
}

/// Explicit paths if given, otherwise every markdown file under the
/// configured docs directory.
fn resolve_files(paths: &[String]) -> Result<Vec<PathBuf>> {
    if !paths.is_empty() {
        return Ok(paths.iter().map(PathBuf::from).collect());
    }
    match Config::load()? {
        Some(config) => {
            io::validate_docs_dir(&config.docs_path)
                .with_context(|| format!("docs path {}", config.docs_path.display()))?;
            Ok(io::scan_markdown_files(&config.docs_path)?)
        }
        None => bail!(
            "no paths given and no config file at {}",
            Config::config_path().display()
        ),
    }
}
