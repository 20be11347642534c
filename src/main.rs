mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{AnalyzeArgs, Cli, Commands, InfoArgs, SplitArgs};
use pdf_splitter::{
    analyze_document, split_document, write_manifest, ContentFetcher, DocumentAnalysis,
    DocumentInfo, PdfSplitterError, Result, SplitJob, SplitOptions, SplitResult,
};
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Lists longer than this are truncated in human output.
const DISPLAY_LIMIT: usize = 10;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; --verbose wins over RUST_LOG
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Info(args) => handle_info_command(args).await,
        Commands::Analyze(args) => handle_analyze_command(args).await,
        Commands::Split(args) => handle_split_command(args, &cli.output).await,
    };

    if let Err(e) = result {
        error!("Operation failed: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }

    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

async fn handle_info_command(args: &InfoArgs) -> Result<()> {
    let (document, source) = ContentFetcher::load_document(&args.source).await?;
    let mut info = DocumentInfo::from_source(&document);
    info.file = source.location;

    if args.json {
        print_json(&info)
    } else {
        println!("{}", info.display_text());
        Ok(())
    }
}

async fn handle_analyze_command(args: &AnalyzeArgs) -> Result<()> {
    let (document, _) = ContentFetcher::load_document(&args.source).await?;
    let analysis = analyze_document(&document);

    if args.json {
        return print_json(&analysis.to_json());
    }

    display_analysis(&args.source, &analysis);
    Ok(())
}

async fn handle_split_command(args: &SplitArgs, output_dir: &Path) -> Result<()> {
    let strategy = args.strategy()?;
    let (document, _) = ContentFetcher::load_document(&args.source).await?;

    let options = SplitOptions {
        strategy,
        max_pages: args.max_pages,
        max_tokens: args.max_tokens,
        output_dir: output_dir.to_path_buf(),
        preserve_metadata: !args.no_preserve_metadata,
        write_manifest: !args.no_manifest,
    };
    debug!(
        "Estimated page budget per split: {}",
        options.effective_page_limit()
    );

    let analysis = analyze_document(&document);

    let mut job = SplitJob::new(&document, &analysis, &options);
    if !args.json {
        job = job.with_progress(|update| {
            match (update.current, update.total) {
                (Some(current), Some(total)) => {
                    println!("{} ({}/{})", update.message, current, total)
                }
                _ => println!("{}", update.message),
            }
            Ok(())
        });
    }
    let result = split_document(&mut job)?;

    if options.write_manifest && !result.is_failure() {
        write_manifest(&result, &options.output_dir)?;
    }

    if args.json {
        print_json(&result.to_json())?;
    } else {
        display_split_result(&result, &options);
    }

    if result.is_failure() {
        return Err(PdfSplitterError::SplitFailed {
            reason: result.errors().join("; "),
        });
    }
    if result.is_partial_success() {
        return Err(anyhow::anyhow!(
            "{} of {} sections failed",
            result.errors().len(),
            result.errors().len() + result.split_count()
        )
        .into());
    }

    info!("Split operation completed successfully!");
    Ok(())
}

fn display_analysis(source: &str, analysis: &DocumentAnalysis) {
    println!("PDF Structure Analysis");
    println!("{}", "=".repeat(50));

    let metadata = analysis.metadata();
    println!("\nDocument Metadata:");
    println!("  File: {}", source);
    println!("  Pages: {}", metadata.pages);
    println!("  Title: {}", metadata.title);
    println!("  Author: {}", metadata.author);
    println!("  PDF Version: {}", metadata.pdf_version);

    if analysis.has_bookmarks() {
        let bookmarks = analysis.bookmarks();
        println!("\nBookmark Structure:");
        println!("  Found {} bookmarks", bookmarks.len());
        for bookmark in truncated(bookmarks, 20) {
            println!("{}", bookmark.display_text(1));
        }
    }

    if analysis.has_toc() {
        let entries = analysis.toc_entries();
        println!("\nTable of Contents:");
        println!("  Found {} TOC entries", entries.len());
        for entry in truncated(entries, 15) {
            println!("{}", entry.display_text(entry.level));
        }
    }

    let headers = analysis.headers();
    if !headers.is_empty() {
        println!("\nContent Patterns:");
        println!("  Found {} header patterns", headers.len());
        for header in truncated(&headers, 15) {
            println!("{}", header.display_text(header.level));
        }
    }

    let recommendation = analysis.recommendation();
    println!("\nRecommendations:");
    println!("  Primary Strategy: {}", recommendation.primary_strategy);
    println!("  Confidence: {:.0}%", recommendation.confidence * 100.0);
    println!("  Reasoning: {}", recommendation.reasoning);
    if !recommendation.fallback_strategies.is_empty() {
        let fallbacks: Vec<&str> = recommendation
            .fallback_strategies
            .iter()
            .map(|s| s.as_str())
            .collect();
        println!("  Fallback Strategies: {}", fallbacks.join(", "));
    }
}

/// All items when there are at most `limit`, else the first few with a note.
fn truncated<T>(items: &[T], limit: usize) -> &[T] {
    if items.len() <= limit {
        return items;
    }
    println!(
        "  (Showing first {} - use --json for the complete list)",
        DISPLAY_LIMIT
    );
    &items[..DISPLAY_LIMIT]
}

fn display_split_result(result: &SplitResult, options: &SplitOptions) {
    println!("PDF Splitting Results");
    println!("{}", "=".repeat(50));

    println!("\nSource: {}", result.source_file());
    println!("Strategy: {}", result.strategy_used());
    println!("Total Pages: {}", result.total_pages());
    println!("Output Directory: {}", options.output_dir.display());

    if result.is_success() {
        println!("\nCreated {} split files:", result.split_count());
        for (idx, file) in result.output_files().iter().enumerate() {
            let name = file
                .filename
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!("  {}. {} ({} pages)", idx + 1, name, file.pages);
            println!("     Pages: {}", file.page_range);
            if let Some(title) = &file.section_title {
                println!("     Title: {}", title);
            }
        }
    } else if result.is_partial_success() {
        println!(
            "\nPartially successful - created {} files with errors:",
            result.split_count()
        );
        for error in result.errors() {
            println!("  ✗ {}", error);
        }
    } else {
        println!("\nSplit failed:");
        for error in result.errors() {
            println!("  - {}", error);
        }
    }

    println!("\n{}", result.summary());
}
