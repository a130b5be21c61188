use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use jm_scraper::{handle_command, init_logging, RunSummary, ScraperArgs};

#[derive(Parser, Debug)]
#[command(
    name = "juejin-md",
    author,
    version,
    about = "Save juejin.cn articles and their top comments as Markdown files"
)]
struct Cli {
    #[command(flatten)]
    scrape: ScraperArgs,

    /// Log every extraction step
    #[arg(short, long)]
    verbose: bool,
}

fn print_summary(summary: &RunSummary) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(
        out,
        "\n📦 {} saved, {} failed",
        summary.saved_count(),
        summary.failed_count()
    )?;
    for (url, path) in summary.saved() {
        writeln!(out, "  ✅ {} -> {}", url, path.display())?;
    }
    for (url, reason) in summary.failed() {
        writeln!(out, "  ❌ {}: {}", url, reason)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let log = init_logging(cli.verbose);

    match handle_command(cli.scrape, &log).await {
        Ok(summary) => {
            print_summary(&summary)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            log.error(&format!("Could not start the browser: {}", e));
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_no_urls_is_a_usage_error() {
        let err = Cli::try_parse_from(["juejin-md"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_verbose_and_urls() {
        let cli = Cli::try_parse_from(["juejin-md", "-v", "https://juejin.cn/post/1"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.scrape.urls, vec!["https://juejin.cn/post/1".to_string()]);
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
