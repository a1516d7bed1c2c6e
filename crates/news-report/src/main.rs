use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use shared::{
    collect_all_news, load_tools_file, summarize_news, Config, DailyReport, HtmlReportGenerator,
};

#[derive(Parser)]
#[command(name = "news-report")]
#[command(about = "Collect AI CLI tool news and generate bilingual HTML reports")]
struct Args {
    /// Path to the tools YAML config
    #[arg(long, default_value = "config/tools.yaml")]
    config: String,

    /// Directory the dated report files are written to
    #[arg(long, default_value = "docs/reports")]
    output_dir: String,

    /// How many days back to search for news
    #[arg(long, default_value = "1")]
    days_back: i64,

    /// Validate the config and exit without collecting or generating
    #[arg(long)]
    dry_run: bool,

    /// GitHub repository (owner/repo) linked from the report footer
    #[arg(long, default_value = "")]
    github_repo: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    println!("{}", "=".repeat(60));
    println!("AI CLI Tools News Report Generator");
    println!("{}", "=".repeat(60));
    println!("Date: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("Config: {}", args.config);
    println!("Output: {}", args.output_dir);
    println!("Days back: {}", args.days_back);
    println!("{}", "=".repeat(60));

    // A missing or malformed config file is fatal (exit code 1)
    let tools_file = load_tools_file(&args.config)?;

    println!("\nTarget tools ({}):", tools_file.tools.len());
    for tool in &tools_file.tools {
        println!("  - {} ({})", tool.name, tool.vendor);
    }

    if args.dry_run {
        println!("\n[Dry run] Exiting without generating report.");
        return Ok(());
    }

    let config = Config::from_env()?;

    println!("\n[Step 1] Collecting news with Gemini...");
    let news_items = collect_all_news(
        config.gemini_api_key,
        &tools_file.tools,
        args.days_back,
        tools_file.search.max_results_per_tool,
    )
    .await
    .context("News collection failed")?;
    println!("Collected {} news items", news_items.len());

    if news_items.is_empty() {
        println!("No news found. Creating empty report.");
    }

    println!("\n[Step 2] Summarizing with Claude...");
    let news_items = summarize_news(news_items, config.anthropic_api_key)
        .await
        .context("Summarization failed")?;
    println!("Summarized {} items", news_items.len());

    println!("\n[Step 3] Generating HTML reports...");
    let report = DailyReport::new(Local::now().date_naive(), news_items);
    let generator = HtmlReportGenerator::new(&args.output_dir, args.github_repo.as_str());
    let generated_files = generator
        .generate(&report, &["ja", "en"])
        .context("Report generation failed")?;

    println!("\nGenerated files:");
    for (lang, path) in &generated_files {
        println!("  - {}: {}", lang, path.display());
    }

    println!("\n{}", "=".repeat(60));
    println!("Done!");
    println!("{}", "=".repeat(60));

    Ok(())
}
