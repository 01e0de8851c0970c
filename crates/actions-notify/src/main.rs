use tokio::runtime::Runtime;
use clap::Parser;

use actions_notify::cli::{Cli, Commands};
use actions_notify::config::{Config, Settings};
use actions_notify::context::RunContext;
use actions_notify::logging;
use actions_notify::orchestrator::notify;

use tabled::{Table, Tabled};
use tabled::settings::{Style, Modify, Alignment, Padding, object::{Columns, Rows}};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let rt = Runtime::new()?;
    rt.block_on(async {
        match &cli.command {
            Commands::Notify { dry_run, .. } => {
                let config = Config::load(cli.config.clone())?;
                let settings = Settings::from_env(config);
                let ctx = RunContext::from_env(&cli.command.context_overrides())?;

                let report = notify(&settings, &ctx, *dry_run).await?;

                #[derive(Tabled)]
                struct Row {
                    #[tabled(rename = "job")]
                    job: String,
                    #[tabled(rename = "")]
                    icon: String,
                    #[tabled(rename = "conclusion")]
                    conclusion: String,
                    #[tabled(rename = "failed on")]
                    failed_step: String,
                }

                let rows: Vec<Row> = report
                    .results
                    .iter()
                    .map(|r| Row {
                        job: r.job.clone(),
                        icon: if r.passed {
                            "✅".to_string()
                        } else {
                            "❌".to_string()
                        },
                        conclusion: r.conclusion.clone(),
                        failed_step: r.failed_step.clone().unwrap_or_default(),
                    })
                    .collect();

                let mut table = Table::new(rows);
                table
                    .with(Style::modern())
                    .with(Modify::new(Columns::single(0)).with(Alignment::left()))
                    // Center the icon column, no padding
                    .with(Modify::new(Columns::single(1)).with(Alignment::center()))
                    .with(Modify::new(Columns::single(1)).with(Padding::zero()))
                    .with(Modify::new(Rows::new(0..)).with(Padding::new(1, 1, 0, 0)));

                eprintln!("{}", table);

                if *dry_run {
                    println!("{}", serde_json::to_string_pretty(&report.message)?);
                } else {
                    let summary = serde_json::json!({
                        "repository": ctx.repository.as_str(),
                        "run_id": ctx.run_id,
                        "delivered": report.delivered,
                        "results": report.results,
                    });
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
            }
            Commands::Version { json } => {
                if *json {
                    let info = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "commit": option_env!("GIT_SHA").unwrap_or("unknown"),
                        "build_date": option_env!("BUILD_DATE").unwrap_or("unknown"),
                    });
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    println!(
                        "actions-notify {} (commit: {}, built: {})",
                        env!("CARGO_PKG_VERSION"),
                        option_env!("GIT_SHA").unwrap_or("unknown"),
                        option_env!("BUILD_DATE").unwrap_or("unknown"),
                    );
                }
            }
        }
        Ok(())
    })
}
