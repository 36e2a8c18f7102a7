//! haggle CLI binary

use anyhow::Context;
use clap::Parser;
use haggle::cli::{BatchReport, Cli, Commands, HaggleApp, OutputArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            scenario,
            output,
            llm,
        } => {
            let app = HaggleApp::new(Some(&llm)).context("failed to set up message service")?;
            app.abort_on_ctrl_c();

            let report = app
                .run_files(std::slice::from_ref(&scenario))
                .await
                .with_context(|| format!("scenario {}", scenario.display()))?;
            print_report(&report, &output, true)?;
        }

        Commands::Batch {
            scenarios,
            output,
            llm,
        } => {
            let app = HaggleApp::new(Some(&llm)).context("failed to set up message service")?;
            app.abort_on_ctrl_c();

            let report = app.run_files(&scenarios).await.context("batch run failed")?;
            print_report(&report, &output, true)?;
        }

        Commands::Sweep {
            scenario,
            count,
            seed,
            output,
        } => {
            let app = HaggleApp::new(None)?;
            app.abort_on_ctrl_c();

            let report = app
                .sweep(&scenario, count, seed)
                .await
                .with_context(|| format!("sweep of {}", scenario.display()))?;
            print_report(&report, &output, false)?;
        }
    }

    Ok(())
}

fn print_report(report: &BatchReport, output: &OutputArgs, with_history: bool) -> anyhow::Result<()> {
    if output.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text(with_history));
    }
    Ok(())
}
