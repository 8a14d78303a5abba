use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, PlanCmd};
use commands::App;
use trainday::logging;
use trainday::types::OutputFmt;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init();
    let fmt = OutputFmt::from_flag(cli.json);

    // These never need the database.
    let cmd = match cli.cmd {
        Commands::Config(cmd) => return commands::config::handle(cmd, fmt),
        Commands::Plan(PlanCmd::Check { file }) => return commands::plan::handle_check(&file, fmt),
        other => other,
    };

    let app = App::load().await?;

    match cmd {
        Commands::Today => commands::plan::handle_today(&app, fmt)?,
        Commands::Session(cmd) => commands::session::handle(cmd, &app, fmt).await?,
        Commands::Plan(_) => commands::plan::handle_show(&app, fmt)?,
        Commands::History { limit } => commands::history::handle_history(&app, limit, fmt).await?,
        Commands::Records => commands::history::handle_records(&app, fmt).await?,
        Commands::Status { weeks, graph } => commands::status::handle_status(&app, weeks, graph, fmt).await?,
        Commands::Calendar { year, month } => commands::calendar::handle(&app, year, month, fmt).await?,
        Commands::BodyWeight(args) => commands::body::handle(args.cmd, &app, fmt).await?,
        Commands::Config(_) => {}
    }

    Ok(())
}
