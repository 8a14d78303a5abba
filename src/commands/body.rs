use anyhow::Result;
use colored::Colorize;
use trainday::types::{OutputFmt, emit};
use trainday::utils::coerce_weight;

use super::App;
use crate::cli::BodyWeightCmd;

pub async fn handle(cmd: Option<BodyWeightCmd>, app: &App, fmt: OutputFmt) -> Result<()> {
    let ctx = &app.ctx;

    match cmd {
        None => {
            let current = ctx.store.get_body_weight(&ctx.user).await?;
            emit(fmt, &current, || match &current {
                Some(bw) => println!(
                    "{} {} kg {}",
                    "Body weight:".cyan().bold(),
                    bw.weight,
                    format!("(since {})", bw.updated_at.format("%Y-%m-%d")).dimmed()
                ),
                None => println!("{}", "(no body weight recorded)".dimmed()),
            });
        }

        Some(BodyWeightCmd::Set { weight }) => {
            let value = coerce_weight(&weight);
            if value <= 0.0 {
                println!("{} body weight must be a positive number, got `{}`", "error:".red().bold(), weight);
                return Ok(());
            }
            ctx.store.set_body_weight(&ctx.user, value).await?;
            println!("{} body weight set to {} kg", "ok:".green().bold(), value);
        }
    }
    Ok(())
}
