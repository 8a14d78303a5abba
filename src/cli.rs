use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "trainday", version, about = "Daily workout plans, a per-exercise stopwatch and your training log")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show today's workout
    #[command(visible_alias = "t")]
    Today,

    /// Session-scoped commands
    #[command(subcommand, visible_alias = "s")]
    Session(SessionCmd),

    /// Inspect or check workout plans
    #[command(subcommand, visible_alias = "p")]
    Plan(PlanCmd),

    /// List stored training records
    #[command(visible_alias = "h")]
    History {
        /// Only show the last N records
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the best weight per exercise
    #[command(visible_alias = "pr")]
    Records,

    /// Show weekly, monthly and total training time
    Status {
        /// Time period in weeks, 1 to 520 (defaults to 8)
        #[arg(short, long, default_value = "8", value_parser = clap::value_parser!(u32).range(1..=520))]
        weeks: u32,

        /// Show graph of weekly minutes
        #[arg(short, long)]
        graph: bool,
    },

    /// Show trained days in a calendar view
    #[command(visible_alias = "cal")]
    Calendar {
        /// Year to show (defaults to current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month to show (1-12, defaults to current month)
        #[arg(short, long)]
        month: Option<u32>,
    },

    /// Show or set body weight
    #[command(visible_alias = "bw")]
    BodyWeight(BodyWeightArgs),

    /// View or edit trainday config
    #[command(subcommand)]
    Config(ConfigCmd),
}

#[derive(Subcommand)]
pub enum SessionCmd {
    /// Start a session for today (or another weekday)
    #[command(visible_alias = "s")]
    Start(StartArgs),

    /// Show current session details
    #[command(visible_alias = "i")]
    Show,

    /// Time an exercise of the current session - Usage: session exercise <INDEX|NAME>
    #[command(visible_alias = "e", trailing_var_arg = true)]
    Exercise {
        /// 1-based index (as shown in `session show`) or exercise name
        #[arg(value_name = "EXERCISE", required = true)]
        exercise: Vec<String>,
    },

    /// Save the current session
    End,

    /// Discard the current session
    #[command(visible_alias = "c")]
    Cancel,
}

#[derive(Args)]
pub struct StartArgs {
    /// Weekday whose workout to load (defaults to today)
    #[arg(short, long)]
    pub day: Option<String>,
}

#[derive(Subcommand)]
pub enum PlanCmd {
    /// Show the weekly schedule and every category
    #[command(visible_alias = "s")]
    Show,

    /// Validate a plan file
    Check { file: PathBuf },
}

#[derive(Args)]
pub struct BodyWeightArgs {
    #[command(subcommand)]
    pub cmd: Option<BodyWeightCmd>,
}

#[derive(Subcommand)]
pub enum BodyWeightCmd {
    /// Record a new body weight in kg
    Set { weight: String },
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_weeks(args: &[&str]) -> Result<u32, clap::Error> {
        let cli = Cli::try_parse_from(args)?;
        match cli.cmd {
            Commands::Status { weeks, .. } => Ok(weeks),
            _ => panic!("expected the status command"),
        }
    }

    #[test]
    fn test_status_weeks_is_bounded() {
        assert_eq!(status_weeks(&["trainday", "status"]).unwrap(), 8);
        assert_eq!(status_weeks(&["trainday", "status", "--weeks", "520"]).unwrap(), 520);
        assert!(status_weeks(&["trainday", "status", "--weeks", "0"]).is_err());
        assert!(status_weeks(&["trainday", "status", "--weeks", "521"]).is_err());
        assert!(status_weeks(&["trainday", "status", "--weeks", "4294967295"]).is_err());
    }
}
