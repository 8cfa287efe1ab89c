use clap::{Parser, Subcommand};

/// Sync Athena query results into BigQuery Silver tables.
#[derive(Parser, Debug)]
#[command(name = "silver-sync", version, about = "Sync Athena query results into BigQuery Silver tables")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server; `GET /` triggers a run (default)
    Serve,
    /// Execute one pipeline run and exit
    Run,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_default() {
        let args = CliArgs::try_parse_from(["silver-sync"]).unwrap();
        assert_eq!(args.command(), Command::Serve);
    }

    #[test]
    fn run_subcommand() {
        let args = CliArgs::try_parse_from(["silver-sync", "run"]).unwrap();
        assert_eq!(args.command(), Command::Run);
        assert!(CliArgs::try_parse_from(["silver-sync", "export"]).is_err());
    }
}
