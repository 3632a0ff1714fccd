//! CLI argument parsing and structure definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Divide a grocery receipt between housemates
#[derive(Parser, Debug)]
#[command(name = "divvy")]
#[command(
    author,
    version,
    about = "Divide a grocery receipt between housemates",
    long_about = r#"
divvy - split a digital grocery receipt item by item

WORKFLOW:
  1. Register the shoppers once (they are remembered between runs)
  2. Scan a receipt text file (one receipt line per line)
  3. Step through the items and give each to a shopper or the shared pool
  4. Pick who paid; everybody else is told what they owe

ALLOCATION COMMANDS:
  p            previous item
  n            next item
  a <name>     give the current item to <name>
  pool         put the current item back in the shared pool
  s            submit
  x            cancel

EXAMPLES:
  divvy
  divvy scan receipt.txt --json
  divvy split receipt.txt --with ann,bob --payer ann
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file (defaults to divvy.toml in the platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Shopper ledger file (overrides the config)
    #[arg(long, global = true, value_name = "PATH")]
    pub ledger: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a receipt and print its items
    Scan(ScanArgs),

    /// Allocate and settle one receipt
    Split(SplitArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Receipt text file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the receipt as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Receipt text file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Shoppers sharing this receipt (at least two)
    #[arg(long = "with", value_delimiter = ',', required = true, value_name = "NAMES")]
    pub with: Vec<String>,

    /// Who paid (defaults to the first name in --with)
    #[arg(long)]
    pub payer: Option<String>,

    /// Print the settlement report as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_runs_menu() {
        let cli = Cli::try_parse_from(["divvy", "--ledger", "/tmp/l.txt"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.ledger, Some(PathBuf::from("/tmp/l.txt")));
    }

    #[test]
    fn test_split_args() {
        let cli = Cli::try_parse_from([
            "divvy",
            "split",
            "receipt.txt",
            "--with",
            "ann,bob",
            "--payer",
            "bob",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Split(args)) => {
                assert_eq!(args.with, vec!["ann", "bob"]);
                assert_eq!(args.payer.as_deref(), Some("bob"));
                assert!(!args.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_split_requires_participants() {
        assert!(Cli::try_parse_from(["divvy", "split", "receipt.txt"]).is_err());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
