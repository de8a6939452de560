//! candymine - holder lookup and metadata re-upload for NFT collections
//!
//! Resolves the current holder of each token mint over Solana RPC, mines the
//! tokens and metadata of a collection into a database, uploads metadata
//! files to permanent storage through a bundler, and lists the effective
//! metadata link of every known token.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "candymine")]
#[command(about = "Holder lookup and metadata re-upload for NFT collections")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors (`--debug` wins)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file path (default: ./candymine.toml or ~/.config/candymine/config.toml)
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Milliseconds before the first retry of an item, doubled for each further retry
    #[arg(long, global = true)]
    retry_backoff_ms: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current holder of every mint read from stdin
    Holders(cmd::holders::HoldersArgs),
    /// Mine the tokens and metadata of a collection into the database
    Mine(cmd::mine::MineArgs),
    /// Upload every metadata file of a directory through a bundler
    Upload(cmd::upload::UploadArgs),
    /// Print the effective metadata URI of every token in the database
    Links(cmd::links::LinksArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let progress = candymine_core::ProgressContext::new();

    // Logging:
    //   TTY:     through the progress bridge so the spinner stays intact
    //   non-TTY: plain lines
    // Level: info, warn with --quiet, debug with --debug
    let multi = if progress.is_tty() {
        Some(progress.multi())
    } else {
        None
    };
    candymine_core::init_logging(cli.quiet, cli.debug, multi);
    candymine_core::install_signal_handlers()?;

    let config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };
    let retry = config.pacing.retry_policy(cli.retry_backoff_ms);

    match cli.command {
        Command::Holders(args) => cmd::holders::run(args, &config, retry, &progress),
        Command::Mine(args) => cmd::mine::run(args, &config, retry, &progress),
        Command::Upload(args) => cmd::upload::run(args, &config, retry, &progress),
        Command::Links(args) => cmd::links::run(args, &config),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec!["RPC URL", &config.rpc.url]);
            table.add_row(vec!["Bundler URL", &config.bundler.url]);
            table.add_row(vec!["Gateway URL", &config.bundler.gateway]);
            table.add_row(vec!["Chill", &format!("{}ms", config.pacing.chill_ms)]);
            table.add_row(vec![
                "Retries",
                &format!(
                    "{} (first backoff {}ms)",
                    retry.retries,
                    retry.min_backoff.as_millis()
                ),
            ]);
            table.add_row(vec![
                "Database",
                &config
                    .store
                    .db_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| format!("{} (mine and links)", candymine_store::DEFAULT_DB_PATH)),
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_flag_is_global() {
        let cli = Cli::try_parse_from(["candymine", "links", "-q"]).unwrap();
        assert!(cli.quiet);
        assert!(!cli.debug);

        let cli = Cli::try_parse_from(["candymine", "--quiet", "--debug", "config"]).unwrap();
        assert!(cli.quiet && cli.debug);

        let cli = Cli::try_parse_from(["candymine", "config"]).unwrap();
        assert!(!cli.quiet);
    }

    #[test]
    fn upload_requires_directory_and_key() {
        assert!(Cli::try_parse_from(["candymine", "upload", "-d", "meta"]).is_err());
        let cli = Cli::try_parse_from(["candymine", "upload", "-d", "meta", "-k", "wallet.json"]).unwrap();
        assert!(matches!(cli.command, Command::Upload(_)));
    }

    #[test]
    fn mine_passes() {
        let cli = Cli::try_parse_from(["candymine", "mine", "tokens", "-u", "Auth1", "-c", "0"]).unwrap();
        let Command::Mine(args) = cli.command else {
            panic!("expected mine");
        };
        assert_eq!(args.chill, Some(0));
        assert!(matches!(
            &args.pass,
            cmd::mine::MinePass::Tokens { update_authority } if update_authority == "Auth1"
        ));

        assert!(Cli::try_parse_from(["candymine", "mine", "tokens"]).is_err());
        let cli = Cli::try_parse_from(["candymine", "mine", "metadata", "--db-path", "x.db"]).unwrap();
        assert!(matches!(cli.command, Command::Mine(_)));
    }
}
