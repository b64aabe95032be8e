//! profile-probe entry point.

use clap::{CommandFactory, Parser};

use profile_probe::{resolve_config, HttpConnectionSource};
use profile_probe_cli::interactive::{self, TerminalPrompt};
use profile_probe_cli::{execute, logging, Action, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "profile-probe", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = resolve_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    logging::init(&config.log)?;

    let (target, action) = if cli.interactive {
        let mut prompt = TerminalPrompt::new()?;
        interactive::collect(&mut prompt)?
    } else {
        match cli.target() {
            Some(target) => (target, Action::Profile),
            None => {
                let mut cmd = Cli::command();
                eprintln!("{}", cmd.render_usage());
                std::process::exit(2);
            }
        }
    };

    let mut stdout = std::io::stdout();
    let result = execute(
        target,
        action,
        config,
        &HttpConnectionSource,
        cli.json,
        &mut stdout,
    )
    .await;

    // 0 = every operation succeeded, 1 = session rejected or an operation failed.
    match result {
        Ok(summary) if summary.is_success() => Ok(()),
        Ok(summary) => {
            tracing::error!(
                "{} of {} operation(s) failed",
                summary.failed,
                summary.operations
            );
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("  Error: {e:#}");
            std::process::exit(1);
        }
    }
}
