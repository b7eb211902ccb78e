use anyhow::{Context, Result};
use pitchlens_config::{config_path, ensure_workspace_config, validate_config};
use pitchlensd::cli::{Cli, parse_cli};
use pitchlensd::commands::run_command;
use pitchlensd::logging::init_logging;

fn main() -> Result<()> {
    let cli = parse_cli();
    init_logging(cli.log_format)?;
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let workspace = cli.workspace.canonicalize().with_context(|| {
        format!(
            "failed to resolve workspace path {}",
            cli.workspace.display()
        )
    })?;

    let config = ensure_workspace_config(&workspace).with_context(|| {
        format!(
            "failed to load or create workspace config at {}",
            config_path(&workspace).display()
        )
    })?;
    for warning in validate_config(&config) {
        tracing::warn!(code = warning.code, "{}", warning.message);
    }

    let mut out = std::io::stdout().lock();
    run_command(&workspace, &config, cli.command, cli.output, &mut out)
}
