use clap::Parser;
use pagecheck_cli::Cli;
use pagecheck_cli::URL_ENV_VAR;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let env_url = std::env::var(URL_ENV_VAR).ok();
    let Some(target) = pagecheck_cli::resolve_target_url(cli.url.as_deref(), env_url.as_deref())
    else {
        println!("no target URL given and {URL_ENV_VAR} is unset; skipping verification");
        return ExitCode::SUCCESS;
    };

    if let Err(e) = url::Url::parse(&target) {
        eprintln!("pagecheck: invalid target URL `{target}`: {e}");
        return ExitCode::from(2);
    }

    let quiet_console = cli.quiet_console;
    let config = cli.into_run_config(target);
    let result = pagecheck_harness::run(&config).await;

    match &result {
        Ok(summary) => pagecheck_cli::print_summary(summary, quiet_console),
        Err(e) => eprintln!("pagecheck: {e}"),
    }

    ExitCode::from(pagecheck_harness::exit_code(&result))
}

fn init_tracing() {
    // Fall back to the default filter if the environment variable is unset
    // or contains an invalid value.
    let default_level = "info";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
