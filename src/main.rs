use anyhow::Context;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct CliArgs {
    api: Option<String>,
    name: Option<String>,
    logged_in: bool,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    init_logging()?;

    let mut settings = wrapped::config::load_settings()?;
    if let Some(api) = args.api {
        settings.api_base_url = api;
    }
    if let Some(name) = args.name {
        settings.display_name = name;
    }

    wrapped::app::run_with_startup(wrapped::app::AppStartupOptions {
        settings,
        logged_in: args.logged_in,
    })
}

fn init_logging() -> anyhow::Result<()> {
    wrapped::config::ensure_config_dir()?;
    let path = wrapped::config::log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wrapped=info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialise logging: {err}"))
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--api" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--api requires a base url");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--api cannot be empty");
                }
                out.api = Some(value.trim().to_string());
            }
            "--name" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--name requires a value");
                };
                out.name = Some(value.trim().to_string());
            }
            "--logged-in" => out.logged_in = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("monthlyWrapped");
    println!("  --api <url>       Listen-data service base url");
    println!("  --name <name>     Name used in the greeting");
    println!("  --logged-in       Start with an existing session");
}
