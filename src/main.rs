use clap::Parser;

/// Vibe Check - streaming product idea analysis server
#[derive(Parser, Debug)]
#[command(name = "vibe-check")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port to bind the server to
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind the server to
    #[arg(long, env = "BIND")]
    bind: Option<String>,

    /// Directory with the static frontend
    #[arg(long, env = "PUBLIC_DIR")]
    public_dir: Option<String>,
}

fn main() {
    // A missing .env file is fine; variables may come from the real environment
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if dotenv_loaded {
        log::debug!("Loaded variables from .env");
    }

    if let Err(e) = run(cli) {
        eprintln!("❌  {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    use anyhow::Context;
    use vibe_check_lib::server::{self, ServerAppState};
    use vibe_check_lib::shutdown::{register_signal_handlers, ShutdownState};
    use vibe_check_lib::AppConfig;

    let mut config = AppConfig::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(public_dir) = cli.public_dir {
        config.public_dir = public_dir;
    }

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    rt.block_on(async {
        let shutdown_state = ShutdownState::new();
        if let Err(e) = register_signal_handlers(shutdown_state.clone()) {
            log::warn!("Failed to register signal handlers: {}", e);
        }

        let state = ServerAppState::from_config(&config, shutdown_state);

        server::run_server(&config, state)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    })
}
