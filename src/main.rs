use anyhow::Result;
use clap::Parser;
use statushd::{
    app,
    cli::{Cli, CliCommand},
    config::Settings,
    transcode,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut settings = Settings::default();
    if let Some(port) = cli.port {
        settings.port = port;
    }

    match cli.command {
        Some(CliCommand::Version) => {
            println!("StatusHD {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(CliCommand::Probe) => {
            match transcode::detect(settings.transcoder_path.as_deref()).await {
                Some(bin) => println!("FFmpeg available: {}", bin.display()),
                None => {
                    eprintln!("FFmpeg is not installed or not responding");
                    std::process::exit(1);
                }
            }
            return Ok(());
        }
        None => {}
    }

    app::run_service(settings).await
}
