use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "statushd")]
#[command(about = "HD status-video converter service", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Port to bind the HTTP server to (default: 5000)
    #[arg(short, long)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Print version information
    Version,
    /// Check that the ffmpeg transcoder is installed and responding
    Probe,
}
