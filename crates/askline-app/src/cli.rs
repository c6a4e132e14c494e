use clap::Parser;

/// CLI arguments for askline
#[derive(Parser)]
#[command(name = "askline")]
#[command(about = "Askline - terminal chat for a question-answering assistant service")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Base URL of the assistant service
    #[arg(
        long,
        value_name = "URL",
        env = "ASKLINE_API_URL",
        default_value = "http://127.0.0.1:8000"
    )]
    pub api_url: String,

    /// Stream responses incrementally instead of waiting for the full reply
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub stream: bool,

    /// Log request/response traffic to the console
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,

    /// Keep history in memory only (skip the on-disk store)
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub ephemeral: bool,

    /// Ask a single question and exit instead of starting the REPL
    #[arg(long, value_name = "TEXT")]
    pub ask: Option<String>,
}
