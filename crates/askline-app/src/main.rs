use anyhow::Result;
use clap::Parser;

mod cli;
mod repl;

use askline_api::ChatClient;
use askline_chat::ChatSession;
use askline_store::{FileStorage, HistoryStore, MemoryStorage, StorageBackend};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let client = ChatClient::new(&cli.api_url).verbose(cli.verbose);

    let backend: Box<dyn StorageBackend> = if cli.ephemeral {
        Box::new(MemoryStorage::new())
    } else {
        match FileStorage::default_dir() {
            Ok(storage) => Box::new(storage),
            Err(e) => {
                eprintln!("History disabled: {e}");
                Box::new(MemoryStorage::new())
            }
        }
    };

    let mut session = ChatSession::new(client, HistoryStore::new(backend));

    if let Some(question) = cli.ask.clone() {
        return repl::ask_once(&mut session, &question, cli.stream).await;
    }

    repl::run_repl(session, cli.stream).await
}
