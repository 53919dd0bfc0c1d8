use clap::Parser;

use nestegg::api::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(msg) = api::run(cli).await {
        eprintln!("{msg}");
        std::process::exit(1);
    }
}
