use clap::Parser;
use agenda::cli::commands::Cli;
use agenda::cli::handlers;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = handlers::run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
