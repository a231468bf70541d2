use clap::Parser;
use linepool::adapter::inbound::cli::command::Cli;
use linepool::adapter::inbound::cli::{dispatch, output};
use linepool::error::ErrorClass;
use linepool::infrastructure::operator::entry::Operator;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));

    if let Err(e) = dispatch::execute(cli, &Operator).await {
        output::error(&e.to_string());
        let code = match e.class() {
            ErrorClass::Validation => 2,
            ErrorClass::Conflict => 3,
            ErrorClass::Transient => 4,
            ErrorClass::Integrity => 5,
        };
        std::process::exit(code);
    }
}
