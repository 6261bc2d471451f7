use clap::Parser;
use esched_cli::cli_args::Cli;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = esched_cli::run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
