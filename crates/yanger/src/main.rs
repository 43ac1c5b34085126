use clap::Parser;

use yanger::cli::Cli;
use yanger::commands;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = commands::collect(&cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
