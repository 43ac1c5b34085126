use clap::Parser;

use yanger::cli::IwCli;
use yanger::commands;

fn main() {
    let cli = IwCli::parse();

    if let Err(err) = commands::iw(&cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}
