mod bootstrap;
mod cli;
mod paths;
mod run;
mod session;

use anyhow::Result;

fn main() -> Result<()> {
    let args = cli::parse();
    run::run(args)
}
