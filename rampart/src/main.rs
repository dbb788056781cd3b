use clap::Parser;
use rampart::cli::CliArgs;

pub fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    args.run()
}
