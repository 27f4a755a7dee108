use clap::Parser;
use debate_chat::app::{self, Args};
use debate_chat::utils::RUNTIME;

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init()
        .ok();

    if let Err(e) = RUNTIME.block_on(app::run(args)) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
