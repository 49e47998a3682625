//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = tileprep_cli::run() {
        eprintln!("tileprep: {err}");
        std::process::exit(1);
    }
}
