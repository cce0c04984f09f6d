//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    env_logger::init();
    if let Err(err) = borefence_cli::run() {
        eprintln!("borefence: {err}");
        std::process::exit(1);
    }
}
