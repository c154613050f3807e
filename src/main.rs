use std::process;

fn main() {
    if let Err(err) = bootguard::app::run() {
        eprintln!("fatal: {err}");
        process::exit(1);
    }
}
