fn main() {
    if let Err(err) = datachat::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
