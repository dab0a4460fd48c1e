fn main() {
    if let Err(err) = act_companion::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
