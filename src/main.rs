fn main() {
    if let Err(err) = blockboard::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
