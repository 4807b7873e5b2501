fn main() {
    if let Err(e) = plantid::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
