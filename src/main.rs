fn main() {
    if let Err(err) = sales_analyzer::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
