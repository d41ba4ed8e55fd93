fn main() {
    if let Err(err) = qc_report::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
