fn main() {
    if let Err(error) = pollen_annotator::cli::run(std::env::args_os()) {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}
