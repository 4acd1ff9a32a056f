fn main() {
    let code = pkgrun::run_cli();
    if code != 0 {
        std::process::exit(code);
    }
}
