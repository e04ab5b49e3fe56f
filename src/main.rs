fn main() {
    minilimit::cli::run();
}
