fn main() -> Result<(), Box<dyn std::error::Error>> {
    chabeau_sidebar::cli::main()
}
