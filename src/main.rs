//! matchscraper CLI binary.
//!
//! All logic is in the library; main.rs only invokes cli::run() and maps
//! the result to a process exit code.

#[tokio::main]
async fn main() {
    let code = matchscraper::cli::run().await;
    std::process::exit(code.as_i32());
}
