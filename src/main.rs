#[tokio::main]
async fn main() {
    if let Err(e) = kubepulse::run().await {
        eprintln!("[kubepulse] {}", e);
        std::process::exit(1);
    }
}
