#[tokio::main]
async fn main() -> std::io::Result<()> {
    curling_server::run_with_config().await
}
