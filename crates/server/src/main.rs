#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shoptalk_server::start().await
}
