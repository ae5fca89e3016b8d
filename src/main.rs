#[tokio::main]
async fn main() {
    carta::start_server().await;
}
