#[tokio::main]
async fn main() {
    presence::start_server().await;
}
