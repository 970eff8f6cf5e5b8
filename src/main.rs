#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dance_school::run().await
}
