use pondsensors::service::main::run_service;

#[tokio::main]
async fn main() {
    run_service().await;
}
