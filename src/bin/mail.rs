pub use basemail::mail::handler;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    basemail::setup_logging();
    lambda_runtime::run(lambda_runtime::service_fn(handler)).await
}
