use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    tale_launcher_lib::run().await
}
