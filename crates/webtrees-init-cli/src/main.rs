use tracing::error;
use webtrees_init_cli::{run_cli, CliError};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    match run_cli().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            match &e {
                // Logging is not up when its own setup failed
                CliError::InvalidArgument { .. } => eprintln!("webtrees-init: {}", e),
                _ => error!("{}", e),
            }

            std::process::exit(e.exit_code());
        }
    }
}
