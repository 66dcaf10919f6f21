// src/main.rs

use testwatch::types::ERROR_EXIT_CODE;
use testwatch::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("testwatch error: {err:?}");
            std::process::exit(ERROR_EXIT_CODE);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    let exit = run(args).await?;
    Ok(exit.map_or(0, |e| e.exit_code()))
}
