use std::process::ExitCode;

use vq_score::cli::parse_cli;
use vq_score::logging::init_tracing;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    let (cli, sources) = parse_cli();
    init_tracing(cli.log_json);
    match vq_score::run(cli, sources).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
