use clap::Parser;
use splat_pipeline::cli::Args;
use splat_pipeline::config::PipelineConfig;
use splat_pipeline::tools::runner::SystemRunner;
use splat_pipeline::workflow::Pipeline;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // コマンドライン引数を解析します (引数不足などは終了コード1)
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(args.log_level());

    let config = match PipelineConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("エラー: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match Pipeline::new(&config, &SystemRunner).run() {
        Ok(report) => {
            println!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("エラー: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// ログは stderr に出し、stdout は最終結果の表示だけに使います。
fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
