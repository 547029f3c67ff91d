use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `level` 來自設定檔，RUST_LOG 優先
fn build_filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    let fallback = match (verbose, level) {
        (true, _) => "medscribe=debug,info".to_string(),
        (false, Some(level)) => format!("medscribe={}", level),
        (false, None) => "medscribe=info".to_string(),
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

pub fn init_cli_logger(verbose: bool, level: Option<&str>) {
    tracing_subscriber::registry()
        .with(build_filter(verbose, level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

pub fn init_json_logger(level: Option<&str>) {
    tracing_subscriber::registry()
        .with(build_filter(false, level))
        .with(
            // 保留 target，稽核事件可用 medscribe::audit 過濾
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
