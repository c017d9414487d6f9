use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = blogstore_cli::run(std::env::args().collect()).await {
        if e.downcast_ref::<blogstore::PoolFault>().is_some() {
            eprintln!("{e}");
            std::process::exit(blogstore::POOL_FAULT_EXIT_CODE);
        }
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
