use clap::Parser;
use rebench_cli::{cmd::GlobalArgs, util};
use rebench_core::memory::TrackingAllocator;

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

#[tokio::main]
async fn main() {
    let app = GlobalArgs::try_parse().unwrap_or_else(|e| {
        // --help and --version are printed to stdout and are not failures.
        let code = if e.use_stderr() { 1 } else { 0 };
        let _ = e.print();
        std::process::exit(code);
    });
    util::init_logger(app.verbose);

    app.exec().await.unwrap_or_else(|e| {
        eprintln!("Error: {:#}", e);
        std::process::exit(e.exit_code());
    });
}
