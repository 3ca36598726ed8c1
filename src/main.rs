use registry_endpoints::cli::{Args, Runner};
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    let runner = match Runner::new(args) {
        Ok(runner) => runner,
        Err(e) => {
            eprintln!("❌ ERROR: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runner.run().await {
        runner.logger().error(&e.to_string());
        process::exit(1);
    }
}
