#![forbid(unsafe_code)]

use std::process;

#[tokio::main]
async fn main() {
    let result = nts_ke::nts_ke_main().await;
    if let Err(e) = &result {
        eprintln!("nts-ke: {e}");
    }
    process::exit(if result.is_ok() { 0 } else { 1 });
}
