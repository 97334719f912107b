//! Write the HTTP query surface's OpenAPI document as JSON
//!
//! Usage:
//!   export_openapi                        # to stdout
//!   export_openapi --output docs/api.json

use anyhow::Context;
use flight_handoff::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let output_path = match args.get(1).map(String::as_str) {
        Some("--output") => Some(
            args.get(2)
                .context("--output needs a file path")?
                .as_str(),
        ),
        _ => None,
    };

    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialize OpenAPI document")?;

    match output_path {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("Failed to write {}", path))?;
            eprintln!("OpenAPI document written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
