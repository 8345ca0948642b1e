//! Prints the sensor weight API's OpenAPI document.
//!
//!   generate_openapi                      # pretty JSON to stdout
//!   generate_openapi --output api.json    # write to a file
//!   generate_openapi --compact            # single-line JSON

use std::{env, fs, io::Write, path::PathBuf};

use anyhow::{Context, Result};
use sensor_weight_service::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let compact = args.iter().any(|a| a == "--compact");
    let output = args
        .windows(2)
        .find(|w| w[0] == "--output")
        .map(|w| PathBuf::from(&w[1]));

    let doc = ApiDoc::openapi();
    let json = if compact {
        doc.to_json()
    } else {
        doc.to_pretty_json()
    }
    .context("failed to serialise OpenAPI document")?;

    match output {
        Some(path) => {
            fs::write(&path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("OpenAPI document written to {}", path.display());
        }
        None => std::io::stdout()
            .write_all(json.as_bytes())
            .context("failed to write to stdout")?,
    }
    Ok(())
}
