//! services/api/src/bin/openapi.rs
//!
//! Dumps the OpenAPI 3.0 description of the analysis service so frontend
//! tooling can consume it without a running server. Takes an optional output
//! path; defaults to `openapi.json` in the working directory.

use api_lib::web::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    std::fs::write(&path, ApiDoc::openapi().to_pretty_json()?)?;
    println!("Wrote the analysis service API description to {path}");
    Ok(())
}
