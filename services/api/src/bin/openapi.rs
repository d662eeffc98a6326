//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI 3.0 document for the print service to `openapi.json`,
//! for clients that want the contract without a running server.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const OUTPUT_PATH: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let spec_json = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(OUTPUT_PATH, spec_json)?;
    println!("OpenAPI specification generated at {OUTPUT_PATH}");
    Ok(())
}
