//! Quick-start examples for the Meditrail Rust SDK.
//!
//! Run with:
//!   MEDITRAIL_API_KEY=mt_... cargo run --example quickstart
//!
//! Set `RUST_LOG=meditrail=debug` to see each request as it is sent.

use std::path::Path;

use meditrail::{ApiErrorKind, ClientBuilder, UploadRequest};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> meditrail::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // -----------------------------------------------------------------------
    // 1. Create a client (reads MEDITRAIL_API_KEY from environment)
    // -----------------------------------------------------------------------
    let client = ClientBuilder::new().build()?;

    // Or provide the key directly:
    // let client = meditrail::Client::new("mt_live_abc123")?;

    // -----------------------------------------------------------------------
    // 2. Process a medical image with an annotation and an extraction hint
    // -----------------------------------------------------------------------
    println!("=== Example 1: Processing Medical Image ===");
    let image = Path::new("sample_files/chest_xray.jpg");
    if image.exists() {
        match client
            .submit(
                image,
                Some("Chest X-ray examination"),
                Some("Extract key clinical findings and abnormalities"),
            )
            .await
        {
            Ok(result) => {
                println!("Success! Document ID: {}", result.id);
                println!("Clinical Relevance: {}", result.clinical_relevance);
                println!("Doctor Names: {}", result.doctor_names);

                // The `response` field is a JSON document encoded as a string.
                let extracted = result.response_json().unwrap_or_default();
                println!("Document Type: {}", extracted["document_type"].as_str().unwrap_or("N/A"));
                println!("Summary: {}", extracted["summary"].as_str().unwrap_or("N/A"));

                println!("Original File: {}", result.metadata.original_file_name);
                println!("File Size: {}", result.metadata.file_size);
                println!("Page Count: {}", result.metadata.page_count);
            }
            Err(err) => println!("Error processing document: {err}"),
        }
    } else {
        println!("Sample file not found: {}", image.display());
        println!("Please add a sample medical document to test with.");
    }

    println!("\n{}\n", "=".repeat(50));

    // -----------------------------------------------------------------------
    // 3. Process a PDF using a prepared request
    // -----------------------------------------------------------------------
    println!("=== Example 2: Processing PDF Document ===");
    let request = UploadRequest::new("sample_files/prescription.pdf")
        .text("Prescription document")
        .system_prompt("Extract medication names, dosages, and doctor information");

    match client.submit_request(request).await {
        Ok(result) => {
            println!("Success! Document ID: {}", result.id);
            println!("Clinical Relevance: {}", result.clinical_relevance);

            let extracted = result.response_json().unwrap_or_default();
            println!("Document Type: {}", extracted["document_type"].as_str().unwrap_or("N/A"));
            println!("Summary: {}", extracted["summary"].as_str().unwrap_or("N/A"));
        }
        Err(err) if err.api_kind() == Some(ApiErrorKind::UsageLimitExceeded) => {
            println!("Usage limit reached, try again later: {err}");
        }
        Err(err) => println!("Error processing document: {err}"),
    }

    Ok(())
}
