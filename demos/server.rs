use actix_web::{web, App, HttpResponse, HttpServer};
use safeher_core::positioning::Fix;
use serde_json::json;

/// Stand-in for the backend location ingestion endpoint the core uploads
/// to. Run it next to `cargo run --example app` to see fixes arriving.
async fn update_location(fix: web::Json<Fix>) -> HttpResponse {
    let fix = fix.into_inner();
    log::info!(
        "storing location update: lat={}, lng={}, timestamp={}",
        fix.latitude,
        fix.longitude,
        fix.timestamp_ms
    );
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Location updated successfully",
        "data": fix,
    }))
}

pub fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_module_path(false)
        .init();

    let runtime = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    runtime.block_on(async {
        let server = HttpServer::new(|| {
            App::new().route("/api/location", web::post().to(update_location))
        })
        .bind(("127.0.0.1", 3000))?;
        println!("[Location Ingest Server]: http://127.0.0.1:3000/api/location");
        println!("Press Ctrl+C to exit");
        server.run().await
    })
}
