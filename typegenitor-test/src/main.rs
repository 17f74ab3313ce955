use typegenitor_test::health_api::HealthCheckResponse;

fn main() {
    let response = HealthCheckResponse {
        status: "ok".to_string(),
    };
    match serde_json::to_string(&response) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("serialization failed: {e}"),
    }
}
