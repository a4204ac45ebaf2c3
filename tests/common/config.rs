//! Helpers for building configurations and serving payloads

use imgprobe::{Config, FetchConfig};
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration probing `urls` into `output_dir` with a short timeout
pub fn test_config(urls: Vec<String>, output_dir: &Path) -> Config {
    Config {
        urls,
        output_dir: output_dir.to_path_buf(),
        fetch: FetchConfig {
            timeout: Duration::from_secs(5),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Mount a GET route returning `status` with `body` and give back its URL
pub async fn serve(
    server: &MockServer,
    route: &str,
    status: u16,
    body: &[u8],
    content_type: &str,
) -> String {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status).set_body_raw(body.to_vec(), content_type),
        )
        .mount(server)
        .await;
    format!("{}{}", server.uri(), route)
}

/// A URL nothing listens on
pub fn refused_url() -> String {
    // Bind then drop so the port is very likely free
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    format!("http://127.0.0.1:{port}/image.jpg")
}
