//! Weather proxy tests against a stubbed upstream API

use blog_mcp::weather::WeatherClient;
use blog_mcp::McpServer;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn weather_body() -> Value {
    json!({
        "name": "New Delhi",
        "main": {"temp": 305.4, "humidity": 40},
        "weather": [{"main": "Haze"}]
    })
}

#[tokio::test]
async fn test_forwards_query_and_headers() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather/current"))
        .and(query_param("lat", "0"))
        .and(query_param("place", "NEW DELHI,IN"))
        .and(query_param("units", "standard"))
        .and(query_param("lang", "en"))
        .and(query_param("mode", "json"))
        .and(header("x-rapidapi-key", "test-key"))
        .and(header("x-rapidapi-host", "weather-api167.p.rapidapi.com"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
        .expect(1)
        .mount(&upstream)
        .await;

    let client = WeatherClient::new(upstream.uri(), Some("test-key".to_string()));
    let result = client.get_weather("NEW DELHI").await;

    assert_eq!(result, weather_body());
}

#[tokio::test]
async fn test_upstream_failure_becomes_error_value() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather/current"))
        .respond_with(ResponseTemplate::new(403).set_body_string("invalid key"))
        .mount(&upstream)
        .await;

    let client = WeatherClient::new(upstream.uri(), None);
    let result = client.get_weather("Mumbai").await;

    let message = result["error"].as_str().unwrap();
    assert!(message.starts_with("Failed to get weather: "));
    assert!(message.contains("403"));
    assert!(message.contains("invalid key"));
}

#[tokio::test]
async fn test_non_json_body_becomes_error_value() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&upstream)
        .await;

    let client = WeatherClient::new(upstream.uri(), Some("k".to_string()));
    let result = client.get_weather("Pune").await;

    assert!(result["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to get weather: "));
}

#[tokio::test]
async fn test_get_weather_tool_returns_json_text() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/weather/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
        .mount(&upstream)
        .await;

    let server = McpServer::weather(WeatherClient::new(upstream.uri(), Some("k".to_string())));
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": "get_weather", "arguments": {"city": "NEW DELHI"}}
    });

    let response = server
        .handle_message(&request.to_string())
        .await
        .unwrap()
        .unwrap();
    let result = response.result.unwrap();

    assert!(result.get("isError").is_none());
    let text = result["content"][0]["text"].as_str().unwrap();
    let body: Value = serde_json::from_str(text).unwrap();
    assert_eq!(body, weather_body());
}
