use chrono::NaiveDate;
use garmin_connect_client::http_client::ReqwestGarminClient;
use garmin_connect_client::{GarminClient, GarminError};
use secrecy::SecretString;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(serde_json::json!({
            "username": "runner@example.com",
            "password": "s3cret"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok-123",
            "display_name": "runner42",
            "full_name": "Casey Runner"
        })))
        .mount(server)
        .await;
}

async fn logged_in_client(server: &MockServer) -> ReqwestGarminClient {
    mount_login(server).await;
    let client = ReqwestGarminClient::new(
        &server.uri(),
        "runner@example.com",
        SecretString::new("s3cret".into()),
    )
    .expect("client");
    client.login().await.expect("login");
    client
}

#[tokio::test]
async fn login_returns_profile_and_authenticates_later_calls() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/userprofile-service/socialProfile"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"displayName": "runner42", "fullName": "Casey Runner"})),
        )
        .mount(&server)
        .await;

    let client = ReqwestGarminClient::new(
        &server.uri(),
        "runner@example.com",
        SecretString::new("s3cret".into()),
    )
    .expect("client");
    let info = client.login().await.expect("login");
    assert_eq!(info.display_name, "runner42");
    assert_eq!(info.full_name.as_deref(), Some("Casey Runner"));

    let name = client.get_full_name().await.expect("full name");
    assert_eq!(name, "Casey Runner");
}

#[tokio::test]
async fn login_rejected_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let client =
        ReqwestGarminClient::new(&server.uri(), "u", SecretString::new("p".into())).expect("client");
    let err = client.login().await.expect_err("rejected");
    assert!(matches!(err, GarminError::Auth(ref body) if body == "bad credentials"));
    assert!(err.is_connectivity());
}

#[tokio::test]
async fn login_rate_limited_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client =
        ReqwestGarminClient::new(&server.uri(), "u", SecretString::new("p".into())).expect("client");
    assert!(matches!(
        client.login().await,
        Err(GarminError::RateLimited(_))
    ));
}

#[tokio::test]
async fn get_stats_parses_daily_summary() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    Mock::given(method("GET"))
        .and(path("/usersummary-service/usersummary/daily/runner42"))
        .and(query_param("calendarDate", "2021-10-08"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "calendarDate": "2021-10-08",
            "activeKilocalories": 2100.5,
            "activeSeconds": 3600,
            "highlyActiveSeconds": 1200,
            "maxHeartRate": 165,
            "minHeartRate": 52,
            "sleepingSeconds": 25200,
            "totalSteps": 10450
        })))
        .mount(&server)
        .await;

    let stats = client
        .get_stats(day(2021, 10, 8))
        .await
        .expect("stats")
        .expect("some stats");
    assert_eq!(stats.calendar_date, Some(day(2021, 10, 8)));
    assert_eq!(stats.active_calories, Some(2100.5));
    assert_eq!(stats.max_heart_rate, Some(165));
    assert_eq!(stats.sleeping_seconds, Some(25200));
}

#[tokio::test]
async fn get_stats_without_data_is_none() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    Mock::given(method("GET"))
        .and(path("/usersummary-service/usersummary/daily/runner42"))
        .and(query_param("calendarDate", "2021-10-09"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/usersummary-service/usersummary/daily/runner42"))
        .and(query_param("calendarDate", "2021-10-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "calendarDate": "2021-10-10",
            "activeKilocalories": null,
            "maxHeartRate": null
        })))
        .mount(&server)
        .await;

    assert!(client.get_stats(day(2021, 10, 9)).await.expect("ok").is_none());
    assert!(client.get_stats(day(2021, 10, 10)).await.expect("ok").is_none());
}

#[tokio::test]
async fn get_stats_server_error_is_err() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    Mock::given(method("GET"))
        .and(path("/usersummary-service/usersummary/daily/runner42"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let err = client.get_stats(day(2021, 10, 8)).await.expect_err("502");
    assert!(matches!(err, GarminError::Status { status: 502, .. }));
}

#[tokio::test]
async fn wellness_endpoints_pass_date_and_return_json() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailyHeartRate/runner42"))
        .and(query_param("date", "2021-09-26"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "restingHeartRate": 54,
            "heartRateValues": [[1632614400000i64, 60]]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailySummaryChart/runner42"))
        .and(query_param("date", "2021-09-26"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!([{"steps": 120}])),
        )
        .mount(&server)
        .await;

    let hr = client.get_heart_rates(day(2021, 9, 26)).await.expect("hr");
    assert_eq!(hr["restingHeartRate"], 54);
    let steps = client.get_steps_data(day(2021, 9, 26)).await.expect("steps");
    assert_eq!(steps[0]["steps"], 120);
}

#[tokio::test]
async fn activities_and_unit_system() {
    let server = MockServer::start().await;
    let client = logged_in_client(&server).await;
    Mock::given(method("GET"))
        .and(path("/activitylist-service/activities/search/activities"))
        .and(query_param("start", "0"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"activityId": 7, "activityName": "Morning Run"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/userprofile-service/userprofile/user-settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "userData": {"measurementSystem": "metric"}
        })))
        .mount(&server)
        .await;

    let acts = client.get_activities(0, 1).await.expect("activities");
    assert_eq!(acts.as_array().map(|a| a.len()), Some(1));
    assert_eq!(client.get_unit_system().await.expect("units"), "metric");
}

#[tokio::test]
async fn connection_refused_is_http_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let uri = format!("http://127.0.0.1:{port}");
    let client = ReqwestGarminClient::new(&uri, "u", SecretString::new("p".into())).expect("client");
    let err = client.login().await.expect_err("refused");
    assert!(matches!(err, GarminError::Http(_)));
    assert!(err.is_connectivity());
}
