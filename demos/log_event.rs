use amplitude_http::{
    new_client_from_env, Context, Event, Identification, IdentifyRequest, LogEventRequest,
    Properties,
};
use std::time::{Duration, SystemTime};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = new_client_from_env(reqwest::Client::new())
        .expect("env var AMPLITUDE_API_KEY should exist");
    let ctx = Context::background().with_timeout(Duration::from_secs(10));

    let (body, response) = client
        .log_event(
            &ctx,
            LogEventRequest::new(vec![Event {
                user_id: Some("john_doe@gmail.com".into()),
                user_properties: Some(Properties::from([("Cohort".into(), "Test A".into())])),
                country: Some("United States".into()),
                ip: Some("127.0.0.1".into()),
                ..Event::new("watch_tutorial").with_time(SystemTime::now())
            }]),
        )
        .await
        .expect("upload should be sent");
    if response.status().is_success() {
        println!("Event: {:?}", body);
    } else {
        println!("Error: {}", body.error.unwrap_or_default());
        return;
    }

    let response = client
        .identify(
            &ctx,
            &IdentifyRequest::new(vec![Identification {
                user_id: Some("john_doe@gmail.com".into()),
                paying: Some("true".into()),
                ..Default::default()
            }]),
        )
        .await
        .expect("identify should be sent");
    println!("Identify: {}", response.status());
}
