use once_cell::sync::Lazy;
use oj_report::cli::Cli;
use oj_report::configuration::Settings;
use oj_report::startup::run;
use oj_report::telemetry::{get_subscriber, init_subscriber};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CSRF_TOKEN: &str = "test-csrf-token";

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "error": null, "data": data }))
}

pub fn failure(error: &str, data: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "error": error, "data": data }))
}

pub fn acm_rank(username: &str, info: &[(u64, usize, bool)]) -> Value {
    let info: serde_json::Map<String, Value> = info
        .iter()
        .map(|&(id, error_number, is_ac)| {
            (
                id.to_string(),
                json!({ "is_ac": is_ac, "error_number": error_number }),
            )
        })
        .collect();
    json!({ "user": { "username": username }, "submission_info": info })
}

pub fn oi_rank(username: &str, info: &[(u64, f64)]) -> Value {
    let info: serde_json::Map<String, Value> = info
        .iter()
        .map(|&(id, score)| (id.to_string(), json!(score)))
        .collect();
    json!({ "user": { "username": username }, "submission_info": info })
}

/// A fake OnlineJudge deployment.
pub struct TestSite {
    pub server: MockServer,
}

impl TestSite {
    pub async fn spawn() -> Self {
        // `TRACING` is only executed the first time `initialize` is invoked.
        Lazy::force(&TRACING);
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn address(&self) -> String {
        self.server.uri()
    }

    pub fn settings(&self) -> Settings {
        Settings {
            site: self.address(),
            username: Some("admin".into()),
            password: Some(SecretString::from("rootroot")),
            full_points: 100.,
        }
    }

    /// Anonymous profile that hands out the CSRF cookie.
    pub async fn mount_profile(&self) {
        Mock::given(method("GET"))
            .and(path("/api/profile"))
            .respond_with(
                ok(Value::Null)
                    .insert_header("Set-Cookie", format!("csrftoken={}; Path=/", CSRF_TOKEN)),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mount_tfa(&self, required: bool) {
        Mock::given(method("POST"))
            .and(path("/api/tfa_required"))
            .respond_with(ok(json!({ "result": required })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_successful_login(&self) {
        self.mount_profile().await;
        self.mount_tfa(false).await;
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(header("X-CSRFToken", CSRF_TOKEN))
            .respond_with(ok(json!("Succeeded")))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_contests(&self, contests: Value) {
        let total = contests.as_array().map_or(0, Vec::len);
        Mock::given(method("GET"))
            .and(path("/api/contests"))
            .respond_with(ok(json!({ "results": contests, "total": total })))
            .mount(&self.server)
            .await;
    }

    /// Serves the whole ranking as a single page.
    pub async fn mount_ranking(&self, ranks: Vec<Value>) {
        let total = ranks.len();
        Mock::given(method("GET"))
            .and(path("/api/contest_rank"))
            .respond_with(ok(json!({ "results": ranks, "total": total })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_problems(&self, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/api/contest/problem"))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Runs the whole program against this site and returns what it printed.
    pub async fn report(&self, cli: Cli) -> anyhow::Result<String> {
        let settings = self.settings();
        // reqwest's blocking client must not run on an async worker
        tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
            let mut out = vec![];
            run(&settings, &cli, &mut out)?;
            Ok(String::from_utf8(out)?)
        })
        .await
        .expect("Failed to join the report task.")
    }

    pub async fn received(&self, endpoint: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == endpoint)
            .count()
    }
}
