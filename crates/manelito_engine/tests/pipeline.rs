use std::sync::{Arc, Mutex};

use manelito_core::{normalize_input, ErrorKind, NormalizedUrl, SessionId};
use manelito_engine::{
    canonicalize_html, structural_outline, write_as, Clock, Document, EngineEvent, FailureKind,
    FetchError, FetchSettings, Fetcher, Probe, ProgressSink, Reachability, ReqwestFetcher,
    ScrapeError, ScrapePipeline, CancellationToken,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PAGE: &str = "<html><head><title>Fixture</title></head>\
    <body><div id=main class=wrap><p>first<p>second<a href=/x>link</div></body></html>";

/// Answers every probe with a fixed result and counts calls.
struct StaticProbe {
    reachable: bool,
    calls: Mutex<Vec<String>>,
}

impl StaticProbe {
    fn new(reachable: bool) -> Arc<Self> {
        Arc::new(Self {
            reachable,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Probe for StaticProbe {
    async fn probe(&self, url: &NormalizedUrl) -> Reachability {
        self.calls.lock().unwrap().push(url.as_str().to_string());
        Reachability {
            reachable: self.reachable,
            detail: (!self.reachable).then(|| "no reply".to_string()),
        }
    }
}

/// Fails the test if the pipeline ever fetches.
struct ForbiddenFetcher;

#[async_trait::async_trait]
impl Fetcher for ForbiddenFetcher {
    async fn fetch(
        &self,
        _session_id: SessionId,
        url: &str,
        _sink: &dyn ProgressSink,
    ) -> Result<Document, FetchError> {
        panic!("unexpected fetch of {url}");
    }
}

/// Never completes, so only cancellation can end the fetch.
struct HangingFetcher;

#[async_trait::async_trait]
impl Fetcher for HangingFetcher {
    async fn fetch(
        &self,
        _session_id: SessionId,
        _url: &str,
        _sink: &dyn ProgressSink,
    ) -> Result<Document, FetchError> {
        std::future::pending().await
    }
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<u8>>);

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        if let EngineEvent::Progress(progress) = event {
            self.0.lock().unwrap().push(progress.percent);
        }
    }
}

fn fixed_clock() -> Clock {
    Arc::new(|| "2024-01-01T00:00:00Z".to_string())
}

async fn serve_fixture() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PAGE, "text/html; charset=utf-8"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn successful_scrape_returns_canonical_html() {
    engine_logging::initialize_for_tests();
    let server = serve_fixture().await;
    let probe = StaticProbe::new(true);
    let pipeline = ScrapePipeline::with_parts(
        probe.clone(),
        Arc::new(ReqwestFetcher::new(FetchSettings::default())),
        fixed_clock(),
    );
    let sink = RecordingSink::default();
    let url = format!("{}/page", server.uri());

    let outcome = pipeline
        .scrape(1, &url, &sink, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.source_url, url);
    assert_eq!(outcome.fetched_utc, "2024-01-01T00:00:00Z");
    assert_eq!(outcome.document.title.as_deref(), Some("Fixture"));
    assert_eq!(outcome.html, canonicalize_html(PAGE));
    assert!(outcome.html.contains(r#"<div id="main" class="wrap"><p>first</p><p>second"#));
    assert_eq!(probe.calls(), vec![url]);

    let percents = sink.0.lock().unwrap().clone();
    assert!(percents.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(percents.last(), Some(&100));
}

#[tokio::test]
async fn bare_domain_is_prefixed_before_probing() {
    let probe = StaticProbe::new(false);
    let pipeline =
        ScrapePipeline::with_parts(probe.clone(), Arc::new(ForbiddenFetcher), fixed_clock());

    let err = pipeline
        .scrape(1, "example.com", &RecordingSink::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(probe.calls(), vec!["http://example.com".to_string()]);
    assert_eq!(err.kind(), ErrorKind::UnreachableHost);
}

#[tokio::test]
async fn empty_input_is_rejected_without_probe_or_fetch() {
    let probe = StaticProbe::new(true);
    let pipeline =
        ScrapePipeline::with_parts(probe.clone(), Arc::new(ForbiddenFetcher), fixed_clock());

    let err = pipeline
        .scrape(1, "", &RecordingSink::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::InvalidInput(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(probe.calls().is_empty());
}

#[tokio::test]
async fn unreachable_host_is_rejected_without_fetch() {
    let probe = StaticProbe::new(false);
    let pipeline =
        ScrapePipeline::with_parts(probe.clone(), Arc::new(ForbiddenFetcher), fixed_clock());

    let err = pipeline
        .scrape(
            1,
            "https://nonexistent.invalid",
            &RecordingSink::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        ScrapeError::UnreachableHost { host, detail } => {
            assert_eq!(host, "nonexistent.invalid");
            assert_eq!(detail, "no reply");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn http_failure_maps_to_fetch_error_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let pipeline = ScrapePipeline::with_parts(
        StaticProbe::new(true),
        Arc::new(ReqwestFetcher::new(FetchSettings::default())),
        fixed_clock(),
    );

    let err = pipeline
        .scrape(1, &server.uri(), &RecordingSink::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::FetchError);
    assert!(matches!(
        err,
        ScrapeError::Fetch(FetchError {
            kind: FailureKind::HttpStatus(500),
            ..
        })
    ));
}

#[tokio::test]
async fn cancellation_ends_a_hanging_fetch() {
    let pipeline =
        ScrapePipeline::with_parts(StaticProbe::new(true), Arc::new(HangingFetcher), fixed_clock());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline
        .fetch_and_normalize(1, "http://example.com", &RecordingSink::default(), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Cancelled);
}

#[tokio::test]
async fn saved_file_matches_the_scraped_structure() {
    let server = serve_fixture().await;
    let pipeline = ScrapePipeline::with_parts(
        StaticProbe::new(true),
        Arc::new(ReqwestFetcher::new(FetchSettings::default())),
        fixed_clock(),
    );
    let outcome = pipeline
        .scrape(
            1,
            &format!("{}/page", server.uri()),
            &RecordingSink::default(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    let temp = TempDir::new().unwrap();
    let path = write_as(&outcome.html, &temp.path().join("out.html")).unwrap();
    let saved = std::fs::read_to_string(path).unwrap();

    assert_eq!(structural_outline(&saved), structural_outline(&outcome.html));
    assert_eq!(
        structural_outline(&saved),
        structural_outline(&outcome.document.html)
    );
}

#[tokio::test]
async fn concurrent_scrapes_are_independent() {
    let server = MockServer::start().await;
    for (route, title) in [("/a", "A"), ("/b", "B")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                format!("<title>{title}</title><p>{title}</p>"),
                "text/html",
            ))
            .mount(&server)
            .await;
    }
    let pipeline = ScrapePipeline::with_parts(
        StaticProbe::new(true),
        Arc::new(ReqwestFetcher::new(FetchSettings::default())),
        fixed_clock(),
    );
    let (sink_a, sink_b) = (RecordingSink::default(), RecordingSink::default());
    let cancel = CancellationToken::new();
    let url_a = format!("{}/a", server.uri());
    let url_b = format!("{}/b", server.uri());

    let (a, b) = tokio::join!(
        pipeline.scrape(1, &url_a, &sink_a, &cancel),
        pipeline.scrape(2, &url_b, &sink_b, &cancel),
    );

    assert_eq!(a.unwrap().document.title.as_deref(), Some("A"));
    assert_eq!(b.unwrap().document.title.as_deref(), Some("B"));
    assert_eq!(sink_a.0.lock().unwrap().last(), Some(&100));
    assert_eq!(sink_b.0.lock().unwrap().last(), Some(&100));
}

#[test]
fn normalized_input_round_trips_through_the_pipeline_rules() {
    let url = normalize_input("example.com").unwrap();
    assert_eq!(url.as_str(), "http://example.com");
}
