//! Integration tests for the crawler
//!
//! These tests run complete crawls against wiremock servers and an in-process
//! counting fetcher, then build and export the link graph.

use async_trait::async_trait;
use link_mapper::config::{parse_config, CrawlerConfig, UserAgentConfig};
use link_mapper::crawler::{
    crawl, CrawlStatus, Crawler, FetchError, FetchedPage, Fetcher, HttpFetcher, StopReason,
};
use link_mapper::graph::{export, to_adjacency, ExportOptions, Graph, GraphFormat};
use link_mapper::storage::{load_corpus, save_corpus};
use link_mapper::{
    AggregationPolicy, GraphBuilder, Identifier, MapperError, MemoryStore, PageRecord,
    RecordStore, Scope,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn id(s: &str) -> Identifier {
    Identifier::new(s)
}

fn crawler_config() -> CrawlerConfig {
    CrawlerConfig {
        seed: "A".to_string(),
        max_concurrent_fetches: 4,
        max_pages: None,
        max_depth: None,
        max_duration_secs: None,
        request_timeout_secs: 5,
        max_retries: 0,
        retry_delay_ms: 1,
        max_tracked_identifiers: None,
    }
}

fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
    }
}

fn build_graph(store: &MemoryStore) -> Graph {
    let mut builder = GraphBuilder::new(AggregationPolicy::Occurrences);
    builder.add_records(store.all().unwrap().values());
    builder.build()
}

/// Mounts an HTML page that must be requested exactly once
async fn mount_page(server: &MockServer, page: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html.to_string(), "text/html"))
        .expect(1)
        .mount(server)
        .await;
}

async fn http_crawler(
    server: &MockServer,
    config: &CrawlerConfig,
) -> (Crawler, Arc<MemoryStore>) {
    let base = Url::parse(&server.uri()).unwrap();
    let scope = Scope::new(base, "127.0.0.1");
    let fetcher = Arc::new(HttpFetcher::new(&user_agent(), Duration::from_secs(5)).unwrap());
    let store = Arc::new(MemoryStore::new());
    let crawler = Crawler::with_scope(config, scope, fetcher, store.clone());
    (crawler, store)
}

/// Serves pages from a map of identifier -> HTML and counts every fetch
#[derive(Default)]
struct CountingFetcher {
    pages: HashMap<String, String>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
}

impl CountingFetcher {
    fn new(pages: Vec<(String, String)>) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            ..Default::default()
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> HashMap<String, usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let name = url.path().trim_start_matches("/wiki/").to_string();
        *self.calls.lock().unwrap().entry(name.clone()).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.pages.get(&name) {
            Some(body) => Ok(FetchedPage {
                final_url: url.clone(),
                status_code: 200,
                content_type: "text/html".to_string(),
                body: body.clone(),
            }),
            None => Err(FetchError::Status(404)),
        }
    }
}

fn mock_crawler(
    config: &CrawlerConfig,
    fetcher: Arc<CountingFetcher>,
    store: Arc<MemoryStore>,
) -> Crawler {
    let scope = Scope::new(Url::parse("https://wiki.test").unwrap(), "wiki.test");
    Crawler::with_scope(config, scope, fetcher, store)
}

/// Page `name` linking to every page in `links`
fn page(name: &str, links: &[&str]) -> (String, String) {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<a href="/wiki/{}">{}</a>"#, link, link))
        .collect();
    (
        name.to_string(),
        format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            name, anchors
        ),
    )
}

#[tokio::test]
async fn test_scenario_failed_fetch_over_http() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/wiki/A",
        r#"<html><head><title>Alpha</title></head><body>
        <a href="/wiki/B">B</a> <a href="/wiki/C">C</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/wiki/B",
        r#"<html><head><title>Beta</title></head><body><a href="/wiki/A">back</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/wiki/C"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (crawler, store) = http_crawler(&server, &crawler_config()).await;
    let outcome = crawler.run("A", CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.pages_failed, 1);
    assert_eq!(outcome.counts.failed, 1);
    assert_eq!(outcome.pending, 0);

    let records = store.all().unwrap();
    assert_eq!(records.keys().cloned().collect::<Vec<_>>(), vec![id("A"), id("B")]);
    assert_eq!(records[&id("A")].title.as_deref(), Some("Alpha"));
    assert!(records[&id("A")].url.ends_with("/wiki/A"));

    let graph = build_graph(&store);
    assert_eq!(
        graph.nodes().cloned().collect::<Vec<_>>(),
        vec![id("A"), id("B"), id("C")]
    );
    let edges: Vec<_> = graph
        .edges()
        .map(|(s, t, _)| (s.as_str().to_string(), t.as_str().to_string()))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("A".to_string(), "B".to_string()),
            ("A".to_string(), "C".to_string()),
            ("B".to_string(), "A".to_string()),
        ]
    );

    let (adjacency, _) = to_adjacency(&graph);
    assert_eq!(adjacency, "A;B;C\nB;A\n");
}

#[tokio::test]
async fn test_scenario_unreached_target_is_dangling() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/wiki/Root",
        r#"<a href="/wiki/P1">1</a><a href="/wiki/P2">2</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/wiki/P1",
        r#"<a href="/wiki/D">d</a><a href="https://elsewhere.org/wiki/E">e</a>"#,
    )
    .await;
    mount_page(&server, "/wiki/P2", r#"<a href="/wiki/D">d</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/wiki/D"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>unused</p>", "text/html"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = crawler_config();
    config.max_depth = Some(1);
    let (crawler, store) = http_crawler(&server, &config).await;

    let outcome = crawler.run("Root", CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.pages_fetched, 3);
    assert!(store.get(&id("D")).unwrap().is_none());
    assert_eq!(store.count_dangling().unwrap(), 1);

    let graph = build_graph(&store);
    assert!(graph.contains(&id("D")));
    assert!(!graph.is_content(&id("D")));
    assert_eq!(graph.targets(&id("D")).count(), 0);
    assert_eq!(graph.weight(&id("P1"), &id("D")), Some(1));
    assert_eq!(graph.weight(&id("P2"), &id("D")), Some(1));
    assert!(!graph.contains(&id("E")));
}

#[tokio::test]
async fn test_scenario_repeated_links_single_edge() {
    let fetcher = Arc::new(CountingFetcher::new(vec![
        (
            "X".to_string(),
            r#"<a href="/wiki/Y">one</a><a href="/wiki/Y#top">two</a><a href="https://wiki.test/wiki/Y">three</a>"#
                .to_string(),
        ),
        page("Y", &[]),
    ]));
    let store = Arc::new(MemoryStore::new());
    let mut config = crawler_config();
    config.seed = "X".to_string();
    let crawler = mock_crawler(&config, fetcher.clone(), store.clone());

    crawler.run("X", CancellationToken::new()).await.unwrap();

    let graph = build_graph(&store);
    assert_eq!(graph.targets(&id("X")).count(), 1);
    assert_eq!(graph.weight(&id("X"), &id("Y")), Some(1));
    assert_eq!(fetcher.calls().get("Y"), Some(&1));

    // Three separate corpora each observing X -> Y aggregate to weight 3
    let dir = TempDir::new().unwrap();
    let mut builder = GraphBuilder::new(AggregationPolicy::Occurrences);
    for run in 0..3 {
        let corpus = dir.path().join(format!("run{}.json", run));
        save_corpus(&corpus, store.all().unwrap().values()).unwrap();
        builder.add_records(load_corpus(&corpus).unwrap().iter());
    }
    assert_eq!(builder.build().weight(&id("X"), &id("Y")), Some(3));
}

#[tokio::test]
async fn test_each_identifier_fetched_at_most_once() {
    // Every page links to every other page and to itself
    let names: Vec<String> = (0..12).map(|i| format!("P{}", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let pages: Vec<_> = refs.iter().map(|name| page(name, &refs)).collect();

    let fetcher = Arc::new(CountingFetcher::new(pages));
    let store = Arc::new(MemoryStore::new());
    let mut config = crawler_config();
    config.max_concurrent_fetches = 8;
    let crawler = mock_crawler(&config, fetcher.clone(), store.clone());

    let outcome = crawler.run("P0", CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.pages_fetched, 12);
    let calls = fetcher.calls();
    assert_eq!(calls.len(), 12);
    assert!(calls.values().all(|count| *count == 1), "{:?}", calls);

    // One self-loop per page, not one per occurrence
    let graph = build_graph(&store);
    assert_eq!(graph.weight(&id("P3"), &id("P3")), Some(1));
    assert_eq!(graph.edge_count(), 12 * 12);
}

#[tokio::test]
async fn test_export_is_deterministic_across_runs() {
    let pages = vec![
        page("A", &["B", "C", "D"]),
        page("B", &["A", "D"]),
        page("C", &["Missing"]),
        page("D", &["C", "A"]),
    ];

    let mut outputs = Vec::new();
    for workers in [1, 4] {
        let fetcher = Arc::new(CountingFetcher::new(pages.clone()));
        let store = Arc::new(MemoryStore::new());
        let mut config = crawler_config();
        config.max_concurrent_fetches = workers;
        let crawler = mock_crawler(&config, fetcher, store.clone());
        crawler.run("A", CancellationToken::new()).await.unwrap();

        let graph = build_graph(&store);
        let mut rendered = String::new();
        for format in [GraphFormat::Adjacency, GraphFormat::Dot, GraphFormat::Json] {
            let options = ExportOptions {
                format,
                ..ExportOptions::default()
            };
            rendered.push_str(&export(&graph, &options).unwrap().0);
        }
        outputs.push(rendered);
    }

    assert_eq!(outputs[0], outputs[1]);
    assert!(outputs[0].starts_with("A;B;C;D\nB;A;D\nC;Missing\nD;A;C\n"));
}

#[tokio::test]
async fn test_cancel_keeps_partial_results() {
    let fetcher = Arc::new(
        CountingFetcher::new(vec![page("A", &["B", "C"]), page("B", &[]), page("C", &[])])
            .with_delay(Duration::from_millis(300)),
    );
    let store = Arc::new(MemoryStore::new());
    let mut config = crawler_config();
    config.max_concurrent_fetches = 1;
    let crawler = mock_crawler(&config, fetcher, store.clone());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(450)).await;
        trigger.cancel();
    });

    let outcome = crawler.run("A", cancel).await.unwrap();

    assert_eq!(outcome.status, CrawlStatus::Cancelled);
    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.pending, 2);
    assert_eq!(store.len().unwrap(), 1);

    let graph = build_graph(&store);
    assert_eq!(graph.node_count(), 3);
    assert_eq!(to_adjacency(&graph).0, "A;B;C\n");
}

#[tokio::test]
async fn test_page_budget_stops_crawl() {
    let pages = vec![
        page("A", &["B", "C", "D"]),
        page("B", &["E"]),
        page("C", &[]),
        page("D", &[]),
        page("E", &[]),
    ];
    let fetcher = Arc::new(CountingFetcher::new(pages));
    let store = Arc::new(MemoryStore::new());
    let mut config = crawler_config();
    config.max_concurrent_fetches = 1;
    config.max_pages = Some(2);
    let crawler = mock_crawler(&config, fetcher.clone(), store.clone());

    let outcome = crawler.run("A", CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.status, CrawlStatus::Stopped(StopReason::MaxPages));
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(fetcher.calls().values().sum::<usize>(), 2);
    assert!(outcome.pending > 0);
    assert_eq!(store.len().unwrap(), 2);
}

#[tokio::test]
async fn test_store_failure_aborts_and_keeps_records() {
    let fetcher = Arc::new(CountingFetcher::new(vec![
        page("A", &["B"]),
        page("B", &["A"]),
    ]));
    let store = Arc::new(MemoryStore::with_capacity_limit(1));
    let mut config = crawler_config();
    config.max_concurrent_fetches = 1;
    let crawler = mock_crawler(&config, fetcher, store.clone());

    let result = crawler.run("A", CancellationToken::new()).await;

    assert!(matches!(result, Err(MapperError::Storage(_))));
    let records = store.all().unwrap();
    assert_eq!(records.len(), 1);
    assert!(records.contains_key(&id("A")));

    let dir = TempDir::new().unwrap();
    let corpus = dir.path().join("partial.json");
    assert_eq!(save_corpus(&corpus, records.values()).unwrap(), 1);
}

#[tokio::test]
async fn test_crawl_from_config_file() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/wiki/Main_Page",
        r#"<title>Main Page</title><a href="/wiki/Topic">t</a><a href="/wiki/Special:Random">r</a>"#,
    )
    .await;
    mount_page(&server, "/wiki/Topic", r#"<title>Topic</title>"#).await;

    let dir = TempDir::new().unwrap();
    let toml = format!(
        r#"
[crawler]
seed = "Main_Page"
max-concurrent-fetches = 2

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[scope]
base-url = "{}"
allowed-domain = "127.0.0.1"

[output]
corpus-path = "{}"
graph-path = "{}"
format = "dot"
"#,
        server.uri(),
        dir.path().join("corpus.json").display(),
        dir.path().join("graph.dot").display()
    );
    let config = parse_config(&toml).unwrap();

    let store = Arc::new(MemoryStore::new());
    let outcome = crawl(&config, store.clone(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, CrawlStatus::Completed);
    assert_eq!(outcome.pages_fetched, 2);

    let record: PageRecord = store.get(&id("Main_Page")).unwrap().unwrap();
    assert_eq!(record.title.as_deref(), Some("Main Page"));
    assert_eq!(record.links.iter().collect::<Vec<_>>(), vec![&id("Topic")]);
    assert!(record.fetched_at.is_some());

    let options = ExportOptions {
        format: config.output.format,
        graph_name: config.output.graph_name.clone(),
        weights: None,
    };
    let (dot, _) = export(&build_graph(&store), &options).unwrap();
    assert_eq!(
        dot,
        "digraph wikipedia {\n  0 [label = \"Main Page\"];\n  1 [label = \"Topic\"];\n  0 -> {1};\n}\n"
    );
}
