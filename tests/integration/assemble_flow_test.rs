use oto_core::{
    FileFetcher, Fetcher, HtmlDocument, HttpFetcher, LoadPhase, ModuleLoader, ModuleManifest,
    OtoError,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEMPLATE: &str = r#"<html><body><div id="header-container"></div><main><div id="features" class="section"></div><div id="faq" class="section"></div></main><div id="footer-container"></div></body></html>"#;

const MANIFEST: &str = r##"{
  "modules": [
    {"name": "header", "path": "/modules/header.html", "target": "#header-container", "priority": "critical", "order": 0},
    {"name": "features", "path": "/modules/features.html", "target": "div#features", "priority": "critical", "order": 1},
    {"name": "faq", "path": "/modules/faq.html", "target": "#faq", "priority": "lazy"},
    {"name": "footer", "path": "/modules/footer.html", "target": "#footer-container", "priority": "lazy"}
  ]
}"##;

async fn mount_page(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn site_server() -> MockServer {
    let server = MockServer::start().await;
    mount_page(&server, "/config/modules.json", 200, MANIFEST).await;
    mount_page(&server, "/modules/header.html", 200, "<nav>OTO</nav>").await;
    mount_page(&server, "/modules/features.html", 200, "<ul><li>Offline</li></ul>").await;
    mount_page(&server, "/modules/faq.html", 200, "<dl><dt>Free?</dt></dl>").await;
    mount_page(&server, "/modules/footer.html", 200, "<small>2026</small>").await;
    server
}

mod http_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_assemble_page_over_http() {
        let server = site_server().await;
        let fetcher = Arc::new(HttpFetcher::new(server.uri()));

        let manifest = ModuleManifest::fetch(fetcher.as_ref(), "config/modules.json")
            .await
            .unwrap();
        assert_eq!(manifest.len(), 4);

        let loader = ModuleLoader::new(manifest, fetcher, HtmlDocument::new(TEMPLATE));
        let summary = loader.initialize().await;

        assert!(summary.is_clean());
        assert_eq!(summary.critical_count, 2);
        assert_eq!(summary.lazy_count, 2);

        let page = loader.into_document().into_string();
        assert_eq!(
            page,
            r#"<html><body><div id="header-container"><nav>OTO</nav></div><main><div id="features" class="section"><ul><li>Offline</li></ul></div><div id="faq" class="section"><dl><dt>Free?</dt></dl></div></main><div id="footer-container"><small>2026</small></div></body></html>"#
        );
    }

    #[tokio::test]
    async fn test_server_errors_are_isolated() {
        let server = MockServer::start().await;
        mount_page(&server, "/modules/header.html", 404, "Not Found").await;
        mount_page(&server, "/modules/features.html", 200, "<ul></ul>").await;
        mount_page(&server, "/modules/faq.html", 500, "oops").await;
        mount_page(&server, "/modules/footer.html", 200, "<small>2026</small>").await;

        let manifest = ModuleManifest::from_json(MANIFEST).unwrap();
        let fetcher = Arc::new(HttpFetcher::new(server.uri()));
        let loader = ModuleLoader::new(manifest, fetcher, HtmlDocument::new(TEMPLATE));

        let summary = loader.initialize().await;

        assert!(summary.success);
        assert_eq!(summary.critical_count, 1);
        assert_eq!(summary.lazy_count, 1);

        let errors: Vec<(String, String)> = summary
            .errors
            .iter()
            .map(|e| (e.module.clone(), e.error.clone()))
            .collect();
        assert_eq!(
            errors,
            vec![
                (
                    "header".to_string(),
                    "Failed to load module \"header\": 404".to_string()
                ),
                (
                    "faq".to_string(),
                    "Failed to load module \"faq\": 500".to_string()
                ),
            ]
        );

        let page = loader.into_document().into_string();
        assert!(page.contains(r#"<div id="header-container"></div>"#));
        assert!(page.contains(r#"<div id="faq" class="section"></div>"#));
        assert!(page.contains("<small>2026</small>"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let manifest = ModuleManifest::from_json(MANIFEST).unwrap();
        let loader = ModuleLoader::new(
            manifest,
            Arc::new(HttpFetcher::new(uri)),
            HtmlDocument::new(TEMPLATE),
        );

        let err = loader.load_module("header").await.unwrap_err();
        assert!(matches!(err, OtoError::NetworkError { .. }));
        assert!(err
            .to_string()
            .starts_with("Network error loading module \"header\":"));
    }

    #[tokio::test]
    async fn test_lazy_modules_are_fetched_concurrently() {
        let server = MockServer::start().await;
        for route in ["/modules/header.html", "/modules/features.html"] {
            mount_page(&server, route, 200, "<p></p>").await;
        }
        for route in ["/modules/faq.html", "/modules/footer.html"] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string("<p></p>")
                        .set_delay(Duration::from_millis(300)),
                )
                .mount(&server)
                .await;
        }

        let manifest = ModuleManifest::from_json(MANIFEST).unwrap();
        let loader = ModuleLoader::new(
            manifest,
            Arc::new(HttpFetcher::new(server.uri())),
            HtmlDocument::new(TEMPLATE),
        );

        let started = std::time::Instant::now();
        let results = loader.load_modules_concurrent(["faq", "footer"]).await;

        assert!(results.iter().all(|r| r.is_success()));
        assert!(started.elapsed() < Duration::from_millis(600));
    }
}

mod file_flow_tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &TempDir, relative: &str, content: &str) {
        let path = root.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_assemble_page_from_directory() {
        let root = TempDir::new().unwrap();
        write(&root, "config/modules.json", MANIFEST);
        write(&root, "modules/header.html", "<nav>OTO</nav>");
        write(&root, "modules/features.html", "<ul></ul>");
        write(&root, "modules/footer.html", "<small>2026</small>");

        let fetcher: Arc<dyn Fetcher> = Arc::new(FileFetcher::new(root.path()));
        let manifest = ModuleManifest::fetch(fetcher.as_ref(), "config/modules.json")
            .await
            .unwrap();

        let phases = Arc::new(Mutex::new(Vec::new()));
        let sink = phases.clone();
        let loader = ModuleLoader::new(manifest, fetcher, HtmlDocument::new(TEMPLATE));
        loader.on_phase(move |event| sink.lock().unwrap().push((event.phase, event.failed)));

        let summary = loader.initialize().await;

        assert!(summary.success);
        assert_eq!(summary.critical_count, 2);
        assert_eq!(summary.lazy_count, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].module, "faq");
        assert_eq!(
            *phases.lock().unwrap(),
            vec![(LoadPhase::Critical, 0), (LoadPhase::Complete, 1)]
        );

        let page = loader.into_document().into_string();
        assert!(page.contains("<nav>OTO</nav>"));
        assert!(page.contains(r#"<div id="faq" class="section"></div>"#));
    }

    #[tokio::test]
    async fn test_fragment_outside_root_is_refused() {
        let root = TempDir::new().unwrap();
        write(&root, "site/index.html", "");
        write(&root, "secret.html", "<p>secret</p>");

        let manifest = ModuleManifest::from_json(
            r##"{"modules":[{"name":"escape","path":"../secret.html","target":"#x","priority":"lazy"}]}"##,
        )
        .unwrap();
        let loader = ModuleLoader::new(
            manifest,
            Arc::new(FileFetcher::new(root.path().join("site"))),
            HtmlDocument::new(r#"<div id="x"></div>"#),
        );

        let summary = loader.initialize().await;

        assert_eq!(summary.lazy_count, 0);
        assert_eq!(
            summary.errors[0].error,
            "Failed to load module \"escape\": 403"
        );
        assert_eq!(
            loader.into_document().into_string(),
            r#"<div id="x"></div>"#
        );
    }
}
