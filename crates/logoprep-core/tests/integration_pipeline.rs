//! Integration test: CSV table through the pipeline against a local HTTP server.
//!
//! Uses the real libcurl fetcher and image store; no normalizer, so stored
//! files keep the format the server advertised.

mod common;

use common::image_server::{self, Route};
use logoprep_core::config::FetchConfig;
use logoprep_core::fetch::{CurlFetcher, FetchError, FetchResult, Fetcher};
use logoprep_core::pipeline::Pipeline;
use logoprep_core::storage::ImageStore;
use logoprep_core::table::{read_table, write_table, RowError, RowOutcome};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\n fake png payload";
const SVG: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>";

fn fetcher() -> CurlFetcher {
    CurlFetcher::new(&FetchConfig {
        timeout_secs: 5,
        ..FetchConfig::default()
    })
}

#[test]
fn rows_are_stored_or_tagged_and_partitioned() {
    let server = image_server::start(vec![
        ("/acme.png", Route::ok("image/png", PNG)),
        ("/beta.svg", Route::ok("image/svg+xml; charset=utf-8", SVG)),
        ("/page", Route::ok("text/html", "<html></html>")),
        ("/moved", Route::redirect("/acme.png")),
    ]);

    let dir = tempdir().unwrap();
    let input = dir.path().join("orgs.csv");
    std::fs::write(
        &input,
        format!(
            "name,image_url,filename\n\
             Acme,{},Acme\n\
             Nowhere,,nowhere\n\
             Page Co,{},page co\n\
             Gone,{},gone\n\
             Beta Ltd.,{},Beta Ltd.\n\
             Moved,{},moved\n\
             Dead,http://127.0.0.1:1/x.png,dead\n",
            server.url("/acme.png"),
            server.url("/page"),
            server.url("/missing.png"),
            server.url("/beta.svg"),
            server.url("/moved"),
        ),
    )
    .unwrap();

    let table = read_table(&input, true).unwrap();
    let images = dir.path().join("images");
    let fetcher = fetcher();
    let report = Pipeline::new(&fetcher, ImageStore::new(&images))
        .run(table)
        .unwrap();

    assert_eq!(report.summary.total, 7);
    assert_eq!(report.summary.saved, 3);
    assert_eq!(report.summary.failed, 4);
    assert!(!report.summary.aborted);

    let rows = report.table.rows();
    assert_eq!(
        *rows[0].outcome(),
        RowOutcome::Saved(images.join("acme.png"))
    );
    assert_eq!(std::fs::read(images.join("acme.png")).unwrap(), PNG);
    assert_eq!(rows[1].error(), Some(RowError::ImageUrlError));
    assert_eq!(rows[2].error(), Some(RowError::FileExtensionError));
    assert_eq!(rows[3].error(), Some(RowError::ImageDownloadError));
    assert_eq!(rows[4].local_path(), Some(images.join("beta-ltd.svg").as_path()));
    assert_eq!(rows[5].local_path(), Some(images.join("moved.png").as_path()));
    assert_eq!(rows[6].error(), Some(RowError::ImageDownloadError));

    for row in rows.iter().filter(|r| r.is_success()) {
        let meta = std::fs::metadata(row.local_path().unwrap()).unwrap();
        assert!(meta.len() > 0);
    }

    let parts = report.table.partition();
    let names = |t: &logoprep_core::table::Table| {
        t.rows().iter().map(|r| r.name.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&parts.success), ["Acme", "Beta Ltd.", "Moved"]);
    assert_eq!(names(&parts.failure), ["Nowhere", "Page Co", "Gone", "Dead"]);

    // Written tables read back with their outcomes.
    let success_csv = dir.path().join("out/orgs_processed.csv");
    let failure_csv = dir.path().join("out/orgs_failures.csv");
    write_table(&success_csv, &parts.success).unwrap();
    write_table(&failure_csv, &parts.failure).unwrap();

    let reread = read_table(&failure_csv, true).unwrap();
    assert_eq!(reread.len(), 4);
    assert_eq!(reread.rows()[0].error(), Some(RowError::ImageUrlError));
    assert_eq!(reread.headers().unwrap(), ["name", "image_url", "filename"]);

    let reread = read_table(&success_csv, true).unwrap();
    assert_eq!(reread.rows()[0].local_path(), Some(images.join("acme.png").as_path()));
}

#[test]
fn every_request_carries_the_configured_user_agent() {
    let server = image_server::start(vec![("/a.png", Route::ok("image/png", PNG))]);
    let dir = tempdir().unwrap();
    let input = dir.path().join("orgs.csv");
    std::fs::write(&input, format!("Acme,{},acme\n", server.url("/a.png"))).unwrap();

    let table = read_table(&input, false).unwrap();
    let fetcher = CurlFetcher::new(&FetchConfig {
        timeout_secs: 5,
        user_agent: "logoprep-test/1.0".to_string(),
    });
    let report = Pipeline::new(&fetcher, ImageStore::new(dir.path().join("images")))
        .run(table)
        .unwrap();
    assert_eq!(report.summary.saved, 1);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(
        requests[0].headers.get("user-agent").map(String::as_str),
        Some("logoprep-test/1.0")
    );
}

#[test]
fn aborted_pass_keeps_only_completed_rows() {
    let server = image_server::start(vec![("/a.png", Route::ok("image/png", PNG))]);
    let dir = tempdir().unwrap();
    let input = dir.path().join("orgs.csv");
    std::fs::write(
        &input,
        format!("Acme,{0},acme\nBeta,{0},beta\n", server.url("/a.png")),
    )
    .unwrap();

    let table = read_table(&input, false).unwrap();
    let fetcher = fetcher();
    let abort = Arc::new(AtomicBool::new(true));
    let report = Pipeline::new(&fetcher, ImageStore::new(dir.path().join("images")))
        .with_abort(abort)
        .run(table)
        .unwrap();

    assert!(report.summary.aborted);
    assert_eq!(report.summary.processed(), 0);
    assert!(report.table.is_empty());
    assert!(server.requests().is_empty());
}

/// Real fetcher that raises the abort token after its first request.
struct StopAfterFirst {
    inner: CurlFetcher,
    token: Arc<AtomicBool>,
}

impl Fetcher for StopAfterFirst {
    fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let res = self.inner.fetch(url);
        self.token.store(true, Ordering::Relaxed);
        res
    }
}

#[test]
fn interrupt_after_first_row_writes_that_row() {
    let server = image_server::start(vec![
        ("/a.png", Route::ok("image/png", PNG)),
        ("/b.png", Route::ok("image/png", PNG)),
    ]);
    let dir = tempdir().unwrap();
    let input = dir.path().join("orgs.csv");
    std::fs::write(
        &input,
        format!(
            "Acme,{},acme\nBeta,{},beta\n",
            server.url("/a.png"),
            server.url("/b.png")
        ),
    )
    .unwrap();

    let token = Arc::new(AtomicBool::new(false));
    let fetcher = StopAfterFirst {
        inner: fetcher(),
        token: Arc::clone(&token),
    };
    let images = dir.path().join("images");
    let report = Pipeline::new(&fetcher, ImageStore::new(&images))
        .with_abort(token)
        .run(read_table(&input, false).unwrap())
        .unwrap();

    assert!(report.summary.aborted);
    assert_eq!(report.summary.saved, 1);
    let parts = report.table.partition();
    assert_eq!(parts.success.len(), 1);
    assert!(parts.failure.is_empty());

    let out = dir.path().join("orgs_processed.csv");
    write_table(&out, &parts.success).unwrap();
    let reread = read_table(&out, false).unwrap();
    assert_eq!(reread.len(), 1);
    assert_eq!(reread.rows()[0].name, "Acme");
    assert!(images.join("acme.png").exists());
    assert!(!images.join("beta.png").exists());

    let paths: Vec<_> = server.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(paths, ["/a.png"]);
}
