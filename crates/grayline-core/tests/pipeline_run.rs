//! End-to-end runs of the pipeline with in-memory fetchers and temp storage.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use grayline_core::config::LimitsConfig;
use grayline_core::pipeline::luma;
use grayline_core::{
    Collaborators, Config, FsImageStore, GraylineError, ImageDecoder, ImageStore, Pipeline,
    PipelineError, PipelineResult,
};

fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color)));
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Serves canned bodies; unknown identifiers fail like a 404.
struct MapFetcher {
    bodies: HashMap<String, Vec<u8>>,
    calls: AtomicU32,
}

impl MapFetcher {
    fn new(bodies: impl IntoIterator<Item = (&'static str, Vec<u8>)>) -> Self {
        Self {
            bodies: bodies
                .into_iter()
                .map(|(id, body)| (id.to_string(), body))
                .collect(),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl grayline_core::Fetcher for MapFetcher {
    async fn fetch(&self, source_id: &str) -> PipelineResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies
            .get(source_id)
            .cloned()
            .ok_or_else(|| PipelineError::Fetch {
                source_id: source_id.to_string(),
                message: "HTTP status client error (404 Not Found)".into(),
            })
    }
}

/// Wraps a store and sleeps before every write.
struct SlowStore {
    inner: FsImageStore,
    delay: Duration,
}

impl ImageStore for SlowStore {
    fn persist(&self, image: &DynamicImage, key: &str) -> PipelineResult<PathBuf> {
        std::thread::sleep(self.delay);
        self.inner.persist(image, key)
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    input_dir: PathBuf,
    output_dir: PathBuf,
    fetcher: Arc<MapFetcher>,
    pipeline: Pipeline,
}

fn harness(fetcher: MapFetcher, config: Config) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("input");
    let output_dir = dir.path().join("output");
    let fetcher = Arc::new(fetcher);

    let collaborators = Collaborators {
        fetcher: fetcher.clone(),
        decoder: Arc::new(ImageDecoder::new(LimitsConfig::default())),
        input_store: Arc::new(FsImageStore::open(&input_dir).unwrap()),
        output_store: Arc::new(FsImageStore::open(&output_dir).unwrap()),
    };
    let pipeline = Pipeline::new(&config, collaborators).unwrap();

    Harness {
        _dir: dir,
        input_dir,
        output_dir,
        fetcher,
        pipeline,
    }
}

#[tokio::test]
async fn one_success_one_fetch_failure() {
    let h = harness(
        MapFetcher::new([("a", png_bytes(4, 3, [200, 40, 90]))]),
        Config::default(),
    );

    let report = h.pipeline.run(["a", "b"]).await.unwrap();

    assert_eq!(report.summary.submitted, 2);
    assert_eq!(report.summary.processed, 1);
    assert_eq!(report.summary.fetch_failures, 1);
    assert_eq!(report.registry.source_ids(), vec!["a"]);

    let gray = report.registry.get("a").unwrap();
    let gray = gray.as_luma8().unwrap();
    assert_eq!(gray.dimensions(), (4, 3));
    assert!(gray.pixels().all(|p| p.0[0] == luma(200, 40, 90)));

    assert!(h.input_dir.join("a.png").is_file());
    assert!(h.output_dir.join("a.png").is_file());
    assert!(!h.output_dir.join("b.png").exists());
}

#[tokio::test]
async fn empty_input_terminates_immediately() {
    let h = harness(MapFetcher::new([]), Config::default());

    let report = tokio::time::timeout(Duration::from_secs(5), h.pipeline.run(Vec::<String>::new()))
        .await
        .expect("pipeline should drain without input")
        .unwrap();

    assert_eq!(report.summary.submitted, 0);
    assert_eq!(report.summary.processed, 0);
    assert!(report.registry.is_empty());
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn every_identifier_processed_when_nothing_fails() {
    let ids = ["https://img/1", "https://img/2", "https://img/3", "https://img/4"];
    let h = harness(
        MapFetcher::new(ids.iter().map(|id| (*id, png_bytes(2, 2, [10, 20, 30])))),
        Config::default(),
    );

    let report = h.pipeline.run(ids).await.unwrap();

    assert_eq!(report.summary.processed, ids.len());
    assert_eq!(report.summary.dropped(), 0);
    for n in 1..=4 {
        assert!(h.output_dir.join(format!("{n}.png")).is_file());
    }
}

#[tokio::test]
async fn failure_in_the_middle_does_not_affect_neighbours() {
    let h = harness(
        MapFetcher::new([
            ("first", png_bytes(1, 1, [1, 2, 3])),
            ("broken", b"<html>503</html>".to_vec()),
            ("third", png_bytes(1, 1, [4, 5, 6])),
        ]),
        Config::default(),
    );

    let report = h
        .pipeline
        .run(["first", "missing", "broken", "third"])
        .await
        .unwrap();

    assert_eq!(report.registry.source_ids(), vec!["first", "third"]);
    assert_eq!(report.summary.fetch_failures, 1);
    assert_eq!(report.summary.decode_failures, 1);
    assert!(report.summary.processed <= report.summary.submitted);
}

#[tokio::test]
async fn duplicate_identifiers_share_one_entry() {
    let h = harness(
        MapFetcher::new([("same", png_bytes(1, 1, [9, 9, 9]))]),
        Config::default(),
    );

    let report = h.pipeline.run(["same", "same"]).await.unwrap();

    assert_eq!(report.summary.submitted, 2);
    assert_eq!(report.summary.processed, 1);
    assert_eq!(h.fetcher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn slow_collector_with_tiny_buffer_drops_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let ids: Vec<String> = (0..5).map(|i| format!("slow-{i}")).collect();
    let fetcher = Arc::new(MapFetcher::new(
        ["slow-0", "slow-1", "slow-2", "slow-3", "slow-4"]
            .into_iter()
            .map(|id| (id, png_bytes(3, 3, [50, 60, 70]))),
    ));

    let mut config = Config::default();
    config.pipeline.fetch_buffer = 1;
    let collaborators = Collaborators {
        fetcher: fetcher.clone(),
        decoder: Arc::new(ImageDecoder::new(config.limits.clone())),
        input_store: Arc::new(FsImageStore::open(dir.path().join("in")).unwrap()),
        output_store: Arc::new(SlowStore {
            inner: FsImageStore::open(dir.path().join("out")).unwrap(),
            delay: Duration::from_millis(20),
        }),
    };

    let report = Pipeline::new(&config, collaborators)
        .unwrap()
        .run(ids.clone())
        .await
        .unwrap();

    assert_eq!(report.summary.processed, 5);
    assert_eq!(report.registry.source_ids(), ids);
}

#[tokio::test]
async fn runs_do_not_share_registries() {
    let h = harness(
        MapFetcher::new([
            ("x", png_bytes(1, 1, [0, 0, 0])),
            ("y", png_bytes(1, 1, [255, 255, 255])),
        ]),
        Config::default(),
    );

    let first = h.pipeline.run(["x"]).await.unwrap();
    let second = h.pipeline.run(["y"]).await.unwrap();

    assert_eq!(first.registry.source_ids(), vec!["x"]);
    assert_eq!(second.registry.source_ids(), vec!["y"]);
    assert_eq!(second.summary.processed, 1);
}

#[test]
fn zero_sized_buffers_are_rejected_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let collaborators = Collaborators {
        fetcher: Arc::new(MapFetcher::new([("a", png_bytes(1, 1, [0, 0, 0]))])),
        decoder: Arc::new(ImageDecoder::new(LimitsConfig::default())),
        input_store: Arc::new(FsImageStore::open(dir.path().join("in")).unwrap()),
        output_store: Arc::new(FsImageStore::open(dir.path().join("out")).unwrap()),
    };

    let mut config = Config::default();
    config.pipeline.fetch_buffer = 0;
    let err = Pipeline::new(&config, collaborators.clone()).err().unwrap();
    assert!(matches!(err, GraylineError::Config(_)));

    config.pipeline.fetch_buffer = 1;
    config.pipeline.id_buffer = 0;
    assert!(Pipeline::new(&config, collaborators).is_err());
}
