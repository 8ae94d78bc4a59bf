// libs/consultation-cell/tests/pipeline_test.rs
//
// Artifact pipeline tests: draft source exclusivity, page-order
// preservation, mid-pipeline aborts, and report tolerance in the
// completion workflow.

use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use consultation_cell::models::{
    ArtifactDraft, ArtifactError, ArtifactSource, CaptureOptions, CompressionBudget,
    FormSnapshot, NamedImage, RasterImage,
};
use consultation_cell::services::pipeline::{
    self, ArtifactPipeline, AssetStore, DocumentComposer, FormRasterizer, ImageCompressor,
};
use consultation_cell::ConsultationService;
use shared_utils::test_utils::TestConfig;

mock! {
    Compressor {}

    #[async_trait]
    impl ImageCompressor for Compressor {
        async fn compress(
            &self,
            data: &[u8],
            budget: &CompressionBudget,
        ) -> Result<Vec<u8>, ArtifactError>;
    }
}

mock! {
    Composer {}

    #[async_trait]
    impl DocumentComposer for Composer {
        async fn merge_images(&self, images: &[NamedImage]) -> Result<Vec<u8>, ArtifactError>;
        async fn compact(&self, pdf: Vec<u8>) -> Result<Vec<u8>, ArtifactError>;
        async fn compose_raster(&self, raster: &RasterImage) -> Result<Vec<u8>, ArtifactError>;
    }
}

mock! {
    Rasterizer {}

    #[async_trait]
    impl FormRasterizer for Rasterizer {
        async fn capture(
            &self,
            snapshot: &FormSnapshot,
            options: &CaptureOptions,
        ) -> Result<RasterImage, ArtifactError>;
    }
}

mock! {
    Store {}

    #[async_trait]
    impl AssetStore for Store {
        async fn upload(
            &self,
            data: Vec<u8>,
            destination_path: &str,
        ) -> Result<String, ArtifactError>;
    }
}

fn named(name: &str, data: &[u8]) -> NamedImage {
    NamedImage {
        name: name.to_string(),
        data: data.to_vec(),
    }
}

// ==============================================================================
// DRAFT SOURCE EXCLUSIVITY
// ==============================================================================

#[test]
fn form_entry_is_rejected_while_images_exist() {
    let mut draft = ArtifactDraft::new();
    draft.add_image(named("scan.jpg", b"jpeg")).unwrap();

    let result = draft.open_form(FormSnapshot { png_data: b"png".to_vec() });
    assert_matches!(result, Err(ArtifactError::SourceConflict));

    // Removing the last image re-enables the form path
    draft.remove_image(0).unwrap();
    draft
        .open_form(FormSnapshot { png_data: b"png".to_vec() })
        .unwrap();
    assert!(draft.has_form());
}

#[test]
fn image_entry_is_rejected_while_a_form_is_open() {
    let mut draft = ArtifactDraft::new();
    draft
        .open_form(FormSnapshot { png_data: b"png".to_vec() })
        .unwrap();

    let result = draft.add_image(named("scan.jpg", b"jpeg"));
    assert_matches!(result, Err(ArtifactError::SourceConflict));

    draft.close_form().unwrap();
    draft.add_image(named("scan.jpg", b"jpeg")).unwrap();
    assert_eq!(draft.images().len(), 1);
}

#[test]
fn empty_draft_cannot_become_a_source() {
    let result = ArtifactDraft::new().into_source();
    assert_matches!(result, Err(ArtifactError::EmptySource));
}

#[test]
fn sealed_draft_carries_exactly_one_source() {
    let mut draft = ArtifactDraft::new();
    draft.add_image(named("a.jpg", b"a")).unwrap();
    draft.add_image(named("b.jpg", b"b")).unwrap();

    let source = draft.into_source().unwrap();
    assert_matches!(source, ArtifactSource::UploadedImages(images) => {
        assert_eq!(images.len(), 2);
    });
}

// ==============================================================================
// PIPELINE RUNS
// ==============================================================================

#[tokio::test]
async fn image_run_preserves_page_order_through_every_stage() {
    let mut compressor = MockCompressor::new();
    // Compression output is the input with a marker so ordering is traceable
    compressor
        .expect_compress()
        .times(3)
        .returning(|data, _| {
            let mut out = data.to_vec();
            out.extend_from_slice(b"+c");
            Ok(out)
        });

    let mut composer = MockComposer::new();
    composer
        .expect_merge_images()
        .withf(|images| {
            images.len() == 3
                && images[0].name == "A.jpg"
                && images[1].name == "B.png"
                && images[2].name == "C.jpg"
                && images.iter().all(|image| image.data.ends_with(b"+c"))
        })
        .times(1)
        .returning(|_| Ok(b"%PDF-merged".to_vec()));
    composer
        .expect_compact()
        .times(1)
        .returning(|pdf| Ok(pdf));

    let mut store = MockStore::new();
    store
        .expect_upload()
        .withf(|data, destination| data == b"%PDF-merged" && destination == "p/c/prescription")
        .times(1)
        .returning(|_, _| Ok("https://assets.example/p/c/prescription".to_string()));

    let pipeline = ArtifactPipeline::new(
        Arc::new(compressor),
        Arc::new(composer),
        Arc::new(MockRasterizer::new()),
        Arc::new(store),
    );

    let source = ArtifactSource::UploadedImages(vec![
        named("A.jpg", b"a"),
        named("B.png", b"b"),
        named("C.jpg", b"c"),
    ]);

    let uri = pipeline.run(source, "p/c/prescription").await.unwrap();
    assert_eq!(uri, "https://assets.example/p/c/prescription");
}

#[tokio::test]
async fn form_run_captures_then_composes_single_page() {
    let mut rasterizer = MockRasterizer::new();
    rasterizer
        .expect_capture()
        .withf(|snapshot, options| {
            snapshot.png_data == b"form-png" && (options.scale - 1.5).abs() < f64::EPSILON
        })
        .times(1)
        .returning(|snapshot, _| {
            Ok(RasterImage {
                width_px: 900,
                height_px: 1200,
                png_data: snapshot.png_data.clone(),
            })
        });

    let mut composer = MockComposer::new();
    composer
        .expect_compose_raster()
        .withf(|raster| raster.width_px == 900 && raster.height_px == 1200)
        .times(1)
        .returning(|_| Ok(b"%PDF-form".to_vec()));

    let mut store = MockStore::new();
    store
        .expect_upload()
        .times(1)
        .returning(|_, _| Ok("https://assets.example/p/c/prescription".to_string()));

    let pipeline = ArtifactPipeline::new(
        Arc::new(MockCompressor::new()),
        Arc::new(composer),
        Arc::new(rasterizer),
        Arc::new(store),
    );

    let source = ArtifactSource::RenderedForm(FormSnapshot {
        png_data: b"form-png".to_vec(),
    });

    pipeline.run(source, "p/c/prescription").await.unwrap();
}

#[tokio::test]
async fn compression_failure_aborts_before_any_upload() {
    let mut compressor = MockCompressor::new();
    compressor
        .expect_compress()
        .times(1)
        .returning(|_, _| Err(ArtifactError::Image("corrupt image".to_string())));

    let mut composer = MockComposer::new();
    composer.expect_merge_images().times(0);

    let mut store = MockStore::new();
    store.expect_upload().times(0);

    let pipeline = ArtifactPipeline::new(
        Arc::new(compressor),
        Arc::new(composer),
        Arc::new(MockRasterizer::new()),
        Arc::new(store),
    );

    let source = ArtifactSource::UploadedImages(vec![named("a.jpg", b"a")]);
    let result = pipeline.run(source, "p/c/prescription").await;

    assert_matches!(result, Err(ArtifactError::Image(_)));
}

// ==============================================================================
// COMPLETION WORKFLOW
// ==============================================================================

fn form_pipeline_with_report_behavior(
    report_upload_fails: bool,
) -> ArtifactPipeline {
    // Prescription comes from the form path; report images go through the
    // compressor, whose outcome is the variable under test
    let mut rasterizer = MockRasterizer::new();
    rasterizer.expect_capture().returning(|snapshot, _| {
        Ok(RasterImage {
            width_px: 800,
            height_px: 1100,
            png_data: snapshot.png_data.clone(),
        })
    });

    let mut composer = MockComposer::new();
    composer
        .expect_compose_raster()
        .returning(|_| Ok(b"%PDF-form".to_vec()));
    composer
        .expect_merge_images()
        .returning(|_| Ok(b"%PDF-report".to_vec()));
    composer.expect_compact().returning(|pdf| Ok(pdf));

    let mut compressor = MockCompressor::new();
    compressor
        .expect_compress()
        .returning(|data, _| Ok(data.to_vec()));

    let mut store = MockStore::new();
    store.expect_upload().returning(move |_, destination| {
        if report_upload_fails && destination.ends_with("/report") {
            Err(ArtifactError::Upload("bucket rejected the object".to_string()))
        } else {
            Ok(format!("https://assets.example/{}", destination))
        }
    });

    ArtifactPipeline::new(
        Arc::new(compressor),
        Arc::new(composer),
        Arc::new(rasterizer),
        Arc::new(store),
    )
}

#[tokio::test]
async fn completion_records_both_artifact_urls() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let service = ConsultationService::new(&config);

    let practitioner_id = Uuid::new_v4();
    let consultation_id = Uuid::new_v4();
    let prescription_url = format!(
        "https://assets.example/{}",
        pipeline::prescription_path(practitioner_id, consultation_id)
    );

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/consultations"))
        .and(query_param("id", format!("eq.{}", consultation_id)))
        .and(body_partial_json(json!({
            "status": "completed",
            "prescription_url": prescription_url,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({ "id": consultation_id })]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = service
        .complete_consultation(
            &form_pipeline_with_report_behavior(false),
            practitioner_id,
            consultation_id,
            ArtifactSource::RenderedForm(FormSnapshot { png_data: b"form".to_vec() }),
            vec![named("report.jpg", b"r")],
            Some("Follow up in two weeks".to_string()),
            "test_token",
        )
        .await
        .expect("completion should succeed");

    assert_eq!(outcome.prescription_url, prescription_url);
    assert_eq!(
        outcome.report_url.as_deref(),
        Some(
            format!(
                "https://assets.example/{}",
                pipeline::report_path(practitioner_id, consultation_id)
            )
            .as_str()
        )
    );
}

#[tokio::test]
async fn report_failure_is_tolerated_and_record_proceeds_without_it() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let service = ConsultationService::new(&config);

    let practitioner_id = Uuid::new_v4();
    let consultation_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/consultations"))
        .and(body_partial_json(json!({ "report_url": null })))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![json!({ "id": consultation_id })]))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = service
        .complete_consultation(
            &form_pipeline_with_report_behavior(true),
            practitioner_id,
            consultation_id,
            ArtifactSource::RenderedForm(FormSnapshot { png_data: b"form".to_vec() }),
            vec![named("report.jpg", b"r")],
            None,
            "test_token",
        )
        .await
        .expect("completion should tolerate a failed report");

    assert!(outcome.report_url.is_none());
}

#[tokio::test]
async fn prescription_failure_aborts_before_the_record_is_touched() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_base_url(&mock_server.uri()).to_app_config();
    let service = ConsultationService::new(&config);

    let mut store = MockStore::new();
    store
        .expect_upload()
        .times(1)
        .returning(|_, _| Err(ArtifactError::Upload("storage unavailable".to_string())));

    let mut rasterizer = MockRasterizer::new();
    rasterizer.expect_capture().returning(|snapshot, _| {
        Ok(RasterImage {
            width_px: 800,
            height_px: 1100,
            png_data: snapshot.png_data.clone(),
        })
    });

    let mut composer = MockComposer::new();
    composer
        .expect_compose_raster()
        .returning(|_| Ok(b"%PDF-form".to_vec()));

    let pipeline = ArtifactPipeline::new(
        Arc::new(MockCompressor::new()),
        Arc::new(composer),
        Arc::new(rasterizer),
        Arc::new(store),
    );

    let result = service
        .complete_consultation(
            &pipeline,
            Uuid::new_v4(),
            Uuid::new_v4(),
            ArtifactSource::RenderedForm(FormSnapshot { png_data: b"form".to_vec() }),
            Vec::new(),
            None,
            "test_token",
        )
        .await;

    assert_matches!(
        result,
        Err(consultation_cell::services::ConsultationError::Artifact(ArtifactError::Upload(_)))
    );
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}
