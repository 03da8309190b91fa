mod common;

use std::sync::atomic::Ordering;

use common::*;
use gearscan::{BatchRunner, collect_image_files};

#[test]
fn labeled_directory_is_scored() -> anyhow::Result<()> {
    let dir = create_sample_dir();
    let detector = color_detector();

    let outcome = BatchRunner::new(&detector).run(dir.path())?;

    assert_eq!(outcome.total_images, 3);
    assert_eq!(outcome.succeeded, 3);
    assert_eq!(outcome.failed, 0);
    assert_eq!(outcome.labeled_total, 2);
    // red pitting sample matches, blue scuffing sample is predicted as spalling
    assert_eq!(outcome.labeled_correct, 1);
    assert_eq!(outcome.accuracy(), Some(0.5));

    let unlabeled = outcome
        .items
        .iter()
        .find(|item| item.prediction.file_name() == "unlabeled.bmp")
        .expect("unlabeled image is reported");
    assert_eq!(unlabeled.ground_truth, None);
    assert_eq!(unlabeled.correct, None);
    Ok(())
}

#[test]
fn items_follow_sorted_file_order() -> anyhow::Result<()> {
    let dir = create_sample_dir();
    let detector = color_detector();

    let outcome = BatchRunner::new(&detector).run(dir.path())?;
    let names: Vec<String> = outcome.items.iter().map(|i| i.prediction.file_name()).collect();
    assert_eq!(names, ["pitting_sample1.jpg", "scuffing_01.png", "unlabeled.bmp"]);
    Ok(())
}

#[test]
fn missing_directory_runs_no_inference() {
    let (model, calls) = CountingModel::new(ColorKeyedModel);
    let detector = Detector::new(Box::new(model), LabelSet::gear_defects());
    let dir = tempfile::TempDir::new().unwrap();

    let result = BatchRunner::new(&detector).run(&dir.path().join("nope"));

    assert!(matches!(result, Err(DefectError::DirectoryNotFound(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn non_images_are_skipped() -> anyhow::Result<()> {
    let dir = create_sample_dir();
    std::fs::write(dir.path().join("notes.txt"), "pitting")?;
    std::fs::create_dir(dir.path().join("spalling_subdir.png"))?;

    let files = collect_image_files(dir.path())?;
    assert_eq!(files.len(), 3);

    let (model, calls) = CountingModel::new(ColorKeyedModel);
    let detector = Detector::new(Box::new(model), LabelSet::gear_defects());
    let outcome = BatchRunner::new(&detector).run(dir.path())?;
    assert_eq!(outcome.total_images, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[test]
fn unreadable_images_are_counted_as_failures() -> anyhow::Result<()> {
    let dir = create_sample_dir();
    create_corrupt_image(dir.path(), "pitting_broken.png");
    let detector = color_detector();

    let mut streamed = Vec::new();
    let outcome = BatchRunner::new(&detector)
        .run_with(dir.path(), |item| streamed.push(item.prediction.file_name()))?;

    assert_eq!(outcome.total_images, 4);
    assert_eq!(outcome.succeeded, 3);
    assert_eq!(outcome.failed, 1);
    // failures never count toward accuracy
    assert_eq!(outcome.labeled_total, 2);
    assert_eq!(streamed.len(), 4);

    let broken = &outcome.items[0];
    assert_eq!(broken.prediction.file_name(), "pitting_broken.png");
    assert!(!broken.prediction.is_success());
    assert_eq!(broken.correct, None);
    Ok(())
}

#[test]
fn runtime_failures_do_not_stop_the_batch() -> anyhow::Result<()> {
    let dir = create_sample_dir();
    let detector = Detector::new(Box::new(FailingModel), LabelSet::gear_defects());

    let outcome = BatchRunner::new(&detector).run(dir.path())?;
    assert_eq!(outcome.total_images, 3);
    assert_eq!(outcome.failed, 3);
    assert_eq!(outcome.accuracy(), None);
    for item in &outcome.items {
        assert!(item.prediction.error().unwrap().contains("runtime exploded"));
    }
    Ok(())
}

#[test]
fn empty_directory_has_no_accuracy() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let outcome = BatchRunner::new(&color_detector()).run(dir.path())?;
    assert_eq!(outcome.total_images, 0);
    assert_eq!(outcome.accuracy(), None);
    Ok(())
}

#[test]
fn predictions_are_repeatable_and_bounded() {
    let dir = create_sample_dir();
    let detector = color_detector();
    let path = dir.path().join("scuffing_01.png");

    let first = detector.predict_path(&path);
    let second = detector.predict_path(&path);
    assert_eq!(first, second);

    let report = first.report().expect("prediction succeeds");
    assert_eq!(report.label, "spalling");
    assert!((0.0..=1.0).contains(&report.confidence));
    let PredictionDetails::Classification { probabilities } = &report.details else {
        panic!("classifier returns probabilities");
    };
    let sum: f32 = probabilities.iter().map(|p| p.probability).sum();
    assert!((sum - 1.0).abs() < 1e-4);
}

#[test]
fn detection_headline_is_strongest_box() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_test_image(dir.path(), "gear.png", GRAY);
    let detector = Detector::new(
        Box::new(FixedBoxesModel {
            boxes: vec![
                RawBox {
                    class_index: 0,
                    confidence: 0.4,
                    xyxy: [1.0, 1.0, 10.0, 10.0],
                },
                RawBox {
                    class_index: 3,
                    confidence: 0.9,
                    xyxy: [20.0, 20.0, 40.0, 40.0],
                },
            ],
        }),
        LabelSet::gear_defects(),
    );

    let prediction = detector.predict_path(&path);
    let report = prediction.report().unwrap();
    assert_eq!(report.label, "spalling");
    assert_eq!(report.confidence, 0.9);
    let PredictionDetails::Detection { boxes } = &report.details else {
        panic!("detector returns boxes");
    };
    assert_eq!(boxes.len(), 2);
}

#[test]
fn detection_without_boxes_reports_no_defect() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = create_test_image(dir.path(), "clean.png", GRAY);
    let detector = Detector::new(Box::new(FixedBoxesModel { boxes: vec![] }), LabelSet::gear_defects());

    let report = detector.predict_path(&path).report().cloned().unwrap();
    assert_eq!(report.label, "none");
    assert_eq!(report.confidence, 0.0);
}

#[test]
fn model_class_names_override_configured_order() {
    let dir = tempfile::TempDir::new().unwrap();
    // gray maps to index 0, red to index 1
    let gray = create_test_image(dir.path(), "pitting_a.png", GRAY);
    create_test_image(dir.path(), "indentation_b.png", RED);
    let detector = Detector::new(Box::new(EmbeddedLabelsModel::new()), LabelSet::gear_defects());

    assert_eq!(detector.labels(), &LabelSet::new(EmbeddedLabelsModel::ORDER));

    let report = detector.predict_path(&gray).report().cloned().unwrap();
    assert_eq!(report.label, "pitting");
    let PredictionDetails::Classification { probabilities } = &report.details else {
        panic!("classifier returns probabilities");
    };
    let names: Vec<&str> = probabilities.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(names, EmbeddedLabelsModel::ORDER);

    // both files are scored against the model's own order
    let outcome = BatchRunner::new(&detector).run(dir.path()).unwrap();
    assert_eq!(outcome.labeled_total, 2);
    assert_eq!(outcome.labeled_correct, 2);
}

#[test]
fn collected_files_can_be_run_directly() -> anyhow::Result<()> {
    let dir = create_sample_dir();
    let files = collect_image_files(dir.path())?;
    let mut seen = 0;
    let outcome = BatchRunner::new(&color_detector()).run_files(dir.path(), &files, |_| seen += 1);
    assert_eq!(outcome.total_images, files.len());
    assert_eq!(seen, files.len());
    Ok(())
}
