//! Integration tests for the subject and run pipeline.
//!
//! These tests build a small MRIQC result tree in a temp directory and run the
//! pipeline against a stub converter, so no `csv2nidm` install is needed.

use mriqc_nidm_core::{
    run, FileOutcome, NidmError, ReferenceDictionaries, Result, RunOptions, SemanticConverter,
    SubjectProcessor, SubjectStatus,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const T1W_RECORD: &str = r#"{
    "cjv": 0.4521,
    "cnr": 3.12,
    "bids_meta": {"subject": "0051456", "modality": "T1w", "datatype": "anat", "suffix": "T1w"},
    "provenance": {"md5sum": "d41d8cd98f00b204e9800998ecf8427e", "version": "23.1.0"},
    "qi_1": 0.0,
    "qi_2": 0.0021,
    "size_x": 256, "size_y": 256, "size_z": 160,
    "spacing_x": 1.0, "spacing_y": 1.0, "spacing_z": 1.2,
    "snr_total": 11.7
}"#;

/// Stub converter: writes a graph unless the table name contains `fail_on`.
struct StubConverter {
    fail_on: Option<&'static str>,
    calls: RefCell<Vec<(PathBuf, ReferenceDictionaries, PathBuf)>>,
}

impl StubConverter {
    fn new() -> Self {
        Self {
            fail_on: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn failing_on(pattern: &'static str) -> Self {
        Self {
            fail_on: Some(pattern),
            ..Self::new()
        }
    }
}

impl SemanticConverter for StubConverter {
    fn name(&self) -> &str {
        "stub"
    }

    fn convert(
        &self,
        table: &Path,
        dictionaries: &ReferenceDictionaries,
        output: &Path,
    ) -> Result<()> {
        self.calls.borrow_mut().push((
            table.to_path_buf(),
            dictionaries.clone(),
            output.to_path_buf(),
        ));
        let name = table.to_string_lossy();
        if self.fail_on.is_some_and(|p| name.contains(p)) {
            return Err(NidmError::ConverterFailed {
                program: "stub".into(),
                message: "exited with status: 1".into(),
            });
        }
        fs::write(output, "@prefix prov: <http://www.w3.org/ns/prov#> .\n")?;
        Ok(())
    }
}

/// Create `<root>/in/sub-<id>/anat/` and return (input_root, output_root, anat).
fn create_subject(root: &Path, subject: &str) -> (PathBuf, PathBuf, PathBuf) {
    let input = root.join("in");
    let anat = input.join(format!("sub-{subject}")).join("anat");
    fs::create_dir_all(&anat).expect("Failed to create anat dir");
    (input, root.join("out"), anat)
}

#[test]
fn test_subject_with_valid_record_produces_table_and_graph() {
    let temp = TempDir::new().unwrap();
    let (input, output, anat) = create_subject(temp.path(), "0051456");
    let json = anat.join("sub-0051456_T1w.json");
    fs::write(&json, T1W_RECORD).unwrap();

    let converter = StubConverter::new();
    let dicts = ReferenceDictionaries::new("/opt/map.csv", "/opt/sw.csv");
    let report = SubjectProcessor::new(&input, &output, &converter, &dicts).process("0051456");

    assert!(report.succeeded());
    assert_eq!(report.converted(), 1);

    let semantic = output.join("sub-0051456").join("semantic");
    let table = semantic.join("sub-0051456_T1w.csv");
    let graph = semantic.join("sub-0051456_T1w.ttl");
    assert!(graph.exists());

    let text = fs::read_to_string(&table).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "subject_id,session,task,run,cjv,cnr,snr_total,source_url"
    );
    let expected_url = input
        .join("sub-0051456")
        .join("sub-0051456_sub-0051456_T1w.html");
    assert_eq!(
        lines.next().unwrap(),
        format!("0051456,,,,0.4521,3.12,11.7,{}", expected_url.display())
    );
    assert!(lines.next().is_none());

    let calls = converter.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0], (table, dicts.clone(), graph));
}

#[test]
fn test_non_finite_metrics_become_empty_cells() {
    let temp = TempDir::new().unwrap();
    let (input, output, anat) = create_subject(temp.path(), "01");
    fs::write(
        anat.join("sub-01_T1w.json"),
        r#"{"cjv": 0.41, "summary_bg_k": NaN, "fber": -Infinity, "bids_meta": {"subject": "01"}}"#,
    )
    .unwrap();

    let converter = StubConverter::new();
    let dicts = ReferenceDictionaries::default();
    let report = SubjectProcessor::new(&input, &output, &converter, &dicts).process("01");

    assert_eq!(report.converted(), 1);
    let semantic = output.join("sub-01").join("semantic");
    assert!(semantic.join("sub-01_T1w.ttl").exists());

    let text = fs::read_to_string(semantic.join("sub-01_T1w.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "subject_id,session,task,run,cjv,summary_bg_k,fber,source_url"
    );
    assert!(lines[1].starts_with("01,,,,0.41,,,"));
}

#[test]
fn test_missing_anat_dir_fails_subject_without_output() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in");
    let output = temp.path().join("out");
    fs::create_dir_all(input.join("sub-02")).unwrap();

    let converter = StubConverter::new();
    let dicts = ReferenceDictionaries::default();
    let report = SubjectProcessor::new(&input, &output, &converter, &dicts).process("02");

    assert!(!report.succeeded());
    assert_eq!(
        report.status,
        SubjectStatus::NotFound(input.join("sub-02").join("anat"))
    );
    assert!(!output.join("sub-02").exists());
    assert!(converter.calls.borrow().is_empty());
}

// Per-file failures do not fail the subject. This asserts the current
// behaviour; tightening it would flip `succeeded()` here.
#[test]
fn test_malformed_file_is_skipped_and_subject_still_succeeds() {
    let temp = TempDir::new().unwrap();
    let (input, output, anat) = create_subject(temp.path(), "03");
    fs::write(anat.join("sub-03_T1w.json"), T1W_RECORD).unwrap();
    fs::write(anat.join("sub-03_T2w.json"), "{\"cjv\": 0.3,,}").unwrap();

    let converter = StubConverter::new();
    let dicts = ReferenceDictionaries::default();
    let report = SubjectProcessor::new(&input, &output, &converter, &dicts).process("03");

    assert!(report.succeeded());
    assert_eq!(report.converted(), 1);
    assert_eq!(report.skipped(), 1);
    assert!(matches!(
        report.files[1].outcome,
        FileOutcome::TransformFailed { .. }
    ));

    let semantic = output.join("sub-03").join("semantic");
    assert!(semantic.join("sub-03_T1w.csv").exists());
    assert!(semantic.join("sub-03_T1w.ttl").exists());
    assert!(!semantic.join("sub-03_T2w.csv").exists());
    assert!(!semantic.join("sub-03_T2w.ttl").exists());
    assert_eq!(converter.calls.borrow().len(), 1);
}

#[test]
fn test_converter_failure_is_skipped_and_keeps_going() {
    let temp = TempDir::new().unwrap();
    let (input, output, anat) = create_subject(temp.path(), "04");
    fs::write(anat.join("sub-04_T1w.json"), T1W_RECORD).unwrap();
    fs::write(anat.join("sub-04_T2w.json"), T1W_RECORD).unwrap();

    let converter = StubConverter::failing_on("T1w");
    let dicts = ReferenceDictionaries::default();
    let report = SubjectProcessor::new(&input, &output, &converter, &dicts).process("04");

    assert!(report.succeeded());
    assert_eq!(report.converted(), 1);
    let semantic = output.join("sub-04").join("semantic");
    assert_eq!(
        report.files[0].outcome,
        FileOutcome::ConversionFailed {
            table: semantic.join("sub-04_T1w.csv"),
            reason: "stub failed: exited with status: 1".into(),
        }
    );
    assert!(report.files[1].is_converted());
    assert!(semantic.join("sub-04_T2w.ttl").exists());
}

#[test]
fn test_run_scans_subjects_and_reports_failures() {
    let temp = TempDir::new().unwrap();
    let (input, output, anat) = create_subject(temp.path(), "01");
    fs::write(anat.join("sub-01_T1w.json"), T1W_RECORD).unwrap();
    // Subject directory without anat/
    fs::create_dir_all(input.join("sub-02").join("func")).unwrap();
    // MRIQC group report next to the subjects
    fs::write(input.join("sub-01_T1w.html"), "<html/>").unwrap();

    let options = RunOptions::new(&input, &output);
    let summary = run(&options, &StubConverter::new()).unwrap();

    assert_eq!(summary.subjects.len(), 2);
    assert_eq!(summary.failed_subjects(), vec!["02"]);
    assert_eq!(summary.files_converted(), 1);
    assert_eq!(summary.exit_code(), 1);
}

#[test]
fn test_run_with_explicit_labels() {
    let temp = TempDir::new().unwrap();
    let (input, output, anat) = create_subject(temp.path(), "01");
    fs::write(anat.join("sub-01_T1w.json"), T1W_RECORD).unwrap();
    let (_, _, other) = create_subject(temp.path(), "05");
    fs::write(other.join("sub-05_T1w.json"), T1W_RECORD).unwrap();

    let options = RunOptions::new(&input, &output).with_participant_label("sub-01");
    let summary = run(&options, &StubConverter::new()).unwrap();

    assert!(summary.succeeded());
    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.subjects.len(), 1);
    assert!(!output.join("sub-05").exists());
}

#[test]
fn test_run_without_subjects_fails() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in");
    fs::create_dir_all(&input).unwrap();

    let options = RunOptions::new(&input, temp.path().join("out"));
    let converter = StubConverter::new();
    assert!(matches!(
        run(&options, &converter),
        Err(NidmError::NoSubjects)
    ));

    let blank = options.clone().with_participant_label("   ");
    assert!(matches!(run(&blank, &converter), Err(NidmError::NoSubjects)));
    assert!(converter.calls.borrow().is_empty());
}
