use rw_documents::DocumentLoader;
use rw_domain::config::IngestConfig;
use rw_domain::error::ErrorKind;

#[tokio::test]
async fn ingest_all_keeps_going_past_failures() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("brief.txt");
    let unsupported = dir.path().join("image.png");
    let missing = dir.path().join("gone.md");
    let data = dir.path().join("numbers.csv");
    std::fs::write(&good, "Quarterly revenue grew 12%.\n").unwrap();
    std::fs::write(&unsupported, [0u8, 1, 2]).unwrap();
    std::fs::write(&data, "q,rev\nQ1,10\n").unwrap();

    let loader = DocumentLoader::default();
    let outcome = loader
        .ingest_all(&[good.clone(), unsupported, missing, data])
        .await;

    let names: Vec<&str> = outcome.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["brief.txt", "numbers.csv"]);
    assert_eq!(outcome.documents[0].content, "Quarterly revenue grew 12%.");

    assert_eq!(outcome.failures.len(), 2);
    assert_eq!(outcome.failures[0].kind, ErrorKind::Input);
    assert!(outcome.failures[0].name.ends_with("image.png"));
    assert!(outcome.failures[1].name.ends_with("gone.md"));
}

#[tokio::test]
async fn oversized_file_rejected_from_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("long.txt");
    std::fs::write(&path, "x".repeat(2_048)).unwrap();

    let loader = DocumentLoader::new(&IngestConfig { max_file_bytes: 1_024 });
    let err = loader.ingest_path(&path).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
    assert!(err.to_string().contains("too large"));
}
