use rw_domain::config::{Config, ConfigSeverity, GenerationMode};

#[test]
fn empty_file_yields_working_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.budget.chars_per_token, 4);
    assert_eq!(config.budget.max_document_tokens, 3_000);
    assert_eq!(config.budget.max_section_context_tokens, 8_000);
    assert_eq!(config.budget.max_review_tokens, 15_000);
    assert_eq!(config.pricing.default_model, "gpt-4o");
    assert_eq!(config.pricing.models.len(), 6);
    assert_eq!(config.llm.model, "gpt-4o");
    assert_eq!(config.llm.auth.env.as_deref(), Some("OPENAI_API_KEY"));
    assert_eq!(config.generation.mode, GenerationMode::Batched);
    assert!(config.generation.run_review);
    assert!((config.session.max_budget_usd - 5.0).abs() < f64::EPSILON);
    assert_eq!(config.ingest.max_file_bytes, 10 * 1024 * 1024);
}

#[test]
fn defaults_validate_cleanly() {
    let issues = Config::default().validate();
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn partial_sections_keep_other_defaults() {
    let config: Config = toml::from_str(
        r#"
        [llm]
        model = "gpt-4o-mini"

        [generation]
        mode = "sequential"

        [session]
        max_budget_usd = 1.5
        "#,
    )
    .unwrap();
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    assert_eq!(config.generation.mode, GenerationMode::Sequential);
    assert_eq!(config.generation.section_max_tokens, 4_000);
    assert!((config.session.max_budget_usd - 1.5).abs() < f64::EPSILON);
}

#[test]
fn validate_flags_bad_values() {
    let mut config = Config::default();
    config.budget.chars_per_token = 0;
    config.session.max_budget_usd = -1.0;
    config.llm.model = "my-local-model".into();

    let issues = config.validate();
    let errors: Vec<&str> = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .map(|i| i.field.as_str())
        .collect();
    assert!(errors.contains(&"budget.chars_per_token"));
    assert!(errors.contains(&"session.max_budget_usd"));

    let warning = issues
        .iter()
        .find(|i| i.field == "llm.model")
        .expect("unpriced model warning");
    assert_eq!(warning.severity, ConfigSeverity::Warning);
    assert!(warning.to_string().starts_with("[WARN] llm.model"));
}
