use std::io::Write;
use std::path::PathBuf;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 11] = [
    "PDFRAG_DATA_DIR",
    "PDFRAG_STORE_DIR",
    "PDFRAG_LLM_BASE_URL",
    "PDFRAG_LLM_MODEL",
    "PDFRAG_LLM_EMBEDDING_MODEL",
    "PDFRAG_LLM_JUDGE_MODEL",
    "PDFRAG_CHUNK_SIZE",
    "PDFRAG_CHUNK_OVERLAP",
    "PDFRAG_TOP_K",
    "PDFRAG_REFRESH_CHANGED",
    "PDFRAG_MAX_FILE_SIZE",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.paths.data_dir, PathBuf::from("data"));
    assert_eq!(config.paths.store_dir, PathBuf::from("chroma"));
    assert_eq!(config.llm.base_url, "http://localhost:11434");
    assert_eq!(config.llm.model, "mistral");
    assert_eq!(config.llm.embedding_model, "nomic-embed-text");
    assert_eq!(config.llm.judge_model, "mistral");
    assert_eq!(config.splitter.chunk_size, 800);
    assert_eq!(config.splitter.chunk_overlap, 80);
    assert_eq!(config.retrieval.top_k, 5);
    assert!(!config.ingest.refresh_changed);
    assert_eq!(
        config.ingest.max_file_size,
        pdfrag_memory::document::DEFAULT_MAX_FILE_SIZE
    );
    assert_eq!(config.eval.cases.len(), 2);
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let config = Config::load(std::path::Path::new("/nonexistent/pdfrag.toml")).unwrap();
    assert_eq!(config.llm.model, "mistral");
    assert_eq!(config.paths.data_dir, PathBuf::from("data"));
}

#[test]
#[serial]
fn parse_partial_toml() {
    clear_env();
    let file = write_config(
        r#"
[paths]
data_dir = "pdfs"

[llm]
model = "llama3"

[splitter]
chunk_size = 400
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.paths.data_dir, PathBuf::from("pdfs"));
    assert_eq!(config.paths.store_dir, PathBuf::from("chroma"));
    assert_eq!(config.llm.model, "llama3");
    assert_eq!(config.llm.embedding_model, "nomic-embed-text");
    assert_eq!(config.splitter.chunk_size, 400);
    assert_eq!(config.splitter.chunk_overlap, 80);
}

#[test]
#[serial]
fn parse_eval_cases() {
    clear_env();
    let file = write_config(
        r#"
[[eval.cases]]
question = "How many players?"
expected = "2 to 6"
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.eval.cases.len(), 1);
    assert_eq!(config.eval.cases[0].expected, "2 to 6");
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    clear_env();
    let file = write_config("[splitter\nchunk_size = ");
    let err = Config::load(file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    let file = write_config("[llm]\nmodel = \"llama3\"\n");
    unsafe {
        std::env::set_var("PDFRAG_LLM_MODEL", "phi3");
        std::env::set_var("PDFRAG_DATA_DIR", "/srv/pdfs");
        std::env::set_var("PDFRAG_STORE_DIR", "/srv/store");
        std::env::set_var("PDFRAG_LLM_JUDGE_MODEL", "judge");
        std::env::set_var("PDFRAG_TOP_K", "3");
        std::env::set_var("PDFRAG_REFRESH_CHANGED", "true");
        std::env::set_var("PDFRAG_MAX_FILE_SIZE", "1024");
    }

    let config = Config::load(file.path()).unwrap();
    clear_env();

    assert_eq!(config.llm.model, "phi3");
    assert_eq!(config.llm.judge_model, "judge");
    assert_eq!(config.paths.data_dir, PathBuf::from("/srv/pdfs"));
    assert_eq!(config.paths.store_dir, PathBuf::from("/srv/store"));
    assert_eq!(config.retrieval.top_k, 3);
    assert!(config.ingest.refresh_changed);
    assert_eq!(config.ingest.max_file_size, 1024);
}

#[test]
#[serial]
fn env_chunk_settings() {
    clear_env();
    unsafe {
        std::env::set_var("PDFRAG_CHUNK_SIZE", "200");
        std::env::set_var("PDFRAG_CHUNK_OVERLAP", "20");
    }

    let mut config = Config::default();
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.splitter.chunk_size, 200);
    assert_eq!(config.splitter.chunk_overlap, 20);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("PDFRAG_CHUNK_SIZE", "big");
        std::env::set_var("PDFRAG_CHUNK_OVERLAP", "1.5");
        std::env::set_var("PDFRAG_TOP_K", "-1");
        std::env::set_var("PDFRAG_REFRESH_CHANGED", "yes please");
        std::env::set_var("PDFRAG_MAX_FILE_SIZE", "50MiB");
    }

    let mut config = Config::default();
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.splitter.chunk_size, 800);
    assert_eq!(config.splitter.chunk_overlap, 80);
    assert_eq!(config.retrieval.top_k, 5);
    assert!(!config.ingest.refresh_changed);
    assert_eq!(
        config.ingest.max_file_size,
        pdfrag_memory::document::DEFAULT_MAX_FILE_SIZE
    );
}

#[test]
#[serial]
fn parse_env_treats_every_type_alike() {
    clear_env();
    assert_eq!(super::env::parse_env::<usize>("PDFRAG_TOP_K"), None);

    unsafe {
        std::env::set_var("PDFRAG_TOP_K", "many");
        std::env::set_var("PDFRAG_REFRESH_CHANGED", "true");
        std::env::set_var("PDFRAG_MAX_FILE_SIZE", "1024");
    }
    let top_k = super::env::parse_env::<usize>("PDFRAG_TOP_K");
    let refresh = super::env::parse_env::<bool>("PDFRAG_REFRESH_CHANGED");
    let max_size = super::env::parse_env::<u64>("PDFRAG_MAX_FILE_SIZE");
    clear_env();

    assert_eq!(top_k, None);
    assert_eq!(refresh, Some(true));
    assert_eq!(max_size, Some(1024));
}

#[test]
fn validate_rejects_zero_chunk_size() {
    let mut config = Config::default();
    config.splitter.chunk_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_overlap_not_below_chunk_size() {
    let mut config = Config::default();
    config.splitter.chunk_size = 100;
    config.splitter.chunk_overlap = 100;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));
}

#[test]
fn validate_rejects_zero_top_k() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn load_fails_validation() {
    clear_env();
    let file = write_config("[retrieval]\ntop_k = 0\n");
    assert!(Config::load(file.path()).is_err());
}

#[test]
fn serialize_round_trips_through_toml() {
    let config = Config::default();
    let text = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed.llm.model, config.llm.model);
    assert_eq!(parsed.splitter, config.splitter);
    assert_eq!(parsed.eval.cases, config.eval.cases);
}
