#[cfg(test)]
mod tests {
    use super::super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.paths.live_snapshot, PathBuf::from("out/output.json"));
        assert_eq!(config.paths.cache_dir, PathBuf::from("out/cache"));
        assert_eq!(config.llm.backend, "gemini");
        assert_eq!(config.qa.questions.len(), 4);
        assert_eq!(config.server.bind_addr(), "127.0.0.1:5000");
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            port = 8080

            [llm]
            backend = "ollama"
            model = "llama3:8b"

            [qa]
            questions = ["Why?", "How?"]
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.qa.questions, vec!["Why?".to_string(), "How?".to_string()]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Config::from_toml_str("[llm]\ntimeout_secs = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_toml_str("[qa]\nquestions = [\"ok\", \" \"]"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(Config::from_toml_str("[server]\nport = \"x\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_path(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paperfeed.toml");
        std::fs::write(&path, "[paths]\ncache_dir = \"/srv/cache\"\n").unwrap();
        let config = Config::from_path(&path).unwrap();
        assert_eq!(config.paths.cache_dir, PathBuf::from("/srv/cache"));
    }

    #[test]
    fn test_api_key_resolution_order() {
        let env: HashMap<&str, &str> = [
            ("PAPERFEED_GEMINI_API_KEY", "from-paperfeed-env"),
            ("GEMINI_API_KEY", "from-provider-env"),
        ]
        .into_iter()
        .collect();
        let lookup = |name: &str| env.get(name).map(|v| v.to_string());

        let mut llm = LlmConfig { api_key: Some("from-file".to_string()), ..LlmConfig::default() };
        assert_eq!(llm.resolve_api_key_with(lookup).as_deref(), Some("from-file"));

        llm.api_key = Some("".to_string());
        assert_eq!(llm.resolve_api_key_with(lookup).as_deref(), Some("from-paperfeed-env"));

        let only_provider = |name: &str| (name == "GEMINI_API_KEY").then(|| "from-provider-env".to_string());
        assert_eq!(llm.resolve_api_key_with(only_provider).as_deref(), Some("from-provider-env"));

        llm.backend = "ollama".to_string();
        assert_eq!(llm.resolve_api_key_with(|_| None), None);
    }
}
