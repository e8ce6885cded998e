use super::*;
use std::sync::Mutex;

/// `from_env` reads shared variable names, so these tests serialize on a lock.
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// # Safety
/// Callers must hold `ENV_LOCK`.
unsafe fn clear_llm_env() {
    unsafe {
        std::env::remove_var("LLM_API_KEY_ENV");
        std::env::remove_var("LLM_MODEL");
        std::env::remove_var("LLM_BASE_URL");
        std::env::remove_var("LLM_TEMPERATURE");
        std::env::remove_var("LLM_MAX_TOKENS");
        std::env::remove_var("LLM_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("LLM_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("GROQ_API_KEY");
        std::env::remove_var("__TEST_FINBOT_KEY__");
    }
}

#[test]
fn from_env_defaults_to_groq() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_llm_env();
        std::env::set_var("GROQ_API_KEY", "gsk-secret");
    }

    let cfg = LlmConfig::from_env().unwrap();
    assert_eq!(cfg.api_key, "gsk-secret");
    assert_eq!(cfg.model, DEFAULT_MODEL);
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert_eq!(cfg.params, GenerationParams { temperature: DEFAULT_TEMPERATURE, max_tokens: DEFAULT_MAX_TOKENS });
    assert_eq!(
        cfg.timeouts,
        LlmTimeouts { request_secs: DEFAULT_LLM_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_LLM_CONNECT_TIMEOUT_SECS }
    );

    unsafe { clear_llm_env() };
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_llm_env();
        std::env::set_var("LLM_API_KEY_ENV", "__TEST_FINBOT_KEY__");
        std::env::set_var("__TEST_FINBOT_KEY__", "sk-test");
        std::env::set_var("LLM_MODEL", "llama3-70b-8192");
        std::env::set_var("LLM_BASE_URL", "https://example.test/v1/");
        std::env::set_var("LLM_TEMPERATURE", "0.2");
        std::env::set_var("LLM_MAX_TOKENS", "256");
        std::env::set_var("LLM_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("LLM_CONNECT_TIMEOUT_SECS", "7");
    }

    let cfg = LlmConfig::from_env().unwrap();
    assert_eq!(cfg.api_key, "sk-test");
    assert_eq!(cfg.model, "llama3-70b-8192");
    assert_eq!(cfg.base_url, "https://example.test/v1");
    assert!((cfg.params.temperature - 0.2).abs() < f32::EPSILON);
    assert_eq!(cfg.params.max_tokens, 256);
    assert_eq!(cfg.timeouts, LlmTimeouts { request_secs: 42, connect_secs: 7 });

    unsafe { clear_llm_env() };
}

#[test]
fn from_env_missing_key_errors() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe { clear_llm_env() };

    let err = LlmConfig::from_env().unwrap_err();
    assert!(matches!(err, LlmError::MissingApiKey { ref var } if var == "GROQ_API_KEY"));
}

#[test]
fn from_env_blank_key_counts_as_missing() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_llm_env();
        std::env::set_var("GROQ_API_KEY", "   ");
    }

    assert!(matches!(LlmConfig::from_env(), Err(LlmError::MissingApiKey { .. })));

    unsafe { clear_llm_env() };
}

#[test]
fn from_env_out_of_range_temperature_errors() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_llm_env();
        std::env::set_var("GROQ_API_KEY", "gsk-secret");
        std::env::set_var("LLM_TEMPERATURE", "3.5");
    }

    let err = LlmConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("out of range"));

    unsafe { clear_llm_env() };
}

#[test]
fn from_env_invalid_max_tokens_falls_back_to_default() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    unsafe {
        clear_llm_env();
        std::env::set_var("GROQ_API_KEY", "gsk-secret");
        std::env::set_var("LLM_MAX_TOKENS", "lots");
    }

    let cfg = LlmConfig::from_env().unwrap();
    assert_eq!(cfg.params.max_tokens, DEFAULT_MAX_TOKENS);

    unsafe { clear_llm_env() };
}

#[test]
fn parse_temperature_rejects_garbage() {
    let err = parse_temperature(Some("warm")).unwrap_err().to_string();
    assert!(err.contains("invalid LLM_TEMPERATURE"));
}
