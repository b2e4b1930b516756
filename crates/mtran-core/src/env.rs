/// Gets an environment variable or returns `default` when unset or empty.
pub fn get_env(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value,
        _ => default.to_string(),
    }
}

/// Parses a boolean environment variable, defaulting on unset/unparsable values.
pub fn get_bool_env(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => value.trim().eq_ignore_ascii_case("true")
            || value.trim() == "1"
            || value.trim().eq_ignore_ascii_case("yes"),
        _ => default,
    }
}

/// Resolves an HTTP(S) proxy URL the way the fetcher's downstream HTTP client does:
/// `HTTP_PROXY`/`http_proxy` for plain-HTTP targets, `HTTPS_PROXY`/`https_proxy` for HTTPS ones.
pub fn proxy_for_scheme(is_https: bool) -> Option<String> {
    let (upper, lower) = if is_https {
        ("HTTPS_PROXY", "https_proxy")
    } else {
        ("HTTP_PROXY", "http_proxy")
    };
    std::env::var(upper)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var(lower).ok().filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn get_env_falls_back_to_default() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var("MTRAN_CORE_TEST_VAR");
        assert_eq!(get_env("MTRAN_CORE_TEST_VAR", "fallback"), "fallback");
        std::env::set_var("MTRAN_CORE_TEST_VAR", "set");
        assert_eq!(get_env("MTRAN_CORE_TEST_VAR", "fallback"), "set");
        std::env::remove_var("MTRAN_CORE_TEST_VAR");
    }

    #[test]
    fn get_bool_env_parses_common_truthy_forms() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("MTRAN_CORE_TEST_BOOL", "TRUE");
        assert!(get_bool_env("MTRAN_CORE_TEST_BOOL", false));
        std::env::set_var("MTRAN_CORE_TEST_BOOL", "0");
        assert!(!get_bool_env("MTRAN_CORE_TEST_BOOL", true));
        std::env::remove_var("MTRAN_CORE_TEST_BOOL");
    }
}
