use crate::config::types::{
    Config, CrawlerConfig, HeadingsConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_crawler_config(&config.crawler)?;
    validate_headings_config(&config.headings)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target site
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "base_url must use HTTP or HTTPS, got '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' has no host",
            config.base_url
        )));
    }

    if !config.category_path.starts_with('/') || config.category_path.starts_with("//") {
        return Err(ConfigError::Validation(format!(
            "category_path must be root-relative, got '{}'",
            config.category_path
        )));
    }

    if config.license.trim().is_empty() {
        return Err(ConfigError::Validation(
            "license cannot be empty".to_string(),
        ));
    }

    if let Some(path) = config
        .api_paths
        .iter()
        .find(|path| !path.starts_with('/') || path.starts_with("//"))
    {
        return Err(ConfigError::Validation(format!(
            "api_paths entries must be root-relative, got '{}'",
            path
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates crawler pacing settings
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.policy_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "policy_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.overall_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "overall_timeout_secs must be >= 1 when set".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    Ok(())
}

/// Validates extra heading synonyms
fn validate_headings_config(config: &HeadingsConfig) -> Result<(), ConfigError> {
    for (heading, key) in &config.synonyms {
        if heading.trim().is_empty() {
            return Err(ConfigError::Validation(
                "heading synonym cannot be empty".to_string(),
            ));
        }

        let well_formed = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !well_formed {
            return Err(ConfigError::Validation(format!(
                "canonical key for '{}' must be snake_case ASCII, got '{}'",
                heading, key
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.json_path.is_empty() {
        return Err(ConfigError::Validation(
            "json_path cannot be empty".to_string(),
        ));
    }

    if matches!(config.database_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "database_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config::for_site("https://www.wikifood.cz")
    }

    #[test]
    fn test_default_site_config_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_http_base_url_is_allowed() {
        let config = Config::for_site("http://127.0.0.1:8080");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_unparseable_base_url() {
        let config = Config::for_site("not a url");
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_non_http_scheme() {
        let config = Config::for_site("ftp://www.wikifood.cz");
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_category_path_must_be_root_relative() {
        let mut config = valid_config();
        config.site.category_path = "Kategorie:Bylinky".to_string();
        assert!(validate(&config).is_err());

        config.site.category_path = "//other.host/Kategorie:Bylinky".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_api_paths_must_be_root_relative() {
        let mut config = valid_config();
        config.site.api_paths = vec!["/w/api.php".to_string(), "api.php".to_string()];
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));

        config.site.api_paths.clear();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_crawler_name_with_spaces() {
        let mut config = valid_config();
        config.user_agent.crawler_name = "herbar scraper".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_contact_url() {
        let mut config = valid_config();
        config.user_agent.contact_url = "example".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_zero_request_timeout() {
        let mut config = valid_config();
        config.crawler.request_timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_overall_timeout() {
        let mut config = valid_config();
        config.crawler.overall_timeout_secs = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_synonym_key_must_be_snake_case() {
        let mut config = valid_config();
        config
            .headings
            .synonyms
            .insert("Sušení".to_string(), "Suseni".to_string());
        assert!(validate(&config).is_err());

        config.headings.synonyms.clear();
        config
            .headings
            .synonyms
            .insert("Sušení".to_string(), "suseni".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_database_path() {
        let mut config = valid_config();
        config.output.database_path = Some(String::new());
        assert!(validate(&config).is_err());
    }
}
