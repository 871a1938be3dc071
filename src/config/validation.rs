use crate::config::types::{Config, CrawlerConfig, FetchConfig, SiteEntry, UserAgentConfig};
use crate::storage::SiteType;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_user_agent_config(&config.user_agent)?;

    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    for site in &config.sites {
        validate_site_entry(site)?;
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 16 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 16, got {}",
            config.workers
        )));
    }

    if config.days_to_crawl < 1 {
        return Err(ConfigError::Validation(format!(
            "days_to_crawl must be >= 1, got {}",
            config.days_to_crawl
        )));
    }

    if config.default_crawl_interval_minutes < 1 {
        return Err(ConfigError::Validation(format!(
            "default_crawl_interval_minutes must be >= 1, got {}",
            config.default_crawl_interval_minutes
        )));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.delay_min_secs < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay_min_secs must be >= 0, got {}",
            config.delay_min_secs
        )));
    }

    if config.delay_max_secs < config.delay_min_secs {
        return Err(ConfigError::Validation(format!(
            "delay_max_secs ({}) must be >= delay_min_secs ({})",
            config.delay_max_secs, config.delay_min_secs
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

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

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_site_entry(site: &SiteEntry) -> Result<(), ConfigError> {
    if site.name.is_empty() {
        return Err(ConfigError::Validation(
            "site name cannot be empty".to_string(),
        ));
    }

    validate_domain_string(&site.domain)?;

    let sitemap = Url::parse(&site.sitemap_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid sitemap URL '{}': {}", site.sitemap_url, e))
    })?;
    if sitemap.scheme() != "http" && sitemap.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Sitemap URL '{}' must use HTTP(S)",
            site.sitemap_url
        )));
    }

    if let Some(interval) = site.crawl_interval_minutes {
        if interval < 1 {
            return Err(ConfigError::Validation(format!(
                "crawl_interval_minutes for '{}' must be >= 1",
                site.name
            )));
        }
    }

    // sport_focus is meaningful exactly when the site covers a single sport
    match site.site_type {
        SiteType::Specific => {
            if site.sport_focus.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Site '{}' is type 'specific' but has no sport-focus",
                    site.name
                )));
            }
        }
        SiteType::General => {
            if site.sport_focus.is_some() {
                return Err(ConfigError::Validation(format!(
                    "Site '{}' is type 'general' and must not set sport-focus",
                    site.name
                )));
            }
        }
    }

    Ok(())
}

fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() || !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_site() -> SiteEntry {
        SiteEntry {
            name: "Kickoff Daily".to_string(),
            domain: "kickoff.example.com".to_string(),
            sitemap_url: "https://kickoff.example.com/sitemap.xml".to_string(),
            crawl_interval_minutes: Some(15),
            site_type: SiteType::Specific,
            sport_focus: Some("soccer".to_string()),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("admin@sub.example.com").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@domain").is_err());
    }

    #[test]
    fn test_validate_domain_string() {
        assert!(validate_domain_string("example.com").is_ok());
        assert!(validate_domain_string("sub.example.com").is_ok());
        assert!(validate_domain_string("127.0.0.1:8080").is_ok());

        assert!(validate_domain_string("").is_err());
        assert!(validate_domain_string(".example.com").is_err());
        assert!(validate_domain_string("example..com").is_err());
    }

    #[test]
    fn test_specific_site_requires_focus() {
        let mut site = base_site();
        site.sport_focus = None;
        assert!(validate_site_entry(&site).is_err());
    }

    #[test]
    fn test_general_site_rejects_focus() {
        let mut site = base_site();
        site.site_type = SiteType::General;
        assert!(validate_site_entry(&site).is_err());

        site.sport_focus = None;
        assert!(validate_site_entry(&site).is_ok());
    }

    #[test]
    fn test_bad_sitemap_url() {
        let mut site = base_site();
        site.sitemap_url = "ftp://example.com/sitemap.xml".to_string();
        assert!(validate_site_entry(&site).is_err());
    }
}
