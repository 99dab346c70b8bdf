use std::path::Path;

use rand::seq::SliceRandom;

use crate::create_rotate_error;
use crate::rotate_error::RotateError;
use crate::utils::{file_reader, open_file};

/// Loads the camouflage domain pool, a plain YAML list of hostnames.
pub fn load_domains(path: &Path) -> Result<Vec<String>, RotateError> {
    let file = open_file(path).map_err(|err| create_rotate_error!("{err}"))?;
    let domains: Vec<String> = serde_yaml::from_reader(file_reader(file))
        .map_err(|err| create_rotate_error!("cant read domains file {}: {err}", path.display()))?;
    Ok(domains
        .into_iter()
        .map(|domain| domain.trim().to_string())
        .filter(|domain| !domain.is_empty())
        .collect())
}

pub fn root_domain(domain: &str) -> &str {
    domain.strip_prefix("www.").unwrap_or(domain)
}

/// Candidate list for the next rotation: the active domain is excluded so a
/// rotation always changes the SNI; when the pool holds nothing else the
/// whole pool is used again. The result is shuffled.
pub fn candidates(pool: &[String], current_root: Option<&str>) -> Vec<String> {
    let mut available: Vec<String> = pool
        .iter()
        .filter(|domain| current_root.is_none_or(|current| root_domain(domain) != current))
        .cloned()
        .collect();
    if available.is_empty() {
        available = pool.to_vec();
    }
    available.shuffle(&mut rand::rng());
    available
}

/// SNI list for the selected domain. A `www.` alias is only added for bare
/// root domains, subdomains like `dl.example.com` stay as they are.
pub fn build_server_names(domain: &str) -> Vec<String> {
    let mut names = vec![domain.to_string()];
    if domain.matches('.').count() == 1 {
        names.push(format!("www.{domain}"));
    }
    names
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{build_server_names, candidates, load_domains, root_domain};

    fn pool(entries: &[&str]) -> Vec<String> {
        entries.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_load_domains() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "- cdn.example.com\n- \"  fast.example.org \"\n- \"\"").unwrap();
        let domains = load_domains(file.path()).unwrap();
        assert_eq!(domains, pool(&["cdn.example.com", "fast.example.org"]));
    }

    #[test]
    fn test_load_domains_missing_file() {
        assert!(load_domains(std::path::Path::new("/nonexistent/rotation_domains.yml")).is_err());
    }

    #[test]
    fn test_root_domain() {
        assert_eq!(root_domain("www.example.com"), "example.com");
        assert_eq!(root_domain("dl.example.com"), "dl.example.com");
        assert_eq!(root_domain("example.com"), "example.com");
    }

    #[test]
    fn test_current_domain_is_excluded() {
        let pool = pool(&["one.example", "www.two.example", "three.example"]);
        let selected = candidates(&pool, Some("two.example"));
        assert_eq!(selected.len(), 2);
        assert!(!selected.iter().any(|d| root_domain(d) == "two.example"));
    }

    #[test]
    fn test_fallback_to_full_pool() {
        let pool = pool(&["only.example"]);
        let selected = candidates(&pool, Some("only.example"));
        assert_eq!(selected, pool);
    }

    #[test]
    fn test_no_current_domain_keeps_pool() {
        let pool = pool(&["one.example", "two.example"]);
        assert_eq!(candidates(&pool, None).len(), 2);
    }

    #[test]
    fn test_server_names_for_root_domain() {
        assert_eq!(build_server_names("example.com"), pool(&["example.com", "www.example.com"]));
    }

    #[test]
    fn test_server_names_for_subdomain() {
        assert_eq!(build_server_names("dl.google.com"), pool(&["dl.google.com"]));
    }
}
