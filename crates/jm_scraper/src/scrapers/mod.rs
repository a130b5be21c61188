pub mod juejin;

pub use juejin::JuejinScraper;

/// Common utilities for scrapers
pub(crate) mod utils {
    use jm_core::{Error, Result};
    use url::Url;

    /// Only absolute http(s) URLs are worth handing to a browser.
    pub fn parse_url(url: &str) -> Result<Url> {
        let parsed = Url::parse(url.trim())?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(Error::InvalidUrl(format!("unsupported scheme {:?} in {}", other, url))),
        }
    }

    pub fn host_matches(url: &Url, domain: &str) -> bool {
        url.host_str()
            .map(|host| host == domain || host.ends_with(&format!(".{}", domain)))
            .unwrap_or(false)
    }

}
