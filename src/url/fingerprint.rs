use crate::UrlError;
use url::Url;

/// Canonical form of a request URL used for duplicate filtering
///
/// Two URLs with the same fingerprint are fetched only once per crawl.
///
/// # Canonicalization
///
/// 1. Parse; only HTTP(S) is accepted
/// 2. Scheme and host are lowercased (done by the parser)
/// 3. Default ports are dropped (done by the parser)
/// 4. The fragment is removed
/// 5. Query parameters are sorted by key, then value; an empty query is dropped
///
/// The path is kept byte for byte: catalog paths are case-sensitive and
/// trailing slashes are significant.
///
/// # Examples
///
/// ```
/// use books_crawler::url::request_fingerprint;
///
/// let a = request_fingerprint("https://Books.toscrape.com/page?b=2&a=1#top").unwrap();
/// let b = request_fingerprint("https://books.toscrape.com/page?a=1&b=2").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn request_fingerprint(url_str: &str) -> Result<String, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    fingerprint_url(&url)
}

/// Same as [`request_fingerprint`] for an already-parsed URL
pub fn fingerprint_url(url: &Url) -> Result<String, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    let mut canonical = url.clone();
    canonical.set_fragment(None);

    if canonical.query().is_some() {
        let mut params: Vec<(String, String)> = canonical
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            canonical.set_query(None);
        } else {
            canonical
                .query_pairs_mut()
                .clear()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    Ok(canonical.into())
}
