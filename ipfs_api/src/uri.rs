//! Command URI construction.
//!
//! `{base}/{method}?arg=a&arg=b&flag=v`: positional arguments first, in
//! caller order, then flags in insertion order. Flags without a value are
//! left out entirely. Values are escaped only as far as `url`'s
//! form-urlencoded serializer does it: `/ipfs/QmX` goes out as
//! `%2Fipfs%2FQmX` and a space as `+`. The daemon decodes both.

use url::Url;

/// Appends `path` to `base` as one or more path segments, normalizing
/// slashes so that repeated appends never produce `//` or lose a `/`.
pub fn append_path(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

/// Builds the full command URI for `method` under `base`.
pub fn build_uri<A, K, V>(
    base: &Url,
    method: &str,
    args: &[A],
    flags: &[(K, Option<V>)],
) -> Result<Url, url::ParseError>
where
    A: AsRef<str>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut url = append_path(base, method)?;

    let mut pairs = args
        .iter()
        .map(|arg| ("arg", arg.as_ref()))
        .chain(flags.iter().filter_map(|(name, value)| {
            value.as_ref().map(|value| (name.as_ref(), value.as_ref()))
        }))
        .peekable();

    // query_pairs_mut() would leave a bare '?' behind
    if pairs.peek().is_some() {
        url.query_pairs_mut().extend_pairs(pairs);
    }

    tracing::trace!(%url, "built command uri");
    Ok(url)
}
