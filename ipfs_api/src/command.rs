use bytes::Bytes;
use futures::Stream;
use std::fmt;
use std::path::Path;
use tokio_util::io::ReaderStream;

/// Multipart field name the daemon reads uploads from.
pub const DEFAULT_FIELD_NAME: &str = "file";

pub type ByteStream =
    Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + Unpin + 'static>;

/// A file name paired with a byte stream, uploaded as the single part of a
/// multipart body. The stream is consumed once and never buffered whole.
pub struct NamedStream {
    pub file_name: String,
    pub(crate) stream: ByteStream,
    pub(crate) length: Option<u64>,
}

impl fmt::Debug for NamedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedStream")
            .field("file_name", &self.file_name)
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

impl NamedStream {
    pub fn new<S>(file_name: impl Into<String>, stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + Unpin + 'static,
    {
        Self {
            file_name: file_name.into(),
            stream: Box::new(stream),
            length: None,
        }
    }

    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        let length = bytes.len() as u64;
        let mut named = Self::new(file_name, futures::stream::iter([Ok(bytes)]));
        named.length = Some(length);
        named
    }

    /// Opens a local file for streaming upload, named after its final path
    /// component.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_owned());
        let mut named = Self::new(file_name, ReaderStream::new(file));
        named.length = Some(length);
        Ok(named)
    }

    /// Declared payload length, when known up front.
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    pub(crate) fn into_part(self) -> reqwest::Result<reqwest::multipart::Part> {
        let body = reqwest::Body::wrap_stream(self.stream);
        let part = match self.length {
            Some(length) => reqwest::multipart::Part::stream_with_length(body, length),
            None => reqwest::multipart::Part::stream(body),
        };
        part.file_name(self.file_name)
            .mime_str("application/octet-stream")
    }
}

/// One logical call against the daemon, built fresh per call.
///
/// ```
/// use ipfs_api::CommandRequest;
///
/// let request = CommandRequest::new("add")
///     .arg("MyFilePath.txt")
///     .switch("recursive", true)
///     .switch("quiet", false)
///     .opt_flag("chunker", None::<&str>);
/// assert_eq!(request.arg_values(), ["MyFilePath.txt"]);
/// assert_eq!(request.flags().count(), 1);
/// ```
#[derive(Debug)]
pub struct CommandRequest {
    method: String,
    args: Vec<String>,
    flags: Vec<(String, Option<String>)>,
    upload: Option<NamedStream>,
    field_name: String,
}

impl CommandRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Vec::new(),
            flags: Vec::new(),
            upload: None,
            field_name: DEFAULT_FIELD_NAME.to_owned(),
        }
    }

    /// Adds one positional `arg=` parameter.
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn args<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    /// Sets a named flag. Setting the same name twice keeps the first
    /// position and the last value.
    pub fn flag(self, name: impl Into<String>, value: impl ToString) -> Self {
        self.opt_flag(name, Some(value))
    }

    /// Sets a flag that is only emitted when `value` is `Some`.
    pub fn opt_flag<V: ToString>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        let name = name.into();
        let value = value.map(|v| v.to_string());
        match self.flags.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.flags.push((name, value)),
        }
        self
    }

    /// Boolean option: `name=true` when set, nothing otherwise.
    pub fn switch(self, name: impl Into<String>, enabled: bool) -> Self {
        self.opt_flag(name, enabled.then_some("true"))
    }

    /// Attaches an upload payload; the request is then sent as a multipart
    /// POST instead of a GET.
    pub fn upload(mut self, payload: NamedStream) -> Self {
        self.upload = Some(payload);
        self
    }

    pub fn field_name(mut self, field_name: impl Into<String>) -> Self {
        self.field_name = field_name.into();
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn arg_values(&self) -> &[String] {
        &self.args
    }

    /// Flags that will be emitted, in insertion order.
    pub fn flags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.flags
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|value| (name.as_str(), value)))
    }

    pub fn has_upload(&self) -> bool {
        self.upload.is_some()
    }

    pub(crate) fn raw_flags(&self) -> &[(String, Option<String>)] {
        &self.flags
    }

    pub(crate) fn take_upload(&mut self) -> Option<(String, NamedStream)> {
        self.upload
            .take()
            .map(|payload| (self.field_name.clone(), payload))
    }
}
