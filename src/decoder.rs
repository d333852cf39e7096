//! Incremental CSV decoding into named-field records.
//!
//! The header row defines the field names. Records are pulled one at a time
//! from the underlying stream, so input size never bounds memory use.

use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord};
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

use crate::error::{PipelineError, PipelineResult};

/// One decoded row, addressable by header name
#[derive(Debug, Clone)]
pub struct Record {
    headers: Arc<StringRecord>,
    values: StringRecord,
    line: u64,
}

impl Record {
    /// Build a record from explicit headers and values.
    pub fn new(headers: Arc<StringRecord>, values: StringRecord, line: u64) -> Self {
        Self {
            headers,
            values,
            line,
        }
    }

    /// Source line the record started on (1-based, header is line 1)
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == field)
            .and_then(|idx| self.values.get(idx))
    }

    /// Like `get`, but a column missing from the header is a decode error.
    pub fn require(&self, field: &str) -> PipelineResult<&str> {
        self.get(field).ok_or_else(|| {
            PipelineError::decode(Some(self.line), format!("missing column '{}'", field))
        })
    }
}

/// Decoder options
#[derive(Debug, Clone, Copy)]
pub struct DecoderOptions {
    pub delimiter: u8,
    pub buffer_capacity: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            buffer_capacity: 64 * 1024,
        }
    }
}

/// Counts `"` bytes passing through to the parser.
///
/// Well-formed input always carries an even number of quote bytes (an
/// escaped quote is two), so an odd count at end of input means a quoted
/// field was never closed.
struct QuoteCounter<R> {
    inner: R,
    quotes: Arc<AtomicU64>,
}

impl<R> AsyncRead for QuoteCounter<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let read = buf.filled()[before..].iter().filter(|&&b| b == b'"').count();
            self.quotes.fetch_add(read as u64, Ordering::Relaxed);
        }
        poll
    }
}

/// Forward-only record stream over an async byte source
pub struct RecordDecoder<R> {
    reader: AsyncReader<QuoteCounter<R>>,
    quotes: Arc<AtomicU64>,
    headers: Option<Arc<StringRecord>>,
    buffer: StringRecord,
    last_line: Option<u64>,
}

impl<R> RecordDecoder<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(input: R, options: DecoderOptions) -> Self {
        let quotes = Arc::new(AtomicU64::new(0));
        let input = QuoteCounter {
            inner: input,
            quotes: Arc::clone(&quotes),
        };
        let reader = AsyncReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .delimiter(options.delimiter)
            .buffer_capacity(options.buffer_capacity)
            .create_reader(input);

        Self {
            reader,
            quotes,
            headers: None,
            buffer: StringRecord::new(),
            last_line: None,
        }
    }

    /// Header row, read on first use
    pub async fn headers(&mut self) -> PipelineResult<Arc<StringRecord>> {
        if let Some(headers) = &self.headers {
            return Ok(Arc::clone(headers));
        }

        let headers = Arc::new(self.reader.headers().await?.clone());
        self.headers = Some(Arc::clone(&headers));
        Ok(headers)
    }

    /// Pull the next record, or `None` once the input is exhausted.
    ///
    /// Rows whose column count differs from the header fail the decode, as
    /// does a quoted field still open at end of input.
    pub async fn next_record(&mut self) -> PipelineResult<Option<Record>> {
        let headers = self.headers().await?;

        if !self.reader.read_record(&mut self.buffer).await? {
            if self.quotes.load(Ordering::Relaxed) % 2 != 0 {
                return Err(PipelineError::decode(
                    self.last_line,
                    "unterminated quoted field at end of input",
                ));
            }
            return Ok(None);
        }

        let line = self.buffer.position().map(|pos| pos.line()).unwrap_or_default();
        self.last_line = Some(line);
        Ok(Some(Record::new(headers, self.buffer.clone(), line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn decode_all(input: &'static str) -> PipelineResult<Vec<Record>> {
        decode_bytes(input.as_bytes()).await
    }

    async fn decode_bytes(input: &'static [u8]) -> PipelineResult<Vec<Record>> {
        let mut decoder = RecordDecoder::new(input, DecoderOptions::default());
        let mut records = Vec::new();
        while let Some(record) = decoder.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }

    #[tokio::test]
    async fn test_decodes_named_fields_in_order() {
        let records = decode_all("estado,uf\nSão Paulo,SP\n\"Rio de Janeiro\",RJ\n")
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("estado"), Some("São Paulo"));
        assert_eq!(records[0].get("uf"), Some("SP"));
        assert_eq!(records[1].get("estado"), Some("Rio de Janeiro"));
        assert_eq!(records[1].line(), 3);
    }

    #[tokio::test]
    async fn test_quoted_field_with_delimiter_and_newline() {
        let records = decode_all("nome,descricao\nA,\"uma, duas\ntrês\"\n").await.unwrap();

        assert_eq!(records[0].get("descricao"), Some("uma, duas\ntrês"));
    }

    #[tokio::test]
    async fn test_column_count_mismatch_is_decode_error() {
        let err = decode_all("nome,descricao\nA,B\nC\n").await.unwrap_err();

        assert!(matches!(err, PipelineError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_header_only_input_yields_nothing() {
        let records = decode_all("nome,descricao\n").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_require_missing_column() {
        let records = decode_all("nome\nA\n").await.unwrap();

        let err = records[0].require("descricao").unwrap_err();
        assert_eq!(err.to_string(), "Decode error at line 2: missing column 'descricao'");
        assert_eq!(records[0].require("nome").unwrap(), "A");
    }

    #[tokio::test]
    async fn test_custom_delimiter() {
        let options = DecoderOptions {
            delimiter: b';',
            ..DecoderOptions::default()
        };
        let mut decoder = RecordDecoder::new("id;nome\n1;Moda\n".as_bytes(), options);

        let record = decoder.next_record().await.unwrap().unwrap();
        assert_eq!(record.get("id"), Some("1"));
        assert_eq!(record.get("nome"), Some("Moda"));
        assert!(decoder.next_record().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unterminated_quote_in_last_column_is_decode_error() {
        let mut decoder = RecordDecoder::new(
            "nome,descricao\nModa,\"Roupas\nEsportes,Bolas\n".as_bytes(),
            DecoderOptions::default(),
        );

        // The open quote swallows the rest of the input into one record
        assert!(decoder.next_record().await.unwrap().is_some());
        let err = decoder.next_record().await.unwrap_err();
        match err {
            PipelineError::Decode { line, message } => {
                assert_eq!(line, Some(2));
                assert!(message.contains("unterminated"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_escaped_quotes_are_balanced() {
        let records = decode_all("nome,descricao\nA,\"diz \"\"oi\"\"\"\n").await.unwrap();

        assert_eq!(records[0].get("descricao"), Some("diz \"oi\""));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_decode_error() {
        let err = decode_bytes(b"nome,descricao\nA,\xff\n").await.unwrap_err();

        assert!(matches!(err, PipelineError::Decode { .. }));
    }
}
