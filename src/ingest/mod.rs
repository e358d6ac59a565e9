/*!
 * Lesson ingestion pipeline.
 *
 * Stages, in order:
 * - `normalizer`: uploads to ordered source units
 * - `segmenter`: source units to sentence spans, with interpolated timing
 * - `tokenizer`: forward maximum matching against the dictionary
 * - `resolver`: lemma checks and missing-character collection
 * - `translation`: concurrent, failure-isolated machine translation
 * - `assembler`: lesson aggregate and statistics
 * - `pipeline`: request validation and the `Ingestor` entry points
 */

pub mod assembler;
pub mod normalizer;
pub mod pipeline;
pub mod resolver;
pub mod segmenter;
pub mod tokenizer;
pub mod translation;

pub use pipeline::{IngestOptions, Ingestor, SrtIngestRequest, TextIngestRequest};
pub use segmenter::{Segmenter, SegmenterConfig};
pub use tokenizer::Tokenizer;
pub use translation::{RetryPolicy, TranslationOptions, TranslationOutcome};
