/*!
 * Common test utilities for the zhlesson test suite
 */

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use uuid::Uuid;

use zhlesson::database::{LessonStore, Repository};
use zhlesson::dictionary::{CedictOptions, InMemoryDictionary, cedict};
use zhlesson::ingest::Ingestor;
use zhlesson::lesson::{Lesson, LessonSummary};
use zhlesson::providers::mock::MockTranslator;

/// Small CC-CEDICT extract covering the sample texts
pub const SAMPLE_CEDICT: &str = "\
# CC-CEDICT sample
你好 你好 [ni3 hao3] /hello/hi/
今天 今天 [jin1 tian1] /today/
天 天 [tian1] /day/sky/
怎麼 怎么 [zen3 me5] /how?/what?/
怎麼樣 怎么样 [zen3 me5 yang4] /how?/how about?/
好 好 [hao3] /good/well/
我們 我们 [wo3 men5] /we/us/
學習 学习 [xue2 xi2] /to learn/to study/
中文 中文 [Zhong1 wen2] /Chinese language/
再見 再见 [zai4 jian4] /goodbye/
";

/// Two cues, the second with two sentences
pub const SAMPLE_SRT: &str = "1
00:00:01,000 --> 00:00:03,000
你好！

2
00:00:04,000 --> 00:00:08,000
我们学习中文。今天好。
";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Dictionary snapshot built from `SAMPLE_CEDICT`
pub fn sample_dictionary() -> InMemoryDictionary {
    let entries = cedict::parse_str(SAMPLE_CEDICT, &CedictOptions::default()).expect("sample CEDICT parses");
    InMemoryDictionary::from_cedict(entries)
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Ingestor over the sample dictionary and an in-memory repository
pub fn ingestor_with(translator: Option<MockTranslator>) -> (Ingestor, Repository) {
    init_logging();
    let repository = Repository::new_in_memory().expect("in-memory database");
    let mut ingestor = Ingestor::new(Arc::new(sample_dictionary()), Arc::new(repository.clone()));
    if let Some(translator) = translator {
        ingestor = ingestor.with_translator(Arc::new(translator));
    }
    (ingestor, repository)
}

/// Store that rejects every save and counts the attempts
#[derive(Debug, Default)]
pub struct FailingStore {
    pub save_attempts: AtomicUsize,
}

impl FailingStore {
    pub fn attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LessonStore for FailingStore {
    async fn save_lesson(&self, _lesson: &Lesson) -> Result<Uuid> {
        self.save_attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("disk full"))
    }

    async fn get_lesson(&self, _id: Uuid) -> Result<Option<Lesson>> {
        Ok(None)
    }

    async fn list_lessons(&self) -> Result<Vec<LessonSummary>> {
        Ok(Vec::new())
    }

    async fn delete_lesson(&self, _id: Uuid) -> Result<bool> {
        Ok(false)
    }
}
