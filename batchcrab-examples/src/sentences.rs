use batchcrab_api::batchcrab_core::adapter::Record;

/// Stream the demo source writes to and the word counter reads from.
pub const WORDS_STREAM: &str = "words";

pub const SENTENCES: [&str; 4] = [
    "This module implements a number of iterator building blocks inspired by constructs from APL, Haskell, and SML. Each has been recast in a form suitable for Python.",
    "The module standardizes a core set of fast, memory efficient tools that are useful by themselves or in combination. Together, they form an 'iterator algebra' making it possible to construct specialized tools succinctly and efficiently in pure Python.",
    "For instance, SML provides a tabulation tool: tabulate(f) which produces a sequence f(0), f(1), .... The same effect can be achieved in Python by combining imap() and count() to form imap(f, count()).",
    "These tools and their built-in counterparts also work well with the high-speed functions in the operator module. For example, the multiplication operator can be mapped across two vectors to form an efficient dot-product: sum(imap(operator.mul, vector1, vector2)).",
];

/// Samples random sentences and cuts them into one record per word.
pub struct SentenceSource {
    rng: fastrand::Rng,
    next_key: u64,
}

impl SentenceSource {
    pub fn new() -> Self {
        Self::from_rng(fastrand::Rng::new())
    }

    /// Same sequence of sentences on every run.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(fastrand::Rng::with_seed(seed))
    }

    fn from_rng(rng: fastrand::Rng) -> Self {
        Self { rng, next_key: 0 }
    }

    pub fn sample(&mut self) -> &'static str {
        SENTENCES[self.rng.usize(..SENTENCES.len())]
    }

    /// Words of `sentences` sampled sentences, keyed by a running counter.
    pub fn next_batch(&mut self, sentences: usize) -> Vec<Record<String>> {
        let mut batch = Vec::new();
        for _ in 0..sentences {
            for word in self.sample().split(' ') {
                batch.push(Record::new(self.next_key.to_string(), word.to_string()));
                self.next_key += 1;
            }
        }
        batch
    }
}

impl Default for SentenceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/sentences_tests.rs"]
mod tests;
