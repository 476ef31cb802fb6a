use std::fmt;

use crate::error::{StageError, StageKind};

use super::{Records, StageResult, Transformation};

/// What a map function produced for one input record.
pub enum MapOutput<K, V> {
    /// Exactly one output record.
    Single((K, V)),
    /// Zero or more output records, flattened in their own order. An `Err`
    /// item fails the map stage at that point of the expansion.
    Many(Box<dyn Iterator<Item = anyhow::Result<(K, V)>>>),
}

impl<K, V> MapOutput<K, V> {
    pub fn single(key: K, value: V) -> Self {
        MapOutput::Single((key, value))
    }

    pub fn many<I>(pairs: I) -> Self
    where
        K: 'static,
        V: 'static,
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: 'static,
    {
        MapOutput::Many(Box::new(pairs.into_iter().map(Ok)))
    }

    /// Lazily produced records where producing any one of them may fail.
    pub fn try_many<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = anyhow::Result<(K, V)>>,
        I::IntoIter: 'static,
    {
        MapOutput::Many(Box::new(pairs.into_iter()))
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for MapOutput<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapOutput::Single(pair) => f.debug_tuple("Single").field(pair).finish(),
            MapOutput::Many(_) => f.write_str("Many(..)"),
        }
    }
}

/// Conversion from a map function's return value into a [`MapOutput`].
///
/// Lets map closures return a plain `(key, value)` tuple, a `Vec` of tuples,
/// or a [`MapOutput`] directly.
pub trait IntoMapOutput {
    type Key;
    type Value;

    fn into_map_output(self) -> MapOutput<Self::Key, Self::Value>;
}

impl<K, V> IntoMapOutput for (K, V) {
    type Key = K;
    type Value = V;

    fn into_map_output(self) -> MapOutput<K, V> {
        MapOutput::Single(self)
    }
}

impl<K: 'static, V: 'static> IntoMapOutput for Vec<(K, V)> {
    type Key = K;
    type Value = V;

    fn into_map_output(self) -> MapOutput<K, V> {
        MapOutput::many(self)
    }
}

impl<K, V> IntoMapOutput for MapOutput<K, V> {
    type Key = K;
    type Value = V;

    fn into_map_output(self) -> MapOutput<K, V> {
        self
    }
}

/// Map stage: calls `f(key, value)` for every record.
pub struct Map<F> {
    f: F,
}

impl<F> Map<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<K, V, F, O> Transformation<K, V> for Map<F>
where
    K: 'static,
    V: 'static,
    F: FnMut(K, V) -> anyhow::Result<O> + Send,
    O: IntoMapOutput,
    O::Key: Send + 'static,
    O::Value: Send + 'static,
{
    type Key = O::Key;
    type Value = O::Value;

    fn apply<'a>(&'a mut self, input: Records<'a, K, V>) -> Records<'a, O::Key, O::Value> {
        Box::new(MapIter {
            input,
            f: &mut self.f,
            expansion: None,
            done: false,
        })
    }
}

struct MapIter<'a, I, F, K, V> {
    input: I,
    f: &'a mut F,
    /// Remaining records of a `Many` result, drained before the next input.
    expansion: Option<Box<dyn Iterator<Item = anyhow::Result<(K, V)>>>>,
    done: bool,
}

impl<I, F, InK, InV, O, K, V> Iterator for MapIter<'_, I, F, K, V>
where
    I: Iterator<Item = StageResult<(InK, InV)>>,
    F: FnMut(InK, InV) -> anyhow::Result<O>,
    O: IntoMapOutput<Key = K, Value = V>,
{
    type Item = StageResult<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(expansion) = self.expansion.as_mut() {
                match expansion.next() {
                    Some(Ok(pair)) => return Some(Ok(pair)),
                    Some(Err(source)) => {
                        self.expansion = None;
                        self.done = true;
                        return Some(Err(StageError::report(StageKind::Mapper, source)));
                    }
                    None => self.expansion = None,
                }
            }
            if self.done {
                return None;
            }

            match self.input.next()? {
                Ok((key, value)) => match (self.f)(key, value) {
                    Ok(output) => match output.into_map_output() {
                        MapOutput::Single(pair) => return Some(Ok(pair)),
                        MapOutput::Many(pairs) => self.expansion = Some(pairs),
                    },
                    Err(source) => {
                        self.done = true;
                        return Some(Err(StageError::report(StageKind::Mapper, source)));
                    }
                },
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
    }
}
