use crate::error::{StageError, StageKind};

use super::{Records, StageResult, Transformation};

/// Filter stage: keeps the records for which `predicate(&key, &value)` is true.
pub struct Filter<F> {
    predicate: F,
}

impl<F> Filter<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<K, V, F> Transformation<K, V> for Filter<F>
where
    K: Send + 'static,
    V: Send + 'static,
    F: FnMut(&K, &V) -> anyhow::Result<bool> + Send,
{
    type Key = K;
    type Value = V;

    fn apply<'a>(&'a mut self, input: Records<'a, K, V>) -> Records<'a, K, V> {
        Box::new(FilterIter {
            input,
            predicate: &mut self.predicate,
            done: false,
        })
    }
}

struct FilterIter<'a, I, F> {
    input: I,
    predicate: &'a mut F,
    done: bool,
}

impl<I, F, K, V> Iterator for FilterIter<'_, I, F>
where
    I: Iterator<Item = StageResult<(K, V)>>,
    F: FnMut(&K, &V) -> anyhow::Result<bool>,
{
    type Item = StageResult<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.input.next()? {
                Ok((key, value)) => match (self.predicate)(&key, &value) {
                    Ok(true) => return Some(Ok((key, value))),
                    Ok(false) => {}
                    Err(source) => {
                        self.done = true;
                        return Some(Err(StageError::report(StageKind::Filter, source)));
                    }
                },
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}
