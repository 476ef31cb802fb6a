use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::error::{StageError, StageKind};

use super::{Records, StageResult, Transformation};

/// Reduce stage: groups a whole input sequence by key and reduces each group.
///
/// Each `apply` is a complete fold over exactly the sequence passed to it:
///
/// 1. **Accumulate**: the input is consumed eagerly (on the first pull) into
///    `key -> values`, values kept in arrival order.
/// 2. **Emit**: keys are visited in ascending order and `f(key, values)` is
///    called once per key, yielding one record per key.
///
/// The grouping is handed out of the operator before emission starts, so
/// nothing leaks into the next call, whether the caller drains the output,
/// drops it early, or hits an error.
pub struct Reduce<F, K, V> {
    f: F,
    groups: BTreeMap<K, Vec<V>>,
}

impl<F, K: Ord, V> Reduce<F, K, V> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            groups: BTreeMap::new(),
        }
    }

    /// Number of keys currently held by the operator (zero between calls).
    pub fn buffered_keys(&self) -> usize {
        self.groups.len()
    }

    /// Group `input` by key, then take the grouping out, leaving the operator empty.
    ///
    /// The first upstream error aborts accumulation and discards what was grouped.
    pub fn fold_then_reset(&mut self, input: Records<'_, K, V>) -> StageResult<BTreeMap<K, Vec<V>>> {
        for item in input {
            match item {
                Ok((key, value)) => self.groups.entry(key).or_default().push(value),
                Err(err) => {
                    self.groups.clear();
                    return Err(err);
                }
            }
        }
        Ok(self.take_groups())
    }

    fn take_groups(&mut self) -> BTreeMap<K, Vec<V>> {
        std::mem::take(&mut self.groups)
    }
}

impl<K, V, F, OutK, OutV> Transformation<K, V> for Reduce<F, K, V>
where
    K: Ord + Send + 'static,
    V: Send + 'static,
    F: FnMut(K, Vec<V>) -> anyhow::Result<(OutK, OutV)> + Send,
    OutK: Send + 'static,
    OutV: Send + 'static,
{
    type Key = OutK;
    type Value = OutV;

    fn apply<'a>(&'a mut self, input: Records<'a, K, V>) -> Records<'a, OutK, OutV> {
        Box::new(ReduceIter {
            reducer: self,
            input: Some(input),
            groups: None,
            done: false,
        })
    }
}

struct ReduceIter<'a, F, K, V> {
    reducer: &'a mut Reduce<F, K, V>,
    /// Pending input; taken and folded on the first pull.
    input: Option<Records<'a, K, V>>,
    groups: Option<btree_map::IntoIter<K, Vec<V>>>,
    done: bool,
}

impl<F, K, V, OutK, OutV> Iterator for ReduceIter<'_, F, K, V>
where
    K: Ord,
    F: FnMut(K, Vec<V>) -> anyhow::Result<(OutK, OutV)>,
{
    type Item = StageResult<(OutK, OutV)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(input) = self.input.take() {
            match self.reducer.fold_then_reset(input) {
                Ok(groups) => self.groups = Some(groups.into_iter()),
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }

        let (key, values) = self.groups.as_mut()?.next()?;
        match (self.reducer.f)(key, values) {
            Ok(pair) => Some(Ok(pair)),
            Err(source) => {
                self.done = true;
                self.groups = None;
                Some(Err(StageError::report(StageKind::Reducer, source)))
            }
        }
    }
}
