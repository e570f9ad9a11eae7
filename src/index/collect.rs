//! Consumers that receive search results one value at a time.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::hash::Hash;

/// Receives `(token, value)` pairs from a search.
///
/// Returning `false` rejects the value: it does not count towards the
/// search limit.
pub trait IndexConsumer<T> {
    fn accept(&mut self, token: &str, value: &T) -> bool;
}

impl<T, F> IndexConsumer<T> for F
where
    F: FnMut(&str, &T) -> bool,
{
    fn accept(&mut self, token: &str, value: &T) -> bool {
        self(token, value)
    }
}

/// Applies one offset and limit across every token of a search.
///
/// Every offered value counts towards the offset, accepted or not. Once
/// `limit` values were accepted by the inner consumer, everything else is
/// rejected.
#[derive(Debug)]
pub struct RangeCollector<'a, C: ?Sized> {
    inner: &'a mut C,
    offset: usize,
    limit: usize,
    found: usize,
    collected: usize,
}

impl<'a, C: ?Sized> RangeCollector<'a, C> {
    pub fn new(inner: &'a mut C, offset: usize, limit: usize) -> Self {
        Self {
            inner,
            offset,
            limit,
            found: 0,
            collected: 0,
        }
    }

    /// Values offered so far.
    pub fn found(&self) -> usize {
        self.found
    }

    /// Values accepted so far.
    pub fn collected(&self) -> usize {
        self.collected
    }
}

impl<T, C> IndexConsumer<T> for RangeCollector<'_, C>
where
    C: IndexConsumer<T> + ?Sized,
{
    fn accept(&mut self, token: &str, value: &T) -> bool {
        self.found += 1;
        if self.found <= self.offset || self.collected >= self.limit {
            return false;
        }
        let accepted = self.inner.accept(token, value);
        if accepted {
            self.collected += 1;
        }
        accepted
    }
}

/// Groups accepted values by token, in the order tokens were searched.
#[derive(Debug, Clone)]
pub struct MapCollector<T> {
    map: IndexMap<String, Vec<T>>,
}

impl<T> MapCollector<T> {
    pub fn new() -> Self {
        Self { map: IndexMap::new() }
    }

    pub fn map(&self) -> &IndexMap<String, Vec<T>> {
        &self.map
    }

    pub fn into_map(self) -> IndexMap<String, Vec<T>> {
        self.map
    }
}

impl<T> Default for MapCollector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> IndexConsumer<T> for MapCollector<T> {
    fn accept(&mut self, token: &str, value: &T) -> bool {
        match self.map.get_mut(token) {
            Some(values) => values.push(value.clone()),
            None => {
                self.map.insert(token.to_string(), vec![value.clone()]);
            }
        }
        true
    }
}

/// Concatenates accepted values regardless of token.
#[derive(Debug, Clone)]
pub struct ListCollector<T> {
    values: Vec<T>,
}

impl<T> ListCollector<T> {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }
}

impl<T> Default for ListCollector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> IndexConsumer<T> for ListCollector<T> {
    fn accept(&mut self, _token: &str, value: &T) -> bool {
        self.values.push(value.clone());
        true
    }
}

/// Like [`ListCollector`], but rejects values already accepted under any token.
#[derive(Debug, Clone)]
pub struct DistinctCollector<T> {
    seen: HashSet<T>,
    values: Vec<T>,
}

impl<T: Eq + Hash> DistinctCollector<T> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            values: Vec::new(),
        }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_values(self) -> Vec<T> {
        self.values
    }
}

impl<T: Eq + Hash> Default for DistinctCollector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Eq + Hash> IndexConsumer<T> for DistinctCollector<T> {
    fn accept(&mut self, _token: &str, value: &T) -> bool {
        if !self.seen.insert(value.clone()) {
            return false;
        }
        self.values.push(value.clone());
        true
    }
}
