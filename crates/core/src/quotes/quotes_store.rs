//! Write-through local store for quotes and ancillary UI state.

use std::collections::BTreeSet;
use std::sync::Arc;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use super::quotes_model::{CategoryFilter, Quote};
use crate::errors::{Error, Result};
use crate::storage::Storage;

pub const QUOTES_KEY: &str = "quotes";
pub const SELECTED_CATEGORY_KEY: &str = "selectedCategory";
pub const LAST_VIEWED_QUOTE_KEY: &str = "lastViewedQuote";

/// In-memory snapshot of the quote collection backed by durable storage.
///
/// Every mutation writes to storage before the in-memory snapshot changes, so a
/// failed write leaves the store exactly as it was.
pub struct LocalStore {
    storage: Arc<dyn Storage>,
    session: Arc<dyn Storage>,
    quotes: Vec<Quote>,
}

impl LocalStore {
    /// Loads the persisted snapshot. Missing state opens an empty store; a
    /// corrupt persisted value is a parse failure.
    pub fn open(storage: Arc<dyn Storage>, session: Arc<dyn Storage>) -> Result<Self> {
        let quotes = match storage.get(QUOTES_KEY)? {
            Some(raw) => serde_json::from_str::<Vec<Quote>>(&raw).map_err(|e| {
                Error::parse(format!("persisted quotes are not a valid quote list: {e}"))
            })?,
            None => Vec::new(),
        };
        debug!("[QuoteSync] Local store opened with {} quotes", quotes.len());
        Ok(Self {
            storage,
            session,
            quotes,
        })
    }

    pub fn snapshot(&self) -> Vec<Quote> {
        self.quotes.clone()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Distinct categories present in the store.
    pub fn categories(&self) -> BTreeSet<String> {
        self.quotes.iter().map(|q| q.category.clone()).collect()
    }

    pub fn filtered(&self, filter: &CategoryFilter) -> Vec<Quote> {
        self.quotes
            .iter()
            .filter(|q| filter.matches(q))
            .cloned()
            .collect()
    }

    /// Picks a random quote among those matching `filter`.
    pub fn random_quote<R: Rng + ?Sized>(
        &self,
        filter: &CategoryFilter,
        rng: &mut R,
    ) -> Option<Quote> {
        let candidates: Vec<&Quote> = self.quotes.iter().filter(|q| filter.matches(q)).collect();
        candidates.choose(rng).map(|q| (*q).clone())
    }

    pub fn selected_filter(&self) -> Result<CategoryFilter> {
        match self.storage.get(SELECTED_CATEGORY_KEY)? {
            Some(raw) if !raw.is_empty() => raw.parse(),
            _ => Ok(CategoryFilter::All),
        }
    }

    pub fn set_filter(&self, filter: &CategoryFilter) -> Result<()> {
        self.storage.set(SELECTED_CATEGORY_KEY, filter.as_stored())
    }

    /// Remembers `quote` as the last one displayed (session scope).
    pub fn record_viewed(&self, quote: &Quote) -> Result<()> {
        let raw = serde_json::to_string(quote)?;
        self.session.set(LAST_VIEWED_QUOTE_KEY, &raw)
    }

    pub fn last_viewed(&self) -> Result<Option<Quote>> {
        match self.session.get(LAST_VIEWED_QUOTE_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Appends one validated quote.
    pub fn add(&mut self, quote: Quote) -> Result<()> {
        quote.validate()?;
        let mut next = self.quotes.clone();
        next.push(quote);
        self.replace_all(next)
    }

    /// Appends every record of a JSON array. No merge is applied: duplicates
    /// are kept. The import is all-or-nothing.
    pub fn import_json(&mut self, raw: &str) -> Result<usize> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| Error::parse(format!("import is not valid JSON: {e}")))?;
        let items = value
            .as_array()
            .ok_or_else(|| Error::parse("import must be a JSON array of quotes"))?;

        let mut imported = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let quote: Quote = serde_json::from_value(item.clone())
                .map_err(|e| Error::parse(format!("import item {index} is not a quote: {e}")))?;
            quote
                .validate()
                .map_err(|e| Error::parse(format!("import item {index}: {e}")))?;
            imported.push(quote);
        }

        let count = imported.len();
        let mut next = self.quotes.clone();
        next.extend(imported);
        self.replace_all(next)?;
        Ok(count)
    }

    /// Serializes the snapshot in the same shape `import_json` accepts.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.quotes)?)
    }

    /// Persists `quotes` and makes it the current snapshot.
    pub fn replace_all(&mut self, quotes: Vec<Quote>) -> Result<()> {
        let raw = serde_json::to_string(&quotes)?;
        self.storage.set(QUOTES_KEY, &raw)?;
        self.quotes = quotes;
        Ok(())
    }
}
