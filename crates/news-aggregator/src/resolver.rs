use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use pipeline_core::QuoteProvider;
use sha2::{Digest, Sha256};

/// Session-scoped ticker → company-name cache.
///
/// Owned by the composition root and handed to whoever needs display names,
/// instead of living in hidden module state. Entries are never evicted;
/// ticker universes are small enough that unbounded growth within a session
/// is acceptable. Keys are uppercase-normalized so "abc" and "ABC" share one
/// entry, and racing inserts resolve as last-write-wins.
pub struct CompanyNameResolver {
    quotes: Arc<dyn QuoteProvider>,
    names: DashMap<String, String>,
    /// Fingerprint of the holdings set the cache was last preloaded from.
    /// Guarding on this rather than on cache non-emptiness means a changed
    /// portfolio or watchlist re-merges mid-session while an identical one
    /// stays a no-op.
    preloaded: Mutex<Option<String>>,
}

impl CompanyNameResolver {
    pub fn new(quotes: Arc<dyn QuoteProvider>) -> Self {
        Self {
            quotes,
            names: DashMap::new(),
            preloaded: Mutex::new(None),
        }
    }

    /// Seed the cache from a user's saved symbols. Watchlist names are
    /// applied after portfolio names, so for a ticker present in both the
    /// watchlist entry wins.
    pub fn preload(
        &self,
        portfolio: &HashMap<String, String>,
        watchlist: &HashMap<String, String>,
    ) {
        let fingerprint = holdings_fingerprint(portfolio, watchlist);
        {
            let mut guard = self.preloaded.lock().unwrap_or_else(|e| e.into_inner());
            if guard.as_deref() == Some(fingerprint.as_str()) {
                return;
            }
            *guard = Some(fingerprint);
        }

        for (ticker, name) in portfolio {
            self.names.insert(ticker.trim().to_uppercase(), name.clone());
        }
        for (ticker, name) in watchlist {
            self.names.insert(ticker.trim().to_uppercase(), name.clone());
        }
    }

    /// Resolve a ticker to a display name.
    ///
    /// Cache hit, else one point lookup against the quote provider. A failed
    /// lookup returns the symbol itself and caches nothing, so a later call
    /// can still succeed. Never errors.
    pub async fn resolve(&self, ticker: &str) -> String {
        let key = ticker.trim().to_uppercase();
        if let Some(cached) = self.names.get(&key) {
            return cached.clone();
        }

        match self.quotes.quote(&key).await {
            Ok(snapshot) => {
                let name = snapshot.name.unwrap_or_else(|| key.clone());
                self.names.insert(key, name.clone());
                name
            }
            Err(e) => {
                tracing::debug!(ticker = %key, error = %e, "name lookup failed, using symbol");
                key
            }
        }
    }

    #[cfg(test)]
    fn cached(&self, ticker: &str) -> Option<String> {
        self.names.get(&ticker.to_uppercase()).map(|v| v.clone())
    }
}

/// Order-independent identity of the combined holdings set.
fn holdings_fingerprint(
    portfolio: &HashMap<String, String>,
    watchlist: &HashMap<String, String>,
) -> String {
    let mut rows: Vec<String> = portfolio
        .iter()
        .map(|(t, n)| format!("p:{}={}", t.trim().to_uppercase(), n))
        .chain(
            watchlist
                .iter()
                .map(|(t, n)| format!("w:{}={}", t.trim().to_uppercase(), n)),
        )
        .collect();
    rows.sort();

    let mut hasher = Sha256::new();
    for row in rows {
        hasher.update(row);
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}
