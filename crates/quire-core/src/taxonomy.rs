//! Taxonomy resolution: turning category and tag names into remote ids.
//!
//! The backend offers no atomic get-or-create. Resolution therefore reads the
//! full list of entries, then creates whatever is missing. Two callers doing
//! that at the same time could both see a name as missing and create it
//! twice, so every resolution of a kind runs under that kind's exclusive lock.
//! The locks are process-wide: every resolver in the process shares them, even
//! resolvers built over separate clients. Categories and tags have independent
//! locks.
//!
//! The pattern stays optimistic with respect to writers outside this process.
//! When a creation cannot be confirmed the resolver reports
//! [`AppError::InconsistentRemoteState`] rather than guessing.

use std::collections::{HashMap, HashSet};

use tokio::sync::Mutex;

use crate::AppError;
use crate::models::{TaxonomyEntry, TaxonomyKind};
use crate::traits::RemoteApi;

static CATEGORY_LOCK: Mutex<()> = Mutex::const_new(());
static TAG_LOCK: Mutex<()> = Mutex::const_new(());

/// Resolves taxonomy names to remote ids, creating missing entries.
///
/// All resolvers serialize on the same per-kind locks, so two services
/// created independently still never create the same name twice. Nothing is
/// cached between calls: each resolution re-reads the remote state.
#[derive(Clone)]
pub struct TaxonomyResolver<A: RemoteApi> {
    api: A,
}

impl<A: RemoteApi> TaxonomyResolver<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Resolves every distinct name in `names` to its remote id.
    ///
    /// Missing names are created one after another, in input order, while
    /// the lock for `kind` is held. Blank names are ignored. An input with
    /// no usable name returns an empty map without contacting the backend.
    ///
    /// # Errors
    ///
    /// - [`AppError::RemoteUnavailable`] if listing or creating fails transiently
    /// - [`AppError::InconsistentRemoteState`] if a created entry comes back
    ///   under a different name
    pub async fn resolve(
        &self,
        names: &[String],
        kind: TaxonomyKind,
    ) -> Result<HashMap<String, i64>, AppError> {
        let blank = names.iter().filter(|n| n.trim().is_empty()).count();
        if blank > 0 {
            tracing::debug!(%kind, blank, "Ignoring blank taxonomy names");
        }

        let names = distinct_names(names);
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        let _guard = self.lock_for(kind).lock().await;

        let snapshot = self.list(kind).await?;
        let mut known: HashMap<&str, i64> = HashMap::with_capacity(snapshot.len());
        for entry in &snapshot {
            known.entry(entry.name.as_str()).or_insert(entry.id);
        }

        let (existing, missing): (Vec<&str>, Vec<&str>) = names
            .iter()
            .copied()
            .partition(|name| known.contains_key(name));

        let mut resolved: HashMap<String, i64> = existing
            .iter()
            .map(|name| (name.to_string(), known[name]))
            .collect();

        for name in missing {
            let entry = self.create(kind, name).await?;
            if entry.name != name {
                tracing::warn!(
                    %kind,
                    requested = name,
                    returned = entry.name.as_str(),
                    "Created entry came back under a different name"
                );
                return Err(AppError::InconsistentRemoteState {
                    kind,
                    name: name.to_string(),
                });
            }
            tracing::info!(%kind, name, id = entry.id, "Created remote taxonomy entry");
            resolved.insert(entry.name, entry.id);
        }

        tracing::debug!(%kind, resolved = resolved.len(), "Taxonomy names resolved");
        Ok(resolved)
    }

    /// Resolves `names` and returns the ids in the same order.
    ///
    /// Repeated names contribute a single id, at their first position.
    pub async fn resolve_ordered(
        &self,
        names: &[String],
        kind: TaxonomyKind,
    ) -> Result<Vec<i64>, AppError> {
        let resolved = self.resolve(names, kind).await?;
        distinct_names(names)
            .into_iter()
            .map(|name| {
                resolved
                    .get(name)
                    .copied()
                    .ok_or_else(|| AppError::InconsistentRemoteState {
                        kind,
                        name: name.to_string(),
                    })
            })
            .collect()
    }

    fn lock_for(&self, kind: TaxonomyKind) -> &'static Mutex<()> {
        match kind {
            TaxonomyKind::Category => &CATEGORY_LOCK,
            TaxonomyKind::Tag => &TAG_LOCK,
        }
    }

    async fn list(&self, kind: TaxonomyKind) -> Result<Vec<TaxonomyEntry>, AppError> {
        match kind {
            TaxonomyKind::Category => self.api.list_categories().await,
            TaxonomyKind::Tag => self.api.list_tags().await,
        }
    }

    async fn create(&self, kind: TaxonomyKind, name: &str) -> Result<TaxonomyEntry, AppError> {
        match kind {
            TaxonomyKind::Category => self.api.create_category(name).await,
            TaxonomyKind::Tag => self.api.create_tag(name).await,
        }
    }
}

/// Removes repeated and blank names, keeping first occurrences in order.
fn distinct_names(names: &[String]) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(names.len());
    names
        .iter()
        .map(|n| n.as_str())
        .filter(|n| !n.trim().is_empty())
        .filter(|n| seen.insert(*n))
        .collect()
}
