//! Delete-by-query keys.

use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::Result;
use crate::index::DocId;
use crate::index::segment::DeletableSegment;
use crate::index::term::Term;

/// A predicate selecting documents to delete.
pub trait DeleteQuery: Send + Sync + Debug {
    /// Local ordinals of the matching documents in `segment`, ascending.
    fn matching_docs(&self, segment: &dyn DeletableSegment) -> Result<Vec<DocId>>;

    /// A value identity for this query.
    ///
    /// Queries returning `None` are keyed by object identity: two distinct
    /// query objects are distinct keys even when logically equivalent.
    fn identity(&self) -> Option<QueryIdentity> {
        None
    }
}

/// Value identity of a delete query.
///
/// Identities of different variants never compare equal, so a term query
/// and a custom query cannot collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryIdentity {
    /// Matches exactly the documents containing this term.
    Term(Term),
    /// Query-defined identity: a query kind plus its own key bytes.
    Custom {
        kind: &'static str,
        key: Vec<u8>,
    },
}

/// Hash key wrapping a shared query.
///
/// Two keys are equal when both queries report the same [`identity`], or
/// when neither reports one and both point at the same query object.
///
/// [`identity`]: DeleteQuery::identity
#[derive(Debug, Clone)]
pub struct QueryKey {
    query: Arc<dyn DeleteQuery>,
    identity: Option<QueryIdentity>,
}

impl QueryKey {
    /// Wrap a query.
    pub fn new(query: Arc<dyn DeleteQuery>) -> Self {
        let identity = query.identity();
        QueryKey { query, identity }
    }

    /// Get the wrapped query.
    pub fn query(&self) -> &Arc<dyn DeleteQuery> {
        &self.query
    }

    fn address(&self) -> usize {
        Arc::as_ptr(&self.query) as *const () as usize
    }
}

impl<Q: DeleteQuery + 'static> From<Arc<Q>> for QueryKey {
    fn from(query: Arc<Q>) -> Self {
        QueryKey::new(query)
    }
}

impl PartialEq for QueryKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.identity, &other.identity) {
            (Some(a), Some(b)) => a == b,
            (None, None) => self.address() == other.address(),
            _ => false,
        }
    }
}

impl Eq for QueryKey {}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.identity {
            Some(identity) => {
                state.write_u8(1);
                identity.hash(state);
            }
            None => {
                state.write_u8(0);
                self.address().hash(state);
            }
        }
    }
}

/// Deletes every document containing a term.
#[derive(Debug, Clone)]
pub struct TermDeleteQuery {
    term: Term,
}

impl TermDeleteQuery {
    /// Create a new term delete query.
    pub fn new(term: Term) -> Self {
        TermDeleteQuery { term }
    }

    /// Get the term.
    pub fn term(&self) -> &Term {
        &self.term
    }
}

impl DeleteQuery for TermDeleteQuery {
    fn matching_docs(&self, segment: &dyn DeletableSegment) -> Result<Vec<DocId>> {
        segment.term_docs(&self.term)
    }

    fn identity(&self) -> Option<QueryIdentity> {
        Some(QueryIdentity::Term(self.term.clone()))
    }
}
