//! Resource lookup.
//!
//! A `Resolver` turns the free text typed after a slash command into groups
//! of results. Each backend decides for itself whether a query is something
//! it can answer; backends that fail are logged and left out.

pub mod aws;
pub mod ec2;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::slack::HandlerContext;

pub use ec2::{Ec2Api, Ec2Instance, Ec2Resolver, EC2_INSTANCE_KIND};

/// A single resource found by a resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub kind: String,
    pub metadata: HashMap<String, Vec<String>>,
    pub links: HashMap<String, String>,
}

impl SearchResult {
    /// All values stored under `key`, joined with `", "`; empty if absent.
    pub fn metadata(&self, key: &str) -> String {
        self.metadata
            .get(key)
            .map(|values| values.join(", "))
            .unwrap_or_default()
    }

    /// The link named `key`; empty if absent.
    pub fn link(&self, key: &str) -> &str {
        self.links.get(key).map(String::as_str).unwrap_or("")
    }
}

/// Results of the same kind returned by one backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    pub kind: String,
    pub search_link: String,
    pub results: Vec<SearchResult>,
}

#[async_trait]
pub trait Resolver: Send + Sync {
    async fn search(&self, ctx: &HandlerContext, query: &str) -> Vec<ResultSet>;
}
