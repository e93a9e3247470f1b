//! Idempotent merge statement for one ingested post.
//!
//! A [`PostMerge`] holds the post's own fields plus a set of optional,
//! independently toggled [`MergeClause`]s. Rendering emits only the clauses
//! that are present, always in the same order, so the same input always
//! yields the same statement. Every node and relationship is written with
//! `MERGE`, never `CREATE`, which keeps repeated ingestion and cross-post
//! fan-in from duplicating anything.

use std::collections::HashSet;
use std::fmt::Write;

use factgraph_common::UNKNOWN_AUTHOR;

use crate::schema::{NodeLabel, RelType};
use crate::store::Statement;

/// Extracted value lists that fan out from a post to shared satellite nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SatelliteKind {
    Claim,
    Entity,
    Keyword,
    Hashtag,
    Mention,
}

impl SatelliteKind {
    pub const ALL: [SatelliteKind; 5] = [
        SatelliteKind::Claim,
        SatelliteKind::Entity,
        SatelliteKind::Keyword,
        SatelliteKind::Hashtag,
        SatelliteKind::Mention,
    ];

    pub fn label(self) -> NodeLabel {
        match self {
            SatelliteKind::Claim => NodeLabel::Claim,
            // Mentions share the Entity key space.
            SatelliteKind::Entity | SatelliteKind::Mention => NodeLabel::Entity,
            SatelliteKind::Keyword => NodeLabel::Keyword,
            SatelliteKind::Hashtag => NodeLabel::Hashtag,
        }
    }

    pub fn rel(self) -> RelType {
        match self {
            SatelliteKind::Claim => RelType::ContainsClaim,
            SatelliteKind::Entity => RelType::Mentions,
            SatelliteKind::Keyword => RelType::HasKeyword,
            SatelliteKind::Hashtag => RelType::HasHashtag,
            SatelliteKind::Mention => RelType::MentionsUser,
        }
    }

    pub fn param(self) -> &'static str {
        match self {
            SatelliteKind::Claim => "claimsList",
            SatelliteKind::Entity => "entitiesList",
            SatelliteKind::Keyword => "keywordsList",
            SatelliteKind::Hashtag => "hashtagsList",
            SatelliteKind::Mention => "mentionsList",
        }
    }

    fn var(self) -> &'static str {
        match self {
            SatelliteKind::Claim => "c",
            SatelliteKind::Entity => "e",
            SatelliteKind::Keyword => "k",
            SatelliteKind::Hashtag => "h",
            SatelliteKind::Mention => "m",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeClause {
    /// `(Post)-[:AT_TIME]->(Timestamp)`.
    Timestamp(String),
    /// `(Post)-[:HAS_VERDICT]->(Verdict)-[:FROM_SOURCE]->(Source)`.
    Verdict { value: String, source: String },
    /// One `(Post)-[rel]->(label)` link per distinct value.
    Satellites {
        kind: SatelliteKind,
        values: Vec<String>,
    },
}

impl MergeClause {
    /// Render order; at most one clause per slot.
    fn slot(&self) -> u8 {
        match self {
            MergeClause::Timestamp(_) => 0,
            MergeClause::Verdict { .. } => 1,
            MergeClause::Satellites { kind, .. } => 2 + *kind as u8,
        }
    }

    fn render(&self, cypher: &mut String, stmt: Statement) -> Statement {
        match self {
            MergeClause::Timestamp(value) => {
                let ts = NodeLabel::Timestamp;
                let _ = writeln!(cypher, "MERGE (t:{ts} {{{key}: $timestampValue}})", key = ts.key());
                let _ = writeln!(cypher, "MERGE (p)-[:{}]->(t)", RelType::AtTime);
                stmt.param("timestampValue", value.as_str())
            }
            MergeClause::Verdict { value, source } => {
                render_verdict(cypher);
                stmt.param("verdictValue", value.as_str())
                    .param("verdictSource", source.as_str())
            }
            MergeClause::Satellites { kind, values } => {
                let label = kind.label();
                let _ = writeln!(
                    cypher,
                    "FOREACH (value IN ${param} | MERGE ({v}:{label} {{{key}: value}}) MERGE (p)-[:{rel}]->({v}))",
                    param = kind.param(),
                    v = kind.var(),
                    key = label.key(),
                    rel = kind.rel(),
                );
                stmt.param(kind.param(), values.clone())
            }
        }
    }
}

fn render_verdict(cypher: &mut String) {
    let verdict = NodeLabel::FactCheckVerdict;
    let source = NodeLabel::FactCheckSource;
    let _ = writeln!(cypher, "MERGE (v:{verdict} {{{key}: $verdictValue}})", key = verdict.key());
    let _ = writeln!(cypher, "MERGE (s:{source} {{{key}: $verdictSource}})", key = source.key());
    let _ = writeln!(cypher, "MERGE (p)-[:{}]->(v)", RelType::HasVerdict);
    let _ = writeln!(cypher, "MERGE (v)-[:{}]->(s)", RelType::FromSource);
}

/// Builder for the single statement that upserts one post and everything
/// hanging off it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMerge {
    post_id: String,
    content: String,
    summary: String,
    author: String,
    clauses: Vec<MergeClause>,
}

impl PostMerge {
    pub fn new(post_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            content: content.into(),
            summary: String::new(),
            author: UNKNOWN_AUTHOR.to_string(),
            clauses: Vec::new(),
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Author name; `None` or blank keeps the "Unknown" default.
    pub fn author(mut self, author: Option<&str>) -> Self {
        if let Some(name) = author.map(str::trim).filter(|s| !s.is_empty()) {
            self.author = name.to_string();
        }
        self
    }

    /// Attach a Timestamp only when one was normalized.
    pub fn timestamp(mut self, value: Option<String>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.put(MergeClause::Timestamp(value));
        }
        self
    }

    /// Attach a verdict only when one was derived.
    pub fn verdict(mut self, value: Option<String>, source: impl Into<String>) -> Self {
        if let Some(value) = value {
            self.put(MergeClause::Verdict {
                value,
                source: source.into(),
            });
        }
        self
    }

    /// Add values of one satellite kind. Blank values are dropped and each
    /// distinct value is kept once, in first-seen order. Calling twice for
    /// the same kind extends the existing clause.
    pub fn satellites<I, S>(mut self, kind: SatelliteKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut merged = match self.take(kind) {
            Some(MergeClause::Satellites { values, .. }) => values,
            _ => Vec::new(),
        };
        let mut seen: HashSet<String> = merged.iter().cloned().collect();
        for value in values {
            let value: String = value.into();
            if value.trim().is_empty() || seen.contains(&value) {
                continue;
            }
            seen.insert(value.clone());
            merged.push(value);
        }
        if !merged.is_empty() {
            self.put(MergeClause::Satellites {
                kind,
                values: merged,
            });
        }
        self
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn clauses(&self) -> &[MergeClause] {
        &self.clauses
    }

    pub fn satellite_values(&self, kind: SatelliteKind) -> &[String] {
        self.clauses
            .iter()
            .find_map(|c| match c {
                MergeClause::Satellites { kind: k, values } if *k == kind => Some(values.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    fn take(&mut self, kind: SatelliteKind) -> Option<MergeClause> {
        let idx = self.clauses.iter().position(
            |c| matches!(c, MergeClause::Satellites { kind: k, .. } if *k == kind),
        )?;
        Some(self.clauses.remove(idx))
    }

    fn put(&mut self, clause: MergeClause) {
        let slot = clause.slot();
        self.clauses.retain(|c| c.slot() != slot);
        let at = self.clauses.partition_point(|c| c.slot() < slot);
        self.clauses.insert(at, clause);
    }

    /// Render the parameterized statement. Returns `postId`.
    pub fn statement(&self) -> Statement {
        let post = NodeLabel::Post;
        let author = NodeLabel::Author;
        let mut cypher = String::new();

        let _ = writeln!(cypher, "MERGE (p:{post} {{{key}: $postId}})", key = post.key());
        let _ = writeln!(
            cypher,
            "  ON CREATE SET p.content = $postContent, p.summary = $postSummary, p.createdAt = datetime()"
        );
        let _ = writeln!(
            cypher,
            "  ON MATCH SET p.content = $postContent, p.summary = $postSummary, p.updatedAt = datetime()"
        );
        let _ = writeln!(cypher, "MERGE (a:{author} {{{key}: $authorName}})", key = author.key());
        let _ = writeln!(cypher, "MERGE (a)-[:{}]->(p)", RelType::Created);
        let _ = writeln!(cypher, "WITH p");

        let mut stmt = Statement::new(String::new())
            .param("postId", self.post_id.as_str())
            .param("postContent", self.content.as_str())
            .param("postSummary", self.summary.as_str())
            .param("authorName", self.author.as_str());

        for clause in &self.clauses {
            stmt = clause.render(&mut cypher, stmt);
        }

        cypher.push_str("RETURN p.id AS postId");
        stmt.cypher = cypher;
        stmt.returns(&["postId"])
    }
}

/// Attach a verdict to an existing post from an external fact-check. Returns
/// `postId` only when the post exists.
pub fn verdict_update(post_id: &str, verdict: &str, source: &str) -> Statement {
    let mut cypher = format!(
        "MATCH (p:{post} {{{key}: $postId}})\n",
        post = NodeLabel::Post,
        key = NodeLabel::Post.key(),
    );
    render_verdict(&mut cypher);
    cypher.push_str("RETURN p.id AS postId");

    Statement::new(cypher)
        .param("postId", post_id)
        .param("verdictValue", verdict)
        .param("verdictSource", source)
        .returns(&["postId"])
}
