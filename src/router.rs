use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::chat::{ChatMessage, ChatProvider};
use crate::config::DEFAULT_TOP_K;
use crate::embedding::EmbeddingProvider;
use crate::error::{LogsaiError, Result};
use crate::session::Session;
use crate::vector_entry::{LogLine, SearchResult};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

static TOP_N_ISSUES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^top ([0-9]+) issues").expect("valid top-N pattern"));

/// A "top N issues" request: `count` as the user wrote it, `limit` for ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopIssuesRequest {
    pub count: String,
    pub limit: usize,
}

/// Matches queries starting with "top N issues", ignoring case.
///
/// A count too large for `usize` saturates `limit`, which still means "everything",
/// while `count` keeps the digits for the report header.
pub fn parse_top_issues(query: &str) -> Option<TopIssuesRequest> {
    let lowered = query.to_lowercase();
    let captures = TOP_N_ISSUES.captures(&lowered)?;
    let digits = captures[1].trim_start_matches('0');
    let count = if digits.is_empty() { "0" } else { digits };
    Some(TopIssuesRequest {
        count: count.to_string(),
        limit: count.parse().unwrap_or(usize::MAX),
    })
}

/// Returns `N` when the query starts with "top N issues", ignoring case.
pub fn parse_top_n(query: &str) -> Option<usize> {
    parse_top_issues(query).map(|request| request.limit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_count(count: usize) -> Self {
        match count {
            c if c > 5 => Severity::Critical,
            c if c > 3 => Severity::High,
            c if c > 1 => Severity::Medium,
            _ => Severity::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueCount {
    pub line: String,
    pub count: usize,
    pub severity: Severity,
}

/// The `n` most frequent exact lines, most frequent first, earliest first on ties.
pub fn rank_issues(logs: &[LogLine], n: usize) -> Vec<IssueCount> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for line in logs {
        let slot = *positions.entry(line.content.as_str()).or_insert_with(|| {
            counts.push((line.content.as_str(), 0));
            counts.len() - 1
        });
        counts[slot].1 += 1;
    }

    // Stable sort keeps first-occurrence order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(n)
        .map(|(line, count)| IssueCount {
            line: line.to_string(),
            count,
            severity: Severity::from_count(count),
        })
        .collect()
}

pub fn format_issue_report(n: impl fmt::Display, issues: &[IssueCount]) -> String {
    let mut report = format!("Top {n} Issues:");
    for issue in issues {
        report.push_str(&format!(
            "\n\n{} [{}] ({} times occurred)",
            issue.line, issue.severity, issue.count
        ));
    }
    report
}

/// System prompt, the question, then the retrieved lines nearest first.
pub fn build_messages(query: &str, context: &[SearchResult]) -> Vec<ChatMessage> {
    let context = context
        .iter()
        .map(|result| result.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Analyze the following logs and answer the query: {query}"
        )),
        ChatMessage::user(context),
    ]
}

/// Decides how each query is answered and records the outcome in the session.
pub struct QueryRouter<E, C> {
    embedder: E,
    chat: C,
    top_k: usize,
}

impl<E: EmbeddingProvider, C: ChatProvider> QueryRouter<E, C> {
    pub fn new(embedder: E, chat: C) -> Self {
        Self {
            embedder,
            chat,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Zero is passed through; searches then fail with `InvalidTopK`.
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Embeds and indexes a document into `session` with this router's embedder.
    pub fn ingest(&self, session: &mut Session, text: &str) -> Result<usize> {
        session.ingest(text, &self.embedder)
    }

    /// Answers `query` and appends it to the session history.
    ///
    /// Chat failures come back as the answer text. Embedding failures abort the
    /// query with `RemoteService` and leave the history untouched.
    pub fn route(&self, session: &mut Session, query: &str) -> Result<String> {
        let response = match parse_top_issues(query) {
            Some(request) => {
                tracing::debug!(n = %request.count, "answering from line frequencies");
                let issues = rank_issues(session.logs(), request.limit);
                format_issue_report(&request.count, &issues)
            }
            None => self.answer_from_context(session, query)?,
        };

        session.record(query, response.clone());
        Ok(response)
    }

    /// The `top_k` indexed lines nearest to `query`, embedding it at most once per session.
    pub fn retrieve(&self, session: &mut Session, query: &str) -> Result<Vec<SearchResult>> {
        let embedding = match session.cached_query_embedding(query) {
            Some(embedding) => {
                tracing::debug!("reusing cached query embedding");
                embedding.clone()
            }
            None => {
                let embedding = self
                    .embedder
                    .embed(&[query.to_string()])?
                    .into_iter()
                    .next()
                    .ok_or_else(|| LogsaiError::remote("embedding", "no embedding returned"))?;
                let dimension = session.index().dimension();
                if embedding.len() != dimension {
                    return Err(LogsaiError::DimensionMismatch {
                        expected: dimension,
                        got: embedding.len(),
                    });
                }
                session.cache_query_embedding(query, embedding.clone());
                embedding
            }
        };

        session.index().search(&embedding, self.top_k)
    }

    fn answer_from_context(&self, session: &mut Session, query: &str) -> Result<String> {
        let context = self.retrieve(session, query)?;
        tracing::debug!(lines = context.len(), "retrieved context");
        Ok(self.chat.complete(&build_messages(query, &context)))
    }
}
