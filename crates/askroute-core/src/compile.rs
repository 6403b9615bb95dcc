//! Evidence compilation under a character budget

use crate::error::{AskRouteError, Result};
use crate::rank::RankedHit;
use crate::sources::SourceKind;
use std::collections::{BTreeMap, BTreeSet};

/// Merge order for external mode
pub const EXTERNAL_PRIORITY: [SourceKind; 3] = [SourceKind::Web, SourceKind::Video, SourceKind::Code];

/// Merge order for internal mode
pub const INTERNAL_PRIORITY: [SourceKind; 1] = [SourceKind::Document];

/// Hits from one source that made it into the compiled text
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceGroup {
    pub kind: SourceKind,
    pub hits: Vec<RankedHit>,
}

/// Everything the synthesizer sees for one request.
///
/// Constructed only by [`ContextCompiler::compile`]; read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceBundle {
    groups: Vec<EvidenceGroup>,
    compiled_text: String,
    budget: usize,
}

impl EvidenceBundle {
    pub fn empty(budget: usize) -> Self {
        Self {
            groups: Vec::new(),
            compiled_text: String::new(),
            budget,
        }
    }

    pub fn groups(&self) -> &[EvidenceGroup] {
        &self.groups
    }

    pub fn compiled_text(&self) -> &str {
        &self.compiled_text
    }

    /// Length of the compiled text in characters
    pub fn compiled_len(&self) -> usize {
        self.compiled_text.chars().count()
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Included hits for one source, in rank order
    pub fn hits(&self, kind: SourceKind) -> &[RankedHit] {
        self.groups
            .iter()
            .find(|g| g.kind == kind)
            .map(|g| g.hits.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.hits.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sources that contributed at least one included hit
    pub fn sources_used(&self) -> BTreeSet<SourceKind> {
        self.groups
            .iter()
            .filter(|g| !g.hits.is_empty())
            .map(|g| g.kind)
            .collect()
    }

    /// Fail if the compiled text is over budget
    pub fn check_budget(&self) -> Result<()> {
        let len = self.compiled_len();
        if len > self.budget {
            return Err(AskRouteError::InvariantViolation(format!(
                "compiled context is {} chars, budget is {}",
                len, self.budget
            )));
        }
        Ok(())
    }
}

/// Renders one hit as a single context line
pub fn format_line(hit: &RankedHit) -> String {
    let title = collapse(&hit.hit.title);
    let snippet = collapse(&hit.hit.snippet);
    if snippet.is_empty() {
        format!("[{}] {}", hit.source_kind(), title)
    } else {
        format!("[{}] {} — {}", hit.source_kind(), title, snippet)
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy)]
pub struct ContextCompiler {
    budget: usize,
}

impl ContextCompiler {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Merge ranked hits in `priority` order until the next line would not
    /// fit, then stop. Kinds absent from `priority` are ignored.
    pub fn compile(
        &self,
        mut ranked: BTreeMap<SourceKind, Vec<RankedHit>>,
        priority: &[SourceKind],
    ) -> EvidenceBundle {
        let mut groups: Vec<EvidenceGroup> = Vec::new();
        let mut text = String::new();
        let mut used = 0usize;

        'sources: for kind in priority {
            let Some(mut hits) = ranked.remove(kind) else {
                continue;
            };
            hits.sort_by_key(|h| h.rank);

            let mut included = Vec::new();
            for hit in hits {
                let line = format_line(&hit);
                let separator = usize::from(used > 0);
                let cost = separator + line.chars().count();
                if used + cost > self.budget {
                    tracing::debug!(
                        "Context budget reached at {} of {} chars ({} source)",
                        used,
                        self.budget,
                        kind
                    );
                    if !included.is_empty() {
                        groups.push(EvidenceGroup {
                            kind: *kind,
                            hits: included,
                        });
                    }
                    break 'sources;
                }
                if separator == 1 {
                    text.push('\n');
                }
                text.push_str(&line);
                used += cost;
                included.push(hit);
            }

            if !included.is_empty() {
                groups.push(EvidenceGroup {
                    kind: *kind,
                    hits: included,
                });
            }
        }

        let bundle = EvidenceBundle {
            groups,
            compiled_text: text,
            budget: self.budget,
        };
        debug_assert!(bundle.compiled_len() <= self.budget);
        bundle
    }
}
