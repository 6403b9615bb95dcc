//! Terminal output formatter

use askroute_core::result::{ExternalResult, InternalResult};
use askroute_core::StructuredResult;

pub fn format_result(result: &StructuredResult) -> String {
    let mut output = String::new();
    output.push_str(result.answer().trim());
    output.push_str("\n\n");

    match result {
        StructuredResult::External(r) => format_external(r, &mut output),
        StructuredResult::Internal(r) => format_internal(r, &mut output),
    }

    let used: Vec<&str> = result.sources_used().iter().map(|k| k.as_str()).collect();
    if used.is_empty() {
        output.push_str("Sources: none\n");
    } else {
        output.push_str(&format!("Sources: {}\n", used.join(", ")));
    }
    output
}

fn pct(score: f64) -> u32 {
    (score * 100.0).round() as u32
}

fn format_external(r: &ExternalResult, output: &mut String) {
    if !r.web_results.is_empty() {
        output.push_str("Web:\n");
        for w in &r.web_results {
            output.push_str(&format!("{:>3}% {}\n     {}\n", pct(w.relevance), w.title, w.url));
        }
    }
    if !r.video_results.is_empty() {
        output.push_str("Videos:\n");
        for v in &r.video_results {
            output.push_str(&format!(
                "{:>3}% {} ({}, {})\n     {}\n",
                pct(v.relevance),
                v.title,
                v.channel,
                v.duration,
                v.url
            ));
        }
    }
    if !r.code_repo_results.is_empty() {
        output.push_str("Repositories:\n");
        for repo in &r.code_repo_results {
            output.push_str(&format!(
                "{:>3}% {} ★{}\n     {}\n",
                pct(repo.relevance),
                repo.repository,
                repo.stars,
                repo.url
            ));
        }
    }
    if !r.code_file_results.is_empty() {
        output.push_str("Code:\n");
        for f in &r.code_file_results {
            output.push_str(&format!(
                "{:>3}% {}:{}\n     {}\n",
                pct(f.relevance),
                f.repository,
                f.file,
                f.url
            ));
        }
    }
}

fn format_internal(r: &InternalResult, output: &mut String) {
    if !r.documents.is_empty() {
        output.push_str("Documents:\n");
        for d in &r.documents {
            output.push_str(&format!(
                "{:>3}% {} #{} [{}]\n",
                pct(d.relevance_score),
                d.title,
                d.id,
                d.category
            ));
        }
    }
    output.push_str(&format!("Confidence: {}%\n", pct(r.confidence_score)));
    if !r.related_topics.is_empty() {
        let topics: Vec<&str> = r.related_topics.iter().map(String::as_str).collect();
        output.push_str(&format!("Related: {}\n", topics.join(", ")));
    }
}
