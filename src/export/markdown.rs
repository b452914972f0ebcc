//! Markdown document renderer for fetched resources.
//!
//! Produces a YAML front matter block followed by fixed sections: metadata,
//! original description, then kind-specific sections (timeline and thread for
//! issues, reviews and thread for pull requests, accepted answer and replies
//! for discussions) and a references footer.

use std::io::Write;

use crate::github::models::{CommentNode, IssueData, Label, Metadata};
use crate::github::{FetchError, ResourceKind, resolve_accepted_answer};

/// Rendering behavior toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Whether comment sections carry content or an "omitted" placeholder.
    pub include_comments: bool,
}

/// Writes the full markdown document for a fetched resource.
///
/// # Errors
///
/// Returns [`FetchError::Io`] if writing to the output fails.
pub fn write_document<W: Write>(
    writer: &mut W,
    data: &IssueData,
    options: RenderOptions,
) -> Result<(), FetchError> {
    write_front_matter(writer, &data.meta)?;
    wr(writer, format_args!("# {}\n\n", data.meta.title))?;
    write_metadata_section(writer, &data.meta)?;

    wr(writer, format_args!("\n## Original Description\n\n"))?;
    if data.description.trim().is_empty() {
        wr(writer, format_args!("(empty)\n"))?;
    } else {
        wr(writer, format_args!("{}\n", data.description))?;
    }

    match data.meta.kind {
        ResourceKind::Issue => {
            wr(writer, format_args!("\n"))?;
            write_timeline_section(writer, data)?;
            wr(writer, format_args!("\n"))?;
            write_thread_section(writer, data, options)?;
        }
        ResourceKind::PullRequest => {
            wr(writer, format_args!("\n"))?;
            write_reviews_section(writer, data, options)?;
            wr(writer, format_args!("\n"))?;
            write_thread_section(writer, data, options)?;
        }
        ResourceKind::Discussion => {
            wr(writer, format_args!("\n"))?;
            write_discussion_section(writer, data, options)?;
        }
    }

    wr(writer, format_args!("\n## References\n"))?;
    wr(writer, format_args!("- Original URL: {}\n", data.meta.url))
}

fn write_front_matter<W: Write>(writer: &mut W, meta: &Metadata) -> Result<(), FetchError> {
    wr(writer, format_args!("---\n"))?;
    wr(writer, format_args!("type: {}\n", yaml_quote(meta.kind.as_str())))?;
    wr(writer, format_args!("title: {}\n", yaml_quote(&meta.title)))?;
    wr(writer, format_args!("number: {}\n", meta.number))?;
    wr(writer, format_args!("state: {}\n", yaml_quote(&meta.state)))?;
    wr(writer, format_args!("author: {}\n", yaml_quote(&meta.author)))?;
    wr(writer, format_args!("created_at: {}\n", yaml_quote(&meta.created_at)))?;
    wr(writer, format_args!("updated_at: {}\n", yaml_quote(&meta.updated_at)))?;
    wr(writer, format_args!("url: {}\n", yaml_quote(&meta.url)))?;
    write_label_list(writer, &meta.labels)?;

    match meta.kind {
        ResourceKind::PullRequest => {
            wr(writer, format_args!("merged: {}\n", meta.merged))?;
            if let Some(merged_at) = &meta.merged_at {
                wr(writer, format_args!("merged_at: {}\n", yaml_quote(merged_at)))?;
            }
            wr(writer, format_args!("review_count: {}\n", meta.review_count))?;
        }
        ResourceKind::Discussion => {
            if let Some(category) = &meta.category {
                wr(writer, format_args!("category: {}\n", yaml_quote(category)))?;
            }
            wr(writer, format_args!("is_answered: {}\n", meta.is_answered))?;
            if let Some(author) = &meta.accepted_answer_author {
                wr(
                    writer,
                    format_args!("accepted_answer_author: {}\n", yaml_quote(author)),
                )?;
            }
        }
        ResourceKind::Issue => {}
    }

    wr(writer, format_args!("---\n\n"))
}

fn write_label_list<W: Write>(writer: &mut W, labels: &[Label]) -> Result<(), FetchError> {
    if labels.is_empty() {
        return wr(writer, format_args!("labels: []\n"));
    }
    wr(writer, format_args!("labels:\n"))?;
    for label in labels {
        wr(writer, format_args!("  - {}\n", yaml_quote(&label.name)))?;
    }
    Ok(())
}

fn write_metadata_section<W: Write>(writer: &mut W, meta: &Metadata) -> Result<(), FetchError> {
    wr(writer, format_args!("## Metadata\n"))?;
    wr(writer, format_args!("- type: {}\n", meta.kind))?;
    wr(writer, format_args!("- number: {}\n", meta.number))?;
    wr(writer, format_args!("- state: {}\n", meta.state))?;
    wr(writer, format_args!("- author: {}\n", meta.author))?;
    wr(writer, format_args!("- created_at: {}\n", meta.created_at))?;
    wr(writer, format_args!("- updated_at: {}\n", meta.updated_at))?;
    wr(writer, format_args!("- url: {}\n", meta.url))?;
    wr(writer, format_args!("- labels: {}\n", join_labels(&meta.labels)))?;

    if meta.kind == ResourceKind::PullRequest {
        wr(writer, format_args!("- merged: {}\n", meta.merged))?;
        if let Some(merged_at) = &meta.merged_at {
            wr(writer, format_args!("- merged_at: {merged_at}\n"))?;
        }
        wr(writer, format_args!("- review_count: {}\n", meta.review_count))?;
    }
    if meta.kind == ResourceKind::Discussion {
        if let Some(category) = &meta.category {
            wr(writer, format_args!("- category: {category}\n"))?;
        }
        wr(writer, format_args!("- is_answered: {}\n", meta.is_answered))?;
        if let Some(author) = &meta.accepted_answer_author {
            wr(writer, format_args!("- accepted_answer_author: {author}\n"))?;
        }
    }
    Ok(())
}

fn write_timeline_section<W: Write>(writer: &mut W, data: &IssueData) -> Result<(), FetchError> {
    wr(writer, format_args!("## Timeline\n"))?;
    if data.timeline.is_empty() {
        return wr(writer, format_args!("- none\n"));
    }
    for event in &data.timeline {
        wr(
            writer,
            format_args!(
                "- {} | {} | {} | {}\n",
                event.created_at, event.event_type, event.actor, event.details
            ),
        )?;
    }
    Ok(())
}

fn write_thread_section<W: Write>(
    writer: &mut W,
    data: &IssueData,
    options: RenderOptions,
) -> Result<(), FetchError> {
    wr(writer, format_args!("## Discussion Thread\n"))?;
    if !options.include_comments {
        return wr(
            writer,
            format_args!("Comments omitted (--include-comments=false).\n"),
        );
    }
    if data.thread.is_empty() {
        return wr(writer, format_args!("- none\n"));
    }
    write_comment_list(writer, &data.thread, 0)
}

fn write_reviews_section<W: Write>(
    writer: &mut W,
    data: &IssueData,
    options: RenderOptions,
) -> Result<(), FetchError> {
    wr(writer, format_args!("## Reviews\n"))?;
    if !options.include_comments {
        return wr(
            writer,
            format_args!("Reviews omitted (--include-comments=false).\n"),
        );
    }
    if data.reviews.is_empty() {
        return wr(writer, format_args!("- none\n"));
    }
    for review in &data.reviews {
        wr(
            writer,
            format_args!(
                "- {} by {} at {}: {}\n",
                review.state, review.author, review.created_at, review.body
            ),
        )?;
        for comment in &review.comments {
            wr(
                writer,
                format_args!(
                    "  - {} ({}): {}\n",
                    comment.author, comment.created_at, comment.body
                ),
            )?;
        }
    }
    Ok(())
}

fn write_discussion_section<W: Write>(
    writer: &mut W,
    data: &IssueData,
    options: RenderOptions,
) -> Result<(), FetchError> {
    wr(writer, format_args!("## Discussion Thread\n"))?;
    if !options.include_comments {
        return wr(
            writer,
            format_args!("Comments omitted (--include-comments=false).\n"),
        );
    }
    if data.thread.is_empty() {
        return wr(writer, format_args!("- none\n"));
    }

    if data.meta.is_answered {
        let accepted = resolve_accepted_answer(
            &data.thread,
            data.meta.accepted_answer_id.as_deref(),
            data.meta.accepted_answer_author.as_deref(),
        );
        if let Some(answer) = accepted {
            wr(writer, format_args!("\n### Accepted Answer\n"))?;
            wr(
                writer,
                format_args!("- {} ({}): {}\n", answer.author, answer.created_at, answer.body),
            )?;
        }
    }

    wr(writer, format_args!("\n### Replies\n"))?;
    write_comment_list(writer, &data.thread, 0)
}

fn write_comment_list<W: Write>(
    writer: &mut W,
    comments: &[CommentNode],
    depth: usize,
) -> Result<(), FetchError> {
    let prefix = "  ".repeat(depth);
    for comment in comments {
        wr(
            writer,
            format_args!(
                "{prefix}- {} ({}): {}\n",
                comment.author, comment.created_at, comment.body
            ),
        )?;
        if !comment.replies.is_empty() {
            write_comment_list(writer, &comment.replies, depth + 1)?;
        }
    }
    Ok(())
}

fn join_labels(labels: &[Label]) -> String {
    if labels.is_empty() {
        return "none".to_owned();
    }
    labels
        .iter()
        .map(|label| label.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn yaml_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn wr<W: Write>(writer: &mut W, args: std::fmt::Arguments<'_>) -> Result<(), FetchError> {
    writer.write_fmt(args).map_err(|error| FetchError::Io {
        message: error.to_string(),
    })
}
