//! Candidate ordering and watermark checks.

use murmur_core::{
    config::CandidateOrder,
    post::{Post, Watermark},
};
use std::cmp::Ordering;

/// Sort candidates by id.
///
/// `Lexicographic` compares the raw id strings, so "99" sorts after "100".
/// `Numeric` compares ids as integers; non-numeric ids go last.
pub(crate) fn order(mut posts: Vec<Post>, order: CandidateOrder) -> Vec<Post> {
    match order {
        CandidateOrder::Lexicographic => {
            posts.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        }
        CandidateOrder::Numeric => {
            posts.sort_by(|a, b| match (a.id.numeric(), b.id.numeric()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.id.as_str().cmp(b.id.as_str()),
            });
        }
    }
    posts
}

/// Whether a candidate is processed this cycle.
///
/// Replies always are; anything else only when newer than the watermark.
pub(crate) fn is_due(post: &Post, watermark: Option<&Watermark>) -> bool {
    if post.is_reply {
        return true;
    }
    match watermark {
        None => true,
        Some(w) => post.id.numeric().is_some_and(|id| w.is_behind(&id)),
    }
}
