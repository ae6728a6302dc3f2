//! Per-viewer content visibility and author disclosure rules.
//!
//! Listing predicates always exclude soft-deleted and hidden rows; that part
//! is applied in the query layer. This module owns the per-row decisions:
//! what author name a viewer sees, who may open a Q&A item, and which
//! categories the general and hot feeds exclude by construction.

use crate::orm::posts::{Category, Visibility};

/// Placeholder shown whenever the author's identity is withheld.
pub const ANONYMOUS: &str = "Anonymous";

/// Categories never included in the general community feed or the hot feed.
/// Q&A is private to author+admin; club posts live on the club pages.
pub const GENERAL_FEED_EXCLUDED: [Category; 2] = [Category::Qna, Category::Club];

/// Resolve the basic display name for a row: anonymous posts always mask the
/// author; nickname posts fall back nickname -> name -> "Anonymous".
pub fn display_name(
    visibility: Visibility,
    nickname: Option<&str>,
    name: Option<&str>,
) -> String {
    match visibility {
        Visibility::Anonymous => ANONYMOUS.to_string(),
        Visibility::Nickname => nickname
            .filter(|n| !n.is_empty())
            .or_else(|| name.filter(|n| !n.is_empty()))
            .unwrap_or(ANONYMOUS)
            .to_string(),
    }
}

/// Whether the viewer is the author or an admin, the only parties Q&A
/// authorship is ever disclosed to.
pub fn is_owner_or_admin(author_id: &str, viewer_id: Option<&str>, viewer_is_admin: bool) -> bool {
    viewer_is_admin || viewer_id == Some(author_id)
}

/// Resolve the display name a viewer sees for a post or comment.
///
/// For Q&A rows, authorship is never disclosed to the public: non-owner
/// non-admin viewers get "Anonymous" even when the row's visibility mode is
/// `nickname`. Everywhere else the basic rule applies.
pub fn author_display_name(
    category: Category,
    visibility: Visibility,
    author_id: &str,
    nickname: Option<&str>,
    name: Option<&str>,
    viewer_id: Option<&str>,
    viewer_is_admin: bool,
) -> String {
    if category == Category::Qna && !is_owner_or_admin(author_id, viewer_id, viewer_is_admin) {
        return ANONYMOUS.to_string();
    }

    display_name(visibility, nickname, name)
}

/// Whether the viewer may open a Q&A item directly. Lists degrade to empty
/// for guests instead; a direct detail fetch by anyone else is Forbidden.
pub fn can_view_qna_detail(
    author_id: &str,
    viewer_id: Option<&str>,
    viewer_is_admin: bool,
) -> bool {
    viewer_id.is_some() && is_owner_or_admin(author_id, viewer_id, viewer_is_admin)
}

/// Only the original author may edit.
pub fn can_edit(author_id: &str, viewer_id: Option<&str>) -> bool {
    viewer_id == Some(author_id)
}

/// The author or an admin may soft-delete.
pub fn can_delete(author_id: &str, viewer_id: Option<&str>, viewer_is_admin: bool) -> bool {
    is_owner_or_admin(author_id, viewer_id, viewer_is_admin)
}
