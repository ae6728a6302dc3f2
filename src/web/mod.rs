pub mod admin;
pub mod clubs;
pub mod comments;
pub mod likes;
pub mod news;
pub mod posts;
pub mod reports;
pub mod suggestions;
pub mod teachers;
pub mod users;
pub mod webhook;

/// Configures the web app by adding services from each web file.
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Route resolution stops at the first match; more specific paths are
    // registered by their own modules.
    admin::configure(conf);
    clubs::configure(conf);
    comments::configure(conf);
    likes::configure(conf);
    news::configure(conf);
    posts::configure(conf);
    reports::configure(conf);
    suggestions::configure(conf);
    teachers::configure(conf);
    users::configure(conf);
    webhook::configure(conf);
}

/// Strip markup and check whether any visible text remains. Rich-text editors
/// submit markup like `<p><br></p>` for an empty document.
pub(crate) fn html_text_is_empty(content: &str) -> bool {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

    TAGS.replace_all(content, "").trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::html_text_is_empty;

    #[test]
    fn empty_markup_counts_as_empty() {
        assert!(html_text_is_empty(""));
        assert!(html_text_is_empty("   "));
        assert!(html_text_is_empty("<p><br></p>"));
        assert!(html_text_is_empty("<div>\n  <span></span>\n</div>"));
    }

    #[test]
    fn text_content_counts_as_non_empty() {
        assert!(!html_text_is_empty("<p>hello</p>"));
        assert!(!html_text_is_empty("plain text"));
    }
}
