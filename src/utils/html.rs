use ammonia;

/// Sanitize rich-text editor output before it is stored.
///
/// Question text, answer options and feedback arrive as HTML produced by
/// the client-side editor. The editor is trusted UI, not a trust boundary,
/// so every write passes through this whitelist-based sanitizer: safe tags
/// (<b>, <p>, <table>, <img> ...) survive, <script>/<iframe> and event
/// attributes do not.
///
/// Sanitizing never collapses whitespace; the answer-level whitespace
/// normalization is a separate step in the paper pipeline.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
