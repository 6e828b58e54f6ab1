use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Question content and explanations come from a rich-text editor, so they
/// arrive as HTML fragments. This applies whitelist-based sanitization:
/// safe formatting tags (<b>, <p>, lists) survive, while <script>,
/// <iframe> and event-handler attributes are stripped before storage.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
