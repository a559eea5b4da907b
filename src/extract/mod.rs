pub mod cards;
pub mod listing;

use scraper::ElementRef;

/// Concatenated text of an element, trimmed.
pub(crate) fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
