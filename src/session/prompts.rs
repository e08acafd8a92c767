//! Everything the kiosk says out loud

use crate::wishlist::WishlistEntry;

/// Spoken right after a wake
pub const WAKE_PROMPT: &str = "What is your name?";

/// Recognition engine failed at either stage
pub const HEARING_FAILURE: &str = "Sorry, I wasn't able to hear you. Try again later.";

/// Name stage produced nothing trustworthy
pub const SPEAKER_NOT_RECOGNIZED: &str = "Sorry, I do not recognize you.";

/// Item stage produced nothing trustworthy
pub const ITEM_NOT_UNDERSTOOD: &str = "Sorry, I did not get that.";

/// Administrator asked for an empty list
#[must_use]
pub fn empty_list(administrator: &str) -> String {
    format!("Hello {administrator}.\nThe list is empty.")
}

/// Administrator review introduction
#[must_use]
pub fn list_intro(administrator: &str) -> String {
    format!("Hello {administrator}.\nHere is the list.")
}

/// Ask an identified requestor for their item
#[must_use]
pub fn item_prompt(requestor: &str) -> String {
    format!("Hello {requestor}.\nWhat would you like for Christmas?")
}

/// One entry read back during review
#[must_use]
pub fn review_entry(entry: &WishlistEntry) -> String {
    entry.to_string()
}

/// Confirm an item was added
#[must_use]
pub fn confirmation(entry: &WishlistEntry) -> String {
    format!(
        "{}.\nGot it. I have added it to your Christmas list, {}.",
        entry.item(),
        entry.requestor()
    )
}
