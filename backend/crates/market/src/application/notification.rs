//! Marketplace mails

use askama::Template;
use platform::mail::{Mail, MailError};

use crate::domain::entity::item::Item;

#[derive(Template)]
#[template(path = "mail/bid_alert.html")]
struct BidAlertBody<'a> {
    owner: &'a str,
    bidder: &'a str,
    item_name: &'a str,
    item_link: &'a str,
}

/// Tells a seller that someone bid on their listing
pub fn bid_alert_mail(item: &Item, bidder: &str, item_link: &str) -> Result<Mail, MailError> {
    Mail::render(
        item.owner.email.as_str(),
        "Bid placed on your item",
        &BidAlertBody {
            owner: &item.owner.display_name,
            bidder,
            item_name: item.name.as_str(),
            item_link,
        },
    )
}
