use anyhow::Context;
use reqwest::Url;
use uuid::Uuid;

use super::schemas::ContactLink;
use crate::configuration::ContactSettings;
use crate::constants::WHATSAPP_BASE_URL;

pub fn bird_inquiry_message(contact: &ContactSettings, bird_id: Uuid, bird_name: &str) -> String {
    let mut message = format!("Hi, I'm interested in the bird: {}.", bird_name);
    let site_url = contact.site_url.trim_end_matches('/');
    if !site_url.is_empty() {
        message.push_str(&format!("\nLink: {}/birds/{}", site_url, bird_id));
    }
    message
}

/// Builds a `wa.me` chat link to the farm's number with `message` prefilled.
pub fn whatsapp_link(contact: &ContactSettings, message: String) -> Result<ContactLink, anyhow::Error> {
    let digits: String = contact
        .phone_number
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        anyhow::bail!("Contact phone number is not configured");
    }
    let mut url = Url::parse(WHATSAPP_BASE_URL).context("Invalid WhatsApp base url")?;
    url.set_path(&digits);
    url.query_pairs_mut().append_pair("text", &message);
    Ok(ContactLink {
        url: url.to_string(),
        phone_number: format!("+{}", digits),
        message,
    })
}
