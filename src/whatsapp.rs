//! WhatsApp deep-link generation.
//!
//! Builds a `https://wa.me/...` link pre-filled with a product inquiry. The
//! greeting depends on the local hour in the shop's timezone, so the current
//! time is passed in by the caller rather than read here.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Timelike, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::db::models::{Product, SiteSettings};

/// Fixed UTC offset of the shop (Porto-Novo, West Africa). No DST there, so
/// a constant offset keeps the greeting deterministic and testable.
pub const LOCAL_UTC_OFFSET_HOURS: u32 = 1;

/// Served when a product has no image of its own.
pub const DEFAULT_PRODUCT_IMAGE: &str = "/static/defaults/default_product.png";

// Everything except alphanumerics and `_ . - ~ /` gets percent-encoded.
const MESSAGE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Public URL for a stored media path, falling back to the default image.
pub fn image_url(image: Option<&str>) -> String {
    match image {
        Some(path) if path.starts_with('/') => path.to_string(),
        Some(path) => format!("/media/{}", path),
        None => DEFAULT_PRODUCT_IMAGE.to_string(),
    }
}

/// Price rounded to zero decimals with grouped thousands and the FCFA
/// suffix, e.g. `299.99` -> `300 FCFA`, `1500000` -> `1,500,000 FCFA`.
pub fn display_price(price: &BigDecimal) -> String {
    let rounded = price
        .with_scale_round(0, bigdecimal::RoundingMode::HalfUp)
        .to_string();
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let reversed: Vec<char> = digits.chars().rev().collect();
    let grouped: Vec<String> = reversed
        .chunks(3)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect();
    let joined: String = grouped.join(",").chars().rev().collect();
    format!("{}{} FCFA", sign, joined)
}

/// Builds the pre-filled contact link for `product` using the current site
/// settings. `now` is injected so the time-of-day greeting is testable.
pub fn build_link(product: &Product, settings: &SiteSettings, now: DateTime<Utc>) -> String {
    let local_hour = (now.hour() + LOCAL_UTC_OFFSET_HOURS) % 24;
    let greeting = if local_hour >= 12 { "Bonsoir" } else { "Bonjour" };

    let message = format!(
        "{greeting} {company},\n\n\
         Je suis intéressé(e) par le produit suivant:\n\n\
         📱 *{name}*\n\
         🏷️ Marque: {brand}\n\
         💰 Prix: {price}\n\
         🖼️ Image: {image}\n\n\
         Merci de me contacter pour plus d'informations.",
        greeting = greeting,
        company = settings.company_name,
        name = product.name,
        brand = product.brand,
        price = display_price(&product.price),
        image = image_url(product.image.as_deref()),
    );

    let encoded = utf8_percent_encode(&message, MESSAGE_ENCODE_SET);
    format!(
        "https://wa.me/{}?text={}",
        settings.whatsapp_number, encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn sample_product(image: Option<&str>) -> Product {
        Product {
            id: 1,
            name: "AirPods Pro".to_string(),
            slug: "airpods-pro-apple".to_string(),
            description: "Casque haut de gamme".to_string(),
            price: BigDecimal::from_str("299.99").unwrap(),
            brand: "Apple".to_string(),
            image: image.map(str::to_string),
            category_id: 1,
            in_stock: true,
            featured: false,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    fn sample_settings() -> SiteSettings {
        SiteSettings {
            id: 1,
            whatsapp_number: "22900000000".to_string(),
            contact_email: "contact@niasotac.com".to_string(),
            contact_phone: "+229 00 00 00 00".to_string(),
            contact_address: "Cotonou, Bénin".to_string(),
            company_name: "NIASOTAC".to_string(),
            company_description: String::new(),
            updated_at: Utc::now().naive_utc(),
            updated_by: None,
        }
    }

    fn decode(url: &str) -> String {
        let encoded = url.split("text=").nth(1).unwrap();
        percent_encoding::percent_decode_str(encoded)
            .decode_utf8()
            .unwrap()
            .into_owned()
    }

    #[test]
    fn display_price_rounds_and_groups() {
        assert_eq!(display_price(&BigDecimal::from_str("299.99").unwrap()), "300 FCFA");
        assert_eq!(display_price(&BigDecimal::from_str("450000").unwrap()), "450,000 FCFA");
        assert_eq!(
            display_price(&BigDecimal::from_str("1500000.00").unwrap()),
            "1,500,000 FCFA"
        );
        assert_eq!(display_price(&BigDecimal::from_str("0").unwrap()), "0 FCFA");
    }

    #[test]
    fn link_targets_settings_number() {
        // 08:00 UTC is 09:00 local.
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let link = build_link(&sample_product(None), &sample_settings(), now);
        assert!(link.starts_with("https://wa.me/22900000000?text="));
    }

    #[test]
    fn message_embeds_product_fields_and_price() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let link = build_link(&sample_product(None), &sample_settings(), now);
        let message = decode(&link);
        assert!(message.contains("AirPods Pro"));
        assert!(message.contains("Apple"));
        assert!(message.contains("300 FCFA"));
        assert!(message.contains(DEFAULT_PRODUCT_IMAGE));
    }

    #[test]
    fn greeting_follows_local_hour() {
        // 09:00 local -> morning greeting.
        let morning = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let link = build_link(&sample_product(None), &sample_settings(), morning);
        assert!(decode(&link).starts_with("Bonjour NIASOTAC"));

        // Exactly noon local already counts as evening.
        let noon = Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap();
        let link = build_link(&sample_product(None), &sample_settings(), noon);
        assert!(decode(&link).starts_with("Bonsoir NIASOTAC"));

        // 20:00 local -> evening greeting.
        let evening = Utc.with_ymd_and_hms(2024, 6, 1, 19, 0, 0).unwrap();
        let link = build_link(&sample_product(None), &sample_settings(), evening);
        assert!(decode(&link).starts_with("Bonsoir NIASOTAC"));

        // Hours before noon, including late night, greet with Bonjour.
        let late = Utc.with_ymd_and_hms(2024, 6, 1, 1, 0, 0).unwrap();
        let link = build_link(&sample_product(None), &sample_settings(), late);
        assert!(decode(&link).starts_with("Bonjour NIASOTAC"));
    }

    #[test]
    fn uploaded_image_resolves_under_media() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let product = sample_product(Some("products/airpods.jpg"));
        let link = build_link(&product, &sample_settings(), now);
        assert!(decode(&link).contains("/media/products/airpods.jpg"));
    }
}
