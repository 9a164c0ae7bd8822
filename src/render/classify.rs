//! Category tiles.
//!
//! Each pixel samples one identifier, formats it as its 12 decimal digits,
//! and asks a [`Classifier`] for a category. Rules are tried in table order
//! and the first match wins; the category index then picks a colour from a
//! fixed palette. Unmatched pixels stay black.

use image::{Rgb, RgbImage};

use crate::error::TileError;
use crate::space::TileAddress;

use super::table::{CountryTable, PublisherTable};

/// Something that assigns category indices to identifier digit strings.
pub trait Classifier {
    /// Category of `digits`, or `None` for background.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::MalformedIdentifier`] when a matching rule cannot
    /// interpret the digits.
    fn classify(&self, digits: &str) -> Result<Option<u64>, TileError>;
}

impl Classifier for CountryTable {
    fn classify(&self, digits: &str) -> Result<Option<u64>, TileError> {
        Ok(self
            .entries()
            .iter()
            .position(|entry| digits.starts_with(&entry.prefix))
            .map(|index| index as u64))
    }
}

impl Classifier for PublisherTable {
    fn classify(&self, digits: &str) -> Result<Option<u64>, TileError> {
        for entry in self.entries() {
            if entry.rules.is_empty() || !digits.starts_with(&entry.prefix) {
                continue;
            }

            // Digits between the prefix and the last digit.
            let end = digits.len().saturating_sub(1);
            let remainder = digits.get(entry.prefix.len()..end).unwrap_or("");
            let value: u64 = remainder
                .parse()
                .map_err(|_| TileError::MalformedIdentifier {
                    digits: digits.to_string(),
                    prefix: entry.prefix.clone(),
                })?;

            if let Some(rule_index) = entry.rules.iter().position(|r| r.matches(value)) {
                return Ok(Some(entry.first_category + rule_index as u64));
            }
        }
        Ok(None)
    }
}

/// Palette colour for category `index`.
pub fn category_color(index: u64) -> Rgb<u8> {
    let channel = |step: u64| ((index.wrapping_mul(step).wrapping_add(128)) % 256) as u8;
    Rgb([channel(55), channel(116), channel(221)])
}

/// Render the category tile at `address`.
pub fn render_categories<C>(classifier: &C, address: TileAddress) -> Result<RgbImage, TileError>
where
    C: Classifier + ?Sized,
{
    let lattice = address.category_region();
    let side = lattice.output_size as u32;
    let mut image = RgbImage::new(side, side);

    for i in 0..side {
        for j in 0..side {
            let digits = lattice.value_at(u64::from(i), u64::from(j)).to_string();
            if let Some(category) = classifier.classify(&digits)? {
                image.put_pixel(j, i, category_color(category));
            }
        }
    }

    Ok(image)
}
