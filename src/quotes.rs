use std::path::Path;

use rand::{Rng, thread_rng};
use serde::Deserialize;

use crate::codec::CodecError;

#[derive(Debug, Clone, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub quote: String,
    #[serde(default)]
    pub author: String,
}

pub fn load_quotes(path: &Path) -> Result<Vec<Quote>, CodecError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(CodecError::Csv)?;

    let mut quotes = Vec::new();
    for row in reader.deserialize::<Quote>() {
        let row = row.map_err(CodecError::Csv)?;
        let quote = clean_quote_text(&row.quote);
        let author = row.author.trim().to_string();
        if quote.is_empty() || author.is_empty() {
            continue;
        }
        quotes.push(Quote { quote, author });
    }

    Ok(quotes)
}

pub fn pick_random(quotes: &[Quote]) -> Option<&Quote> {
    if quotes.is_empty() {
        return None;
    }
    quotes.get(thread_rng().gen_range(0..quotes.len()))
}

// Quote files in the wild carry mis-decoded Windows-1252 apostrophes and ellipses.
fn clean_quote_text(raw: &str) -> String {
    raw.replace("‚Äô", "'")
        .replace("‚Ä¶", "…")
        .trim()
        .to_string()
}
