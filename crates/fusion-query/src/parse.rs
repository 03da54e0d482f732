//! Splitting generator output into query variants.

use tracing::{debug, warn};

use fusion_core::{Delimiter, FusionError, Result};

/// Split raw generator output into at most `count` cleaned variants.
///
/// Fragments are trimmed and stripped of list markers (`1.`, `2)`, `-`, `*`,
/// `•`) and wrapping quotes; empty fragments are dropped. When the configured
/// delimiter does not split the output at all, a line split is tried as well
/// and the better of the two is kept. Fewer fragments than `count` are
/// otherwise accepted as produced.
///
/// Fails with [`FusionError::VariantGeneration`] on empty output and with
/// [`FusionError::Parse`] when non-empty output holds no usable variant.
pub fn parse_variants(output: &str, delimiter: &Delimiter, count: usize) -> Result<Vec<String>> {
    if output.trim().is_empty() {
        return Err(FusionError::variant_generation(
            "generator returned empty output",
        ));
    }

    let mut variants: Vec<String> = match delimiter.as_str() {
        None => clean_fragment(output).into_iter().collect(),
        Some(sep) => {
            let configured = split_clean(output, sep);
            if configured.len() <= 1 && count > 1 && sep != "\n" {
                let by_line = split_clean(output, "\n");
                if by_line.len() > configured.len() {
                    debug!(
                        "Delimiter {:?} gave {} variants, line split gave {}; using lines",
                        sep,
                        configured.len(),
                        by_line.len()
                    );
                    by_line
                } else {
                    configured
                }
            } else {
                configured
            }
        }
    };

    if variants.is_empty() {
        return Err(FusionError::parse(format!(
            "no usable variant in generator output {:?}",
            truncate_for_log(output)
        )));
    }

    if variants.len() > count {
        debug!(
            "Generator returned {} variants, keeping the first {}",
            variants.len(),
            count
        );
        variants.truncate(count);
    } else if variants.len() < count {
        warn!(
            "Requested {} variants but generator produced {}",
            count,
            variants.len()
        );
    }

    Ok(variants)
}

fn split_clean(output: &str, sep: &str) -> Vec<String> {
    output.split(sep).filter_map(clean_fragment).collect()
}

/// Trim one fragment and strip its list marker and quotes.
fn clean_fragment(fragment: &str) -> Option<String> {
    let text = strip_quotes(strip_list_marker(fragment.trim()).trim()).trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn strip_list_marker(text: &str) -> &str {
    for bullet in ['-', '*', '•'] {
        if let Some(rest) = text.strip_prefix(bullet) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return rest;
            }
        }
    }

    // "1." / "12)" followed by whitespace or nothing
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &text[digits..];
        if let Some(after) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if after.is_empty() || after.starts_with(char::is_whitespace) {
                return after;
            }
        }
    }

    text
}

fn strip_quotes(text: &str) -> &str {
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”')] {
        if text.len() >= open.len_utf8() + close.len_utf8() {
            if let Some(inner) = text
                .strip_prefix(open)
                .and_then(|rest| rest.strip_suffix(close))
            {
                return inner;
            }
        }
    }
    text
}

fn truncate_for_log(output: &str) -> String {
    const MAX: usize = 80;
    if output.chars().count() <= MAX {
        output.to_string()
    } else {
        let head: String = output.chars().take(MAX).collect();
        format!("{}...", head)
    }
}
