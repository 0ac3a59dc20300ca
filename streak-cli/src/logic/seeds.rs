use anyhow::{Context, Result, bail, ensure};
use std::collections::HashSet;
use streak_engine::constants::DEFAULT_SEED;

/// Largest range a single `start..end` token may expand to.
const MAX_RANGE_SEEDS: u64 = 10_000;

/// Resolve CLI seed tokens into a deduplicated, ordered seed list.
///
/// Supports literal integers (negative values use their magnitude) and
/// half-open `start..end` ranges. An empty list falls back to the default
/// seed.
pub fn resolve_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Some((start, end)) = token.split_once("..") {
            pending.extend(expand_range(token, start, end)?);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|seed| seen.insert(*seed));

    if pending.is_empty() {
        pending.push(DEFAULT_SEED);
    }

    Ok(pending)
}

fn expand_range(token: &str, start: &str, end: &str) -> Result<Vec<u64>> {
    let start: u64 = start
        .trim()
        .parse()
        .with_context(|| format!("invalid range start in seed token: {token}"))?;
    let end: u64 = end
        .trim()
        .parse()
        .with_context(|| format!("invalid range end in seed token: {token}"))?;
    ensure!(start < end, "empty seed range: {token}");
    ensure!(
        end - start <= MAX_RANGE_SEEDS,
        "seed range {token} exceeds {MAX_RANGE_SEEDS} seeds"
    );
    Ok((start..end).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numeric_and_ranges_in_order() {
        let seeds = resolve_seeds(&tokens(&["42", "-7", "3..6", "4"])).unwrap();
        assert_eq!(seeds, vec![42, 7, 3, 4, 5]);
    }

    #[test]
    fn empty_input_uses_default_seed() {
        assert_eq!(resolve_seeds(&[]).unwrap(), vec![DEFAULT_SEED]);
        assert_eq!(resolve_seeds(&tokens(&[""])).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn rejects_bad_tokens() {
        assert!(resolve_seeds(&tokens(&["seven"])).is_err());
        assert!(resolve_seeds(&tokens(&["9..2"])).is_err());
        assert!(resolve_seeds(&tokens(&["0..99999"])).is_err());
        assert!(resolve_seeds(&tokens(&["a..b"])).is_err());
    }
}
