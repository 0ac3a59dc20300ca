use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

pub fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" lukewarm, ,normal,  truly_streaky ");
        assert_eq!(parts, vec!["lukewarm", "normal", "truly_streaky"]);
    }

    #[test]
    fn read_input_reports_missing_path() {
        let missing = std::env::temp_dir().join("streak-cli-missing-input.json");
        let err = read_input(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }
}
