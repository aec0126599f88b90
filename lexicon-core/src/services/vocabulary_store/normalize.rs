const STRIPPED: [char; 9] = ['“', '”', '’', '‘', '…', '"', '\'', '(', ')'];

/// Folds a term into the form used for identity: lowercase, single spaces,
/// no quotes or parentheses.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .chars()
        .filter(|c| !STRIPPED.contains(c))
        .flat_map(char::to_lowercase)
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
