//! Raw player-list handling for the setup form.

use rand::seq::SliceRandom;

/// Split a newline-separated list into trimmed, non-blank names
pub fn parse_player_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shuffle names in place to randomize seeding
pub fn shuffle_players(names: &mut [String]) {
    names.shuffle(&mut rand::rng());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_player_list() {
        let names = parse_player_list("Alice\n  Bob  \n\n\t\nCharlie\r\nDiana");
        assert_eq!(names, vec!["Alice", "Bob", "Charlie", "Diana"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_player_list("").is_empty());
        assert!(parse_player_list("\n \n").is_empty());
    }

    #[test]
    fn test_shuffle_keeps_names() {
        let mut names: Vec<String> = (0..32).map(|i| format!("player{i}")).collect();
        let mut original = names.clone();
        shuffle_players(&mut names);

        names.sort();
        original.sort();
        assert_eq!(names, original);
    }
}
