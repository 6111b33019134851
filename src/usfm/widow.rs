use once_cell::sync::Lazy;
use regex::Regex;

// Verse markers left alone on a line ("widows") that repeat a neighbouring verse.
// They are typical of USFM exported after merging verses into a range.
pub fn remove_duplicate_verses(usfm: &str) -> Option<String> {
    static REGEX_VERSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\\v ([0-9]{1,3})").unwrap());
    static REGEX_VERSE_RANGE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\\v ([0-9]{1,3})-([0-9]{1,3})\s").unwrap());
    static REGEX_WIDOW: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\\v [0-9]{1,3}) *$").unwrap());

    let lines: Vec<&str> = usfm.split_inclusive('\n').collect();

    let mut output = String::with_capacity(usfm.len());
    let mut changed = false;
    let mut range = (0, 0);

    for (i, &line) in lines.iter().enumerate() {
        // The last line is always kept
        let Some(&lookahead) = lines.get(i + 1) else {
            output.push_str(line);
            break;
        };

        let mut keep = true;

        if let Some(verse) = REGEX_VERSE.captures(line) {
            let verse: u32 = verse[1].parse().unwrap_or(0);

            if let Some(verse_range) = REGEX_VERSE_RANGE.captures(line) {
                range = (
                    verse_range[1].parse().unwrap_or(0),
                    verse_range[2].parse().unwrap_or(0),
                );
            } else {
                let content = line.trim_end_matches(['\n', '\r']);
                if let Some(widow) = REGEX_WIDOW.captures(content) {
                    let marker = &widow[1];
                    let same_verse_follows = lookahead
                        .strip_prefix(marker)
                        .map_or(false, |rest| !rest.starts_with(|c: char| c.is_ascii_digit()));

                    if same_verse_follows || (range.0..=range.1).contains(&verse) {
                        keep = false;
                    }
                }
                range = (verse, verse);
            }
        }

        if keep {
            output.push_str(line);
        } else {
            changed = true;
        }
    }

    changed.then_some(output)
}
