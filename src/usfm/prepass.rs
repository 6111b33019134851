use once_cell::sync::Lazy;
use regex::Regex;

// Rewrites USFM 3 word-alignment markup into plain USFM 2 text.
// Markers the tokenizer does not know are left alone; it reports them as `Other`.
pub fn normalize_usfm3(usfm: &str) -> String {
    static REGEX_ALIGNMENT_START: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\\zaln-s[^\\]*\\\*").unwrap());
    static REGEX_ALIGNMENT_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\zaln-e\\\*").unwrap());
    static REGEX_KEYTERM_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\k-s[^\\]*\\\*").unwrap());
    static REGEX_KEYTERM_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\k-e\\\*").unwrap());
    static REGEX_TRANSLATOR_SECTION: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\\ts(-s)?\s*\\\*").unwrap());

    // \w word|lemma="..." strong="..."\w*
    static REGEX_WORD_WITH_ATTRIBUTES: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\\\+?w ([^|\\]*)\|[^\\]*\\\+?w\*").unwrap());
    static REGEX_WORD: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\\\+?w ([^|\\]*)\\\+?w\*").unwrap());

    static REGEX_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());
    static REGEX_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n(\s*\n)*").unwrap());

    let usfm = usfm.replace('\u{00a0}', " ");

    let usfm = REGEX_ALIGNMENT_START.replace_all(&usfm, "");
    let usfm = REGEX_ALIGNMENT_END.replace_all(&usfm, "");
    let usfm = REGEX_KEYTERM_START.replace_all(&usfm, "");
    let usfm = REGEX_KEYTERM_END.replace_all(&usfm, "");
    let usfm = REGEX_TRANSLATOR_SECTION.replace_all(&usfm, "");
    let usfm = REGEX_WORD_WITH_ATTRIBUTES.replace_all(&usfm, "$1");
    let usfm = REGEX_WORD.replace_all(&usfm, "$1");
    let usfm = REGEX_SPACES.replace_all(&usfm, " ");
    let usfm = REGEX_BLANK_LINES.replace_all(&usfm, "\n");

    usfm.into_owned()
}
