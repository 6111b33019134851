pub mod fs;
pub mod text;

// Only ASCII digits; "+3" and " 3" are rejected unlike str::parse
pub fn parse_number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
