use std::collections::HashSet;

use rand::{rngs::ThreadRng, Rng};

pub const ROW_ID_LENGTH: usize = 4;

// '0' and 'o' are too easily confused; ids never start with a digit
const FIRST_CHARS: &[u8] = b"abcdefghijklmnpqrstuvwxyz";
const OTHER_CHARS: &[u8] = b"abcdefghijklmnpqrstuvwxyz123456789";

pub fn is_valid_row_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == ROW_ID_LENGTH
        && FIRST_CHARS.contains(&bytes[0])
        && bytes[1..].iter().all(|b| OTHER_CHARS.contains(b))
}

// Legacy 9-column tables have digit-first ids
pub fn repair_row_id(id: &str) -> Option<String> {
    let mut chars = id.chars();
    let replacement = match chars.next()? {
        '1' => 'a',
        '2' => 't',
        '3' => 'c',
        '4' => 'd',
        '5' => 'f',
        '6' => 'g',
        '7' => 's',
        '8' => 'h',
        '9' => 'n',
        '0' => 'z',
        _ => return None,
    };
    Some(std::iter::once(replacement).chain(chars).collect())
}

/// Issues 4-character row ids that are unique for the lifetime of the generator.
///
/// One generator covers one conversion run. Ids that already exist (reused
/// from a previous table) are registered with `reserve` so they are never
/// issued again.
pub struct IdGenerator<R: Rng = ThreadRng> {
    rng: R,
    issued: HashSet<String>,
}

impl IdGenerator<ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for IdGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> IdGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            issued: HashSet::new(),
        }
    }

    // false if the id was already taken
    pub fn reserve(&mut self, id: &str) -> bool {
        self.issued.insert(id.to_owned())
    }

    pub fn is_issued(&self, id: &str) -> bool {
        self.issued.contains(id)
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }

    pub fn generate(&mut self) -> String {
        loop {
            let mut id = String::with_capacity(ROW_ID_LENGTH);
            id.push(self.pick(FIRST_CHARS));
            for _ in 1..ROW_ID_LENGTH {
                id.push(self.pick(OTHER_CHARS));
            }

            if self.issued.insert(id.clone()) {
                return id;
            }
        }
    }

    fn pick(&mut self, chars: &[u8]) -> char {
        chars[self.rng.gen_range(0..chars.len())] as char
    }
}
