//! Hardware semantic rules.
//!
//! Which semantics bind a value to a real output slot, and the allocator that
//! hands out fresh `TEXCOORD<n>` slots for values that have none.

/// The vertex position output. Valid out of the vertex stage, invalid as a
/// pixel-stage input.
pub const POSITION0: &str = "POSITION0";

const TEXCOORD: &str = "TEXCOORD";

fn has_numbered_prefix(semantic: &str, prefix: &str) -> bool {
    semantic
        .strip_prefix(prefix)
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// `COLOR0` … `COLOR9`.
#[must_use]
pub fn is_valid_pixel_output(semantic: &str) -> bool {
    semantic
        .strip_prefix("COLOR")
        .is_some_and(|digit| digit.len() == 1 && digit.as_bytes()[0].is_ascii_digit())
}

/// `COLOR<n>`, `POSITION<n>` or `TEXCOORD<n>`.
#[must_use]
pub fn is_valid_vertex_output(semantic: &str) -> bool {
    ["COLOR", "POSITION", TEXCOORD]
        .iter()
        .any(|prefix| has_numbered_prefix(semantic, prefix))
}

#[inline]
pub(crate) fn is_valid_pixel_output_opt(semantic: Option<&str>) -> bool {
    semantic.is_some_and(is_valid_pixel_output)
}

#[inline]
pub(crate) fn is_valid_vertex_output_opt(semantic: Option<&str>) -> bool {
    semantic.is_some_and(is_valid_vertex_output)
}

/// Hands out `TEXCOORD<n>` semantics for one build.
///
/// The counter only moves forward, so two allocations never return the same
/// slot, and each candidate is skipped while `is_taken` reports it in use.
#[derive(Debug, Default)]
pub struct SemanticAllocator {
    next_index: u32,
}

impl SemanticAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, is_taken: impl Fn(&str) -> bool) -> String {
        loop {
            let candidate = format!("{TEXCOORD}{}", self.next_index);
            self.next_index += 1;
            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_output_pattern() {
        assert!(is_valid_pixel_output("COLOR0"));
        assert!(is_valid_pixel_output("COLOR3"));
        assert!(!is_valid_pixel_output("COLOR10"));
        assert!(!is_valid_pixel_output("COLOR"));
        assert!(!is_valid_pixel_output("DEPTH0"));
        assert!(!is_valid_pixel_output("TEXCOORD0"));
    }

    #[test]
    fn vertex_output_pattern() {
        assert!(is_valid_vertex_output("POSITION0"));
        assert!(is_valid_vertex_output("TEXCOORD12"));
        assert!(is_valid_vertex_output("COLOR1"));
        assert!(!is_valid_vertex_output("NORMAL0"));
        assert!(!is_valid_vertex_output("TEXCOORD"));
        assert!(!is_valid_vertex_output("TEXCOORD1x"));
        assert!(!is_valid_vertex_output("xTEXCOORD1"));
    }

    #[test]
    fn allocator_skips_taken_slots() {
        let taken = ["TEXCOORD0", "TEXCOORD2"];
        let mut allocator = SemanticAllocator::new();
        let is_taken = |s: &str| taken.contains(&s);
        assert_eq!(allocator.allocate(is_taken), "TEXCOORD1");
        assert_eq!(allocator.allocate(is_taken), "TEXCOORD3");
        assert_eq!(allocator.allocate(is_taken), "TEXCOORD4");
    }
}
