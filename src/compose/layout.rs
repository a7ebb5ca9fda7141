// src/compose/layout.rs
//! Pure text-layout math for the post template. Width is computed under a
//! per-character letter-spacing model and the body block is anchored to the
//! divider rule from below, so short summaries sit flush against it and
//! longer ones grow upward.

/// Horizontal advance source. The compositor backs this with real font
/// metrics; tests use a fixed advance table.
pub trait GlyphAdvance {
    fn advance(&self, c: char) -> f32;
}

/// Cumulative width of `text` with `spacing` applied between consecutive
/// glyphs: `sum(advance(c) + spacing) - spacing`. The trailing delta after
/// the last glyph is excluded; spacing may be negative.
pub fn text_width<M: GlyphAdvance>(metrics: &M, spacing: f32, text: &str) -> f32 {
    let mut width = 0.0;
    let mut glyphs = 0usize;
    for c in text.chars() {
        width += metrics.advance(c) + spacing;
        glyphs += 1;
    }
    if glyphs > 0 {
        width -= spacing;
    }
    width.max(0.0)
}

/// Greedy word wrap against a pixel budget. Explicit newlines in `text`
/// force breaks; a word that alone exceeds the budget is placed on its own
/// line rather than split.
pub fn wrap_text<M: GlyphAdvance>(
    metrics: &M,
    spacing: f32,
    max_width: f32,
    text: &str,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(metrics, spacing, &candidate) <= max_width {
                current = candidate;
            } else {
                if !current.is_empty() {
                    lines.push(current);
                }
                current = word.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Vertical origin of a bottom-anchored block:
/// `start_y = bottom_anchor - line_count * line_height`.
pub fn block_start_y(bottom_anchor: i32, line_count: usize, line_height: i32) -> i32 {
    bottom_anchor - line_count as i32 * line_height
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every glyph 10px wide.
    struct Fixed;
    impl GlyphAdvance for Fixed {
        fn advance(&self, _c: char) -> f32 {
            10.0
        }
    }

    #[test]
    fn width_excludes_trailing_delta() {
        // 3 glyphs, delta 2: 3*10 + 2*2 = 34
        assert_eq!(text_width(&Fixed, 2.0, "abc"), 34.0);
        // negative delta tightens
        assert_eq!(text_width(&Fixed, -1.0, "abc"), 28.0);
        assert_eq!(text_width(&Fixed, 2.0, ""), 0.0);
        assert_eq!(text_width(&Fixed, 2.0, "a"), 10.0);
    }

    #[test]
    fn no_wrapped_line_exceeds_the_budget_unless_single_word() {
        let text = "aa bbb c ddddd ee ffff g hh iiii jj";
        let budget = 100.0;
        for line in wrap_text(&Fixed, 2.0, budget, text) {
            let words = line.split_whitespace().count();
            assert!(
                text_width(&Fixed, 2.0, &line) <= budget || words == 1,
                "line {line:?} over budget"
            );
        }
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        // "aaaaaaaaaaaa" is 12 glyphs = 142px with delta 2, budget 100
        let lines = wrap_text(&Fixed, 2.0, 100.0, "bb aaaaaaaaaaaa cc");
        assert_eq!(lines, vec!["bb", "aaaaaaaaaaaa", "cc"]);
    }

    #[test]
    fn explicit_newlines_force_breaks() {
        let lines = wrap_text(&Fixed, 0.0, 1000.0, "one two\nthree");
        assert_eq!(lines, vec!["one two", "three"]);
    }

    #[test]
    fn greedy_packing_fills_lines() {
        // budget fits exactly "aa bb" (5 glyphs incl. space = 50px)
        let lines = wrap_text(&Fixed, 0.0, 50.0, "aa bb cc");
        assert_eq!(lines, vec!["aa bb", "cc"]);
    }

    #[test]
    fn block_is_anchored_to_the_bottom() {
        let anchor = 830;
        let lh = 55;
        for n in 1..=3usize {
            let y = block_start_y(anchor, n, lh);
            assert_eq!(y + n as i32 * lh, anchor);
        }
        assert!(block_start_y(anchor, 2, lh) < block_start_y(anchor, 1, lh));
        assert!(block_start_y(anchor, 3, lh) < block_start_y(anchor, 2, lh));
    }
}
