//! Strict fence-based extraction of corrected file bodies.
//!
//! Model responses are free-form: prose may surround the code. Only content
//! between the engine's opening marker (`` ```<tag> ``) and the first
//! following `` ``` `` is trusted. Extraction fails closed: no opening
//! marker, or no closing marker after it, yields nothing rather than a
//! guessed or partial result. When a response contains several fenced
//! blocks, only the first is taken.

/// Extract the content of the first fenced block tagged exactly `tag`.
///
/// The opening marker must end its line: `` ```py `` never matches a
/// `` ```python `` fence, whose tag merely shares the prefix. Returns `None`
/// when no exactly-tagged opening marker exists or the block it opens is
/// unterminated. The extracted body is trimmed of the whitespace that
/// surrounds the markers themselves; interior indentation is untouched.
///
/// # Examples
///
/// ```
/// use mender_engine::extract::extract_fenced;
///
/// let response = "Here is the fix:\n```fixed\nx = 1\n```\nHope that helps!";
/// assert_eq!(extract_fenced(response, "fixed").as_deref(), Some("x = 1"));
///
/// assert_eq!(extract_fenced("no fences here", "fixed"), None);
/// assert_eq!(extract_fenced("```fixedup\nx = 1\n```", "fixed"), None);
/// ```
pub fn extract_fenced(response: &str, tag: &str) -> Option<String> {
    let opening = format!("```{tag}");
    let mut haystack = response;
    loop {
        let start = haystack.find(&opening)?;
        let rest = &haystack[start + opening.len()..];
        let body = match rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) {
            Some(body) => body,
            None => {
                if rest.is_empty() {
                    // Opening marker at the end of the response: no body.
                    return None;
                }
                // A longer tag sharing the prefix; keep looking.
                haystack = rest;
                continue;
            }
        };
        let end = body.find("```")?;
        return Some(body[..end].trim().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_exact_block_content() {
        let response = "Sure, here's the corrected file:\n\n```fixed\nimport sys\n\ndef main():\n    pass\n```\n\nLet me know if you need more.";
        let extracted = extract_fenced(response, "fixed").unwrap();
        assert_eq!(extracted, "import sys\n\ndef main():\n    pass");
    }

    #[test]
    fn no_opening_marker_fails_closed() {
        let response = "```python\nprint('hi')\n```";
        assert_eq!(extract_fenced(response, "fixed"), None);
    }

    #[test]
    fn unterminated_block_fails_closed() {
        let response = "```fixed\nthe model ran out of tokens here";
        assert_eq!(extract_fenced(response, "fixed"), None);
    }

    #[test]
    fn multiple_blocks_take_the_first() {
        let response = "```fixed\nfirst\n```\nsome prose\n```fixed\nsecond\n```";
        assert_eq!(extract_fenced(response, "fixed").as_deref(), Some("first"));
    }

    #[test]
    fn tag_that_only_prefixes_another_fails_closed() {
        // "py" must not match a "python" fence and extract a garbled tail.
        let response = "```python\nprint('hi')\n```";
        assert_eq!(extract_fenced(response, "py"), None);
    }

    #[test]
    fn exact_tag_found_past_a_prefix_collision() {
        let response = "```fixedup\nnot this\n```\n```fixed\nthis one\n```";
        assert_eq!(
            extract_fenced(response, "fixed").as_deref(),
            Some("this one")
        );
    }

    #[test]
    fn opening_marker_must_end_its_line() {
        assert_eq!(extract_fenced("```fixed code\nx = 1\n```", "fixed"), None);
        assert_eq!(extract_fenced("```fixed", "fixed"), None);
    }

    #[test]
    fn crlf_after_marker_is_accepted() {
        let response = "```fixed\r\ncontent\r\n```";
        assert_eq!(extract_fenced(response, "fixed").as_deref(), Some("content"));
    }

    #[test]
    fn no_delimiter_text_leaks_into_result() {
        let response = "```fixed\ncontent\n```";
        let extracted = extract_fenced(response, "fixed").unwrap();
        assert!(!extracted.contains("```"));
        assert!(!extracted.contains("fixed"));
        assert_eq!(extracted, "content");
    }

    #[test]
    fn interior_indentation_preserved() {
        let response = "```fixed\nif x:\n    if y:\n        z()\n```";
        let extracted = extract_fenced(response, "fixed").unwrap();
        assert_eq!(extracted, "if x:\n    if y:\n        z()");
    }

    #[test]
    fn extraction_is_idempotent_on_well_formed_output() {
        let body = "a = 1\nb = 2";
        let response = format!("```fixed\n{body}\n```");
        assert_eq!(extract_fenced(&response, "fixed").as_deref(), Some(body));
        // Running again on the same input gives the same answer.
        assert_eq!(extract_fenced(&response, "fixed").as_deref(), Some(body));
    }

    #[test]
    fn empty_block_extracts_empty_string() {
        let response = "```fixed\n```";
        assert_eq!(extract_fenced(response, "fixed").as_deref(), Some(""));
    }
}
