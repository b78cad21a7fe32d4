//! Embedded-snippet extraction.
//!
//! Finds the first closed fenced code block tagged with one of a whitelist of
//! component languages (`tsx`, `jsx` by default) whose body looks like UI
//! component source, and returns the body verbatim.
//!
//! The plausibility check is a loose substring heuristic. It misses some real
//! components and accepts some non-component code; both are accepted
//! behaviour. A closing fence sequence inside the block body ends the block
//! early, there is no escaping.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{AssistError, Result};

/// Fence tags recognised when no whitelist is configured.
pub const DEFAULT_SNIPPET_TAGS: &[&str] = &["tsx", "jsx"];

lazy_static! {
    /// Structural signals of UI component code. One hit is enough.
    static ref COMPONENT_SIGNALS: Vec<Regex> = vec![
        // functional return: `return (`
        Regex::new(r"return\s*\(").expect("valid regex"),
        // props-style identifiers: `props`, `ButtonProps`
        Regex::new(r"\bprops\b|\b[A-Z][A-Za-z0-9_]*Props\b").expect("valid regex"),
        // state/effect hooks
        Regex::new(r"\buse(?:State|Effect)\b").expect("valid regex"),
        // inline arrow return: `=> (`
        Regex::new(r"=>\s*\(").expect("valid regex"),
        // named function containing a return-with-parenthesis
        Regex::new(r"(?s)function\s+[A-Za-z_$][A-Za-z0-9_$]*\s*\([^)]*\)\s*\{.*?return\s*\(")
            .expect("valid regex"),
    ];
}

/// Whether `code` carries at least one component signal.
pub fn looks_like_component(code: &str) -> bool {
    COMPONENT_SIGNALS.iter().any(|re| re.is_match(code))
}

/// Pure extractor over a configurable tag whitelist.
#[derive(Debug, Clone)]
pub struct SnippetExtractor {
    tags: Vec<String>,
    fence: Regex,
}

impl Default for SnippetExtractor {
    fn default() -> Self {
        // The default tags are plain identifiers, so the pattern always compiles.
        Self::new(DEFAULT_SNIPPET_TAGS.iter().copied()).expect("default snippet tags compile")
    }
}

impl SnippetExtractor {
    /// Build an extractor for the given fence tags.
    ///
    /// Returns `InvalidInput` when the whitelist is empty or only blank.
    pub fn new<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags: Vec<String> = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tags.is_empty() {
            return Err(AssistError::InvalidInput(
                "snippet tag whitelist must not be empty".to_string(),
            ));
        }

        let alternatives = tags
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        // opening fence with a whitelisted tag, body (lazy), optional newline, closing fence
        let pattern = format!(r"(?s)```(?:{alternatives})[ \t]*\r?\n(.*?)\r?\n?```");
        let fence = Regex::new(&pattern)
            .map_err(|e| AssistError::ConfigurationError(format!("invalid snippet tag: {e}")))?;

        Ok(Self { tags, fence })
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Return the body of the first closed, whitelisted, plausible block.
    pub fn extract(&self, text: &str) -> Option<String> {
        self.fence
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|body| body.as_str())
            .find(|body| looks_like_component(body))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_component_body_without_fences() {
        let ex = SnippetExtractor::default();
        let text = "```tsx\nfunction X(){ return (<div/>); }\n```";
        assert_eq!(
            ex.extract(text).as_deref(),
            Some("function X(){ return (<div/>); }")
        );
    }

    #[test]
    fn keeps_internal_whitespace() {
        let ex = SnippetExtractor::default();
        let text = "Here:\n```jsx\nconst A = () => (\n  <p>\n    hi\n  </p>\n);\n```\nDone.";
        assert_eq!(
            ex.extract(text).as_deref(),
            Some("const A = () => (\n  <p>\n    hi\n  </p>\n);")
        );
    }

    #[test]
    fn no_whitelisted_block_yields_none() {
        let ex = SnippetExtractor::default();
        assert_eq!(ex.extract("plain text"), None);
        assert_eq!(
            ex.extract("```python\ndef f():\n    return (1)\n```"),
            None
        );
    }

    #[test]
    fn unclosed_block_yields_none_until_closed() {
        let ex = SnippetExtractor::default();
        let partial = "```tsx\nfunction X(){ return (<div/>); }\n";
        assert_eq!(ex.extract(partial), None);
        let closed = format!("{partial}```");
        assert!(ex.extract(&closed).is_some());
    }

    #[test]
    fn block_without_signal_yields_none() {
        let ex = SnippetExtractor::default();
        assert_eq!(ex.extract("```tsx\nconst x: number = 1;\n```"), None);
    }

    #[test]
    fn first_plausible_block_wins() {
        let ex = SnippetExtractor::default();
        let text = "```tsx\nconst x = 1;\n```\n\n```tsx\nfunction A(props) { return null; }\n```\n\n```jsx\nconst B = () => (<b/>);\n```";
        assert_eq!(
            ex.extract(text).as_deref(),
            Some("function A(props) { return null; }")
        );
    }

    #[test]
    fn nested_fence_truncates_body() {
        let ex = SnippetExtractor::default();
        let text = "```tsx\nconst s = useState('```');\nmore\n```";
        assert_eq!(ex.extract(text).as_deref(), Some("const s = useState('"));
    }

    #[test]
    fn false_positive_is_preserved() {
        // Not a component, but matches the arrow-return signal.
        let ex = SnippetExtractor::default();
        let text = "```tsx\nconst sum = (a: number) => (a + 1);\n```";
        assert!(ex.extract(text).is_some());
    }

    #[test]
    fn extraction_is_idempotent() {
        let ex = SnippetExtractor::default();
        let text = "intro\n```tsx\nexport default function App() { const [a] = useState(0); return (<i>{a}</i>); }\n```";
        assert_eq!(ex.extract(text), ex.extract(text));
    }

    #[test]
    fn custom_whitelist() {
        let ex = SnippetExtractor::new(["vue"]).unwrap();
        assert_eq!(ex.tags(), ["vue".to_string()]);
        assert!(ex.extract("```vue\nconst C = () => (1)\n```").is_some());
        assert!(ex.extract("```tsx\nconst C = () => (1)\n```").is_none());
        assert!(SnippetExtractor::new(Vec::<String>::new()).is_err());
        assert!(SnippetExtractor::new(["  "]).is_err());
    }

    #[test]
    fn signals() {
        assert!(looks_like_component("function Card() {\n  return (\n <div/>)}"));
        assert!(looks_like_component("interface ButtonProps { label: string }"));
        assert!(looks_like_component("useEffect(() => {}, [])"));
        assert!(!looks_like_component("let total = items.length;"));
    }
}
