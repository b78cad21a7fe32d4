//! Prompt templates.

/// System instruction for chat sessions.
pub const CHAT_SYSTEM_INSTRUCTION: &str = "You are WesAI Code Assistant, an AI pair programmer \
specializing in TypeScript and React. You help with follow-up questions about code reviews, \
refactoring, component explanations, code generation and general coding questions about these \
technologies. Answer in Markdown.";

/// Heading prepended to a streamed refactor turn.
pub const REFACTOR_RESULT_HEADING: &str = "## Refactoring Result:\n\n";

fn fenced(code: &str) -> String {
    format!("```typescript\n{code}\n```")
}

/// Prompt for a written code review.
pub fn review_prompt(code: &str) -> String {
    format!(
        "You are an expert code reviewer with deep knowledge of TypeScript and React.\n\
Review the following code in detail. Cover:\n\
- bugs and logic errors\n\
- clarity, readability and maintainability\n\
- performance, including React re-renders, memoization and hook usage\n\
- TypeScript and React conventions: component structure, state management, prop typing\n\
- security issues\n\n\
Write the feedback as Markdown with bullet or numbered lists. Show short illustrative \
snippets when suggesting changes, and do not repeat the code unless a suggestion needs it.\n\n\
Code to review:\n{}\n",
        fenced(code)
    )
}

/// Prompt for a streamed refactor with a summary followed by the code.
pub fn refactor_prompt(code: &str) -> String {
    format!(
        "You are an expert refactoring assistant for TypeScript and React.\n\
Refactor the following code for quality, readability, performance and maintainability using \
modern TypeScript and React practices.\n\n\
Structure the answer exactly like this:\n\n\
1. A short Markdown summary of the changes, starting with the heading\n   \
## Refactoring Summary:\n\n\
2. The complete refactored code in a single TypeScript code block, preceded by the heading\n   \
## Refactored Code:\n\n\
Add nothing after the closing fence of the code block.\n\n\
Code to refactor:\n{}\n",
        fenced(code)
    )
}

/// Prompt for a textual description of a component.
pub fn component_preview_prompt(code: &str) -> String {
    format!(
        "You are an expert in analyzing React and TypeScript components.\n\
Describe what the following component does. Use Markdown headings and bullet points for:\n\
- **Purpose**: the main job of the component\n\
- **Visual structure**: roughly what it looks like on a page\n\
- **Props**: the main props, their likely types and purpose\n\
- **State**: internal state and how it affects rendering\n\
- **Interactivity**: how a user interacts with it and what happens\n\n\
Component code:\n{}\n",
        fenced(code)
    )
}

/// Prompt for generating code from a description.
pub fn generate_code_prompt(description: &str) -> String {
    format!(
        "You are an expert code generation assistant.\n\
Generate clean, efficient and correct code for the description below. Use TypeScript or React \
syntax and conventions when the description calls for them.\n\
Return only the code, ideally in a single Markdown code block. Keep any explanation before the \
block very short and add none after it.\n\n\
Description:\n\"{description}\"\n\n\
Generated code:\n"
    )
}
