//! Prompt assembly for support answers
//!
//! Builds the grounded prompt sent to the language model from retrieved
//! document contents and the customer's question.

/// Template for grounded support answers
///
/// `{context}` and `{query}` are filled per request; the trailing
/// "Answer:" cue marks where the model continues.
pub const SUPPORT_TEMPLATE: &str = concat!(
    "You are a helpful Shoplite customer support assistant. ",
    "Answer the customer's question based on the provided context. ",
    "Be friendly, professional, and helpful.\n\n",
    "Context: {context}\n\n",
    "Customer Question: {query}\n\n",
    "Answer:"
);

/// Join retrieved document contents into the context block
pub fn build_context(contents: &[&str]) -> String {
    contents.join("\n")
}

/// Fill the template with context and question
pub fn render_prompt(context: &str, query: &str) -> String {
    SUPPORT_TEMPLATE
        .replace("{context}", context)
        .replace("{query}", query)
}
