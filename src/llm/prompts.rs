//! Prompt templates.

/// Asks the model for alternative phrasings of a question, one per line.
pub const QUERY_VARIANTS_TEMPLATE: &str = "You are an AI language model assistant. Your task is to generate five
different versions of the given user question to retrieve relevant documents from a vector
database. By generating multiple perspectives on the user question, your goal is to help
the user overcome some of the limitations of the distance-based similarity search.
Provide these alternative questions separated by newlines. Original question: {question}";

/// Grounded explanation prompt.
pub const EXPLANATION_TEMPLATE: &str = "You are a teaching assistant tasked with answering questions based ONLY on the provided context.
Generate a clear and concise explanation about: {topic}

Relevant Context: {context}

INSTRUCTIONS:
1. Answer ONLY using information from the context above
2. Explain the concept in a structured way, highlighting key points
3. Use simple, clear language that's easy to understand
4. If the context doesn't have relevant information, say \"I couldn't find any relevant information about this topic in the given knowledge base.\"
5. Do not make up information not present in the context
6. Keep your explanation focused and to the point

Your response:
";

/// Returned without calling the model when retrieval finds nothing.
pub const NO_INFORMATION_ANSWER: &str =
    "I couldn't find any relevant information about this topic in the given knowledge base.";

pub fn query_variants_prompt(question: &str) -> String {
    QUERY_VARIANTS_TEMPLATE.replace("{question}", question)
}

/// Placeholders are filled in one pass so a `{context}` inside the topic stays literal.
pub fn explanation_prompt(topic: &str, context: &str) -> String {
    let (head, tail) = EXPLANATION_TEMPLATE
        .split_once("{context}")
        .unwrap_or((EXPLANATION_TEMPLATE, ""));
    format!("{}{context}{tail}", head.replace("{topic}", topic))
}
