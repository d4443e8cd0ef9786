//! Fixed prompt template for the summarization step.

use serde_json::{Value, json};

use crate::core::models::User;

pub const ANTHROPIC_VERSION: &str = "bedrock-2023-05-31";
pub const MAX_TOKENS: u32 = 4096;
pub const TEMPERATURE: f64 = 0.5;
pub const TOP_P: f64 = 0.9;

/// Upper bound on email content sent to the model, in estimated tokens.
pub const MAX_EMAIL_TOKENS: usize = 150_000;

const SONNET_MODEL_ID: &str = "us.anthropic.claude-3-5-sonnet-20241022-v2:0";
const HAIKU_MODEL_ID: &str = "us.anthropic.claude-3-5-haiku-20241022-v1:0";

const SUMMARIZER_SYSTEM_PROMPT: &str = r#"You are an expert email summarizer. Your task is to summarize and extract key information from the email, consider names, places, amounts and other important details. Always include tags relevent to the email content. Your output MUST be in the following JSON format without any text or comments before or after the JSON:

  {
    "from": "The person who sent the email",
    "firstMessageFromAgent": "Your first message to the user, considering the user context.",
    "systemPrompt": "The system prompt that will be passed to the voice agent, it should include your specific take on the content of the email, considering your experience and the user context along with all the information about the host and the user.",
    "summarizedEmail": "A detailed summarization of the email content, highlighting the most important parts and key points.",
    "type": "email",
    "tags": ["List of tags to categorize the email"],
    "links": ["List of links to relevant information in the email"]
  }
  "#;

/// Maps a product model alias to a Bedrock inference profile id.
#[must_use]
pub fn resolve_model_id(alias: &str) -> &'static str {
    match alias {
        "am-1" => SONNET_MODEL_ID,
        _ => HAIKU_MODEL_ID,
    }
}

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

/// Removes control characters (newlines and tabs survive) and truncates to
/// the model budget.
#[must_use]
pub fn sanitize_email_content(raw: &str) -> String {
    let max_chars = MAX_EMAIL_TOKENS * 4;
    raw.chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .take(max_chars)
        .collect()
}

/// The user-turn text: instructions, the email, the sender and the owner's
/// context.
#[must_use]
pub fn build_user_message(email_content: &str, sent_from: &str, owner: Option<&User>) -> String {
    let user_name = owner.map(|u| u.name.as_str()).unwrap_or_default();
    let user_context = owner.map(|u| u.context.as_str()).unwrap_or_default();
    let email_content = sanitize_email_content(email_content);

    format!(
        r#"
<instructions>
- An email was sent from {sent_from} to you ({user_name})
- Think step by step and fully understand the email content as you will be discussing it with the user.
- Create a detailed summarization and highlight the most important parts of the email, ensuring all names and key points are extracted.
- Add your own thoughts and reasoning to the summarization, ensuring it is tailored to the user context.
- The end consumer of your summarization is the user defined in the <user_context> so ensure its tailored to that user context.
- If the email contains any links, extract them and add them to the links array.
</instructions>

<email_content>
{email_content}
</email_content>

<sent_from_email>
The email was sent from: {sent_from} (Attempt to extract the name of the sender from the email address - if you can't, just use the email address). Format this as "First Name Last Name" or just "First Name" without the email address.
</sent_from_email>

<user_context>
First name: {user_name}
Context: {user_context}
</user_context>


You will be creating a JSON response that will be used by a voice agent to discuss the email content with the user ({user_name}). You will start the conversation with the user so you should generate a first message to the user mention that you just got an email from <sent_from_email>, you would then ask if they want to discuss the email. The system prompt will be what the voice agent uses as its system prompt so ensure it contains all important information about the email.

Your response MUST be in the following JSON format without any text or comments before or after the JSON:

{{
  "from": "Who the email is from, as a simple name string",
  "type": "email",
  "firstMessageFromAgent": "Your first message to the user, considering the user context.",
  "systemPrompt": "You ({user_name}) just recevied this email from {sent_from}. You are now talking with the user ({user_name}) and giving them an overview of the email that you received, its key to remember that {user_name} did not receive the email, you did. You are a voice agent that will be talking to the user and giving them a summary of the email that you received. This system prompt is the system prompt that will be passed to the voice agent, it should include your specific take and insights on the content of the email, considering your experience and the user context.",
  "summarizedEmail": "A detailed summarization of the email content.",
  "tags": ["List of tags to categorize the email"],
  "links": ["List of links to relevant information in the email"]
}}
"#
    )
}

/// Full `InvokeModel` body in the Anthropic messages format.
#[must_use]
pub fn build_summary_request(email_content: &str, sent_from: &str, owner: Option<&User>) -> Value {
    json!({
        "anthropic_version": ANTHROPIC_VERSION,
        "max_tokens": MAX_TOKENS,
        "temperature": TEMPERATURE,
        "top_p": TOP_P,
        "system": SUMMARIZER_SYSTEM_PROMPT,
        "messages": [
            {
                "role": "user",
                "content": [
                    {
                        "type": "text",
                        "text": build_user_message(email_content, sent_from, owner),
                    }
                ]
            }
        ]
    })
}
