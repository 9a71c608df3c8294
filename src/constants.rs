pub const API_KEY_ENV_NAME: &str = "OPENAI_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

pub const DEFAULT_MAX_TOKENS: u32 = 1000;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Upper bound of characters sent to the model for one company.
pub const DEFAULT_CONTENT_CHAR_LIMIT: usize = 12_000;

pub(crate) const USER_AGENT: &str = "sitemap-harvester bot";

pub(crate) const SYSTEM_PROMPT: &str = "You are a business analyst who creates concise company summaries. Focus on the company's main services, value propositions, and key offerings.";

pub(crate) const USER_PROMPT_PREFIX: &str =
    "Please create a concise summary of this company based on the following content: ";

pub(crate) const BLANK_LINES_COLLAPSER: &str = r"\n\s*\n(\s*\n)+";

pub(crate) const STATUS_CODE_MATCHER: &str = r"(?:^|\bstatus(?: code)?:?\s+)(\d{3})\b";
