//! Keyword tables driving tag, opportunity, stack, and env-var heuristics.
//!
//! Single-word keywords match whole words (a trailing `s` is tolerated);
//! keywords containing a space match as substrings of the lowercased text.

/// Keyword groups mapped to a tag of the fixed vocabulary.
pub const TAG_RULES: &[(&[&str], &str)] = &[
    (&["github", "gitlab", "git", "pull request", "commit", "code review"], "devtools"),
    (&["llm", "agent", "prompt", "memory", "embedding", "openai", "claude"], "ai"),
    (&["pdf", "docx", "excel", "spreadsheet", "markdown", "document"], "documents"),
    (&["notion", "obsidian", "note", "calendar", "todo", "task", "reminder"], "productivity"),
    (&["browser", "scrape", "crawl", "web search", "website", "rss"], "web"),
    (&["slack", "discord", "telegram", "email", "whatsapp", "sms"], "messaging"),
    (&["image", "video", "audio", "music", "photo", "tts", "speech"], "media"),
    (&["stock", "crypto", "finance", "trading", "invoice", "price"], "finance"),
    (&["docker", "kubernetes", "deploy", "server", "aws", "cloud", "ssh"], "infra"),
    (&["database", "sql", "postgres", "analytics", "dashboard", "csv"], "data"),
    (&["weather", "travel", "flight", "recipe", "fitness", "map"], "lifestyle"),
];

/// Tag -> report suggestion. Tags outside this table contribute nothing.
pub const OPPORTUNITY_RULES: &[(&str, &str)] = &[
    ("devtools", "Automate repo chores from CI or chat"),
    ("ai", "Compose with agent memory for richer automations"),
    ("documents", "Bundle into a document-processing workflow"),
    ("productivity", "Feed into the daily briefing for follow-ups"),
    ("web", "Schedule research and monitoring digests"),
    ("messaging", "Route alerts through existing chat channels"),
    ("media", "Offer as a content-creation add-on"),
    ("finance", "Build watchlist alerts on top of it"),
    ("infra", "Hook into ops runbooks for self-service"),
    ("data", "Push results into a reporting dashboard"),
    ("lifestyle", "Add a card to the morning briefing"),
    ("automation", "Chain with cron jobs for hands-off runs"),
    ("search", "Schedule research and monitoring digests"),
];

/// Generic suggestions used, in order, when rules yield fewer than three.
pub const FILLER_OPPORTUNITIES: &[&str] = &[
    "Evaluate fit for an existing workflow",
    "Watch adoption before investing time",
    "Check overlap with installed skills",
];

/// Technology keyword -> stack label.
pub const STACK_KEYWORDS: &[(&str, &str)] = &[
    ("node", "node"),
    ("nodejs", "node"),
    ("npm", "node"),
    ("npx", "node"),
    ("python", "python"),
    ("python3", "python"),
    ("pip", "python"),
    ("uv", "python"),
    ("deno", "deno"),
    ("bun", "bun"),
    ("rust", "rust"),
    ("cargo", "rust"),
    ("docker", "docker"),
    ("ffmpeg", "ffmpeg"),
    ("curl", "curl"),
    ("jq", "jq"),
    ("playwright", "playwright"),
    ("puppeteer", "puppeteer"),
    ("chromium", "chromium"),
    ("sqlite", "sqlite"),
];

/// Upper-case tokens that look like env vars but are formats or protocols.
pub const ENV_EXCLUDE: &[&str] = &[
    "API", "AND", "ASCII", "AWS", "CLI", "CSS", "CSV", "DELETE", "FAQ", "GET", "GPT", "HTML",
    "HTTP", "HTTPS", "IMPORTANT", "JSON", "JWT", "LLM", "MCP", "MIT", "NOT", "NOTE", "OAUTH",
    "PATCH", "PDF", "POST", "PUT", "README", "REST", "SDK", "SKILL", "SQL", "SSH", "TLS", "TODO",
    "TTS", "URI", "URL", "USD", "UTC", "UTF", "UTF_8", "UUID", "WARNING", "XML", "YAML",
];

/// Phrase that marks a skill as usable without credentials.
pub const NO_KEY_PHRASE: &str = "no api key required";

/// Lowercased words of `text`, splitting on anything but letters and digits.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Whether lowercased `text` (with `text_words` its words) mentions `keyword`.
pub fn mentions(text: &str, text_words: &[String], keyword: &str) -> bool {
    if keyword.contains(' ') {
        return text.contains(keyword);
    }
    text_words
        .iter()
        .any(|w| w == keyword || w.strip_suffix('s') == Some(keyword))
}
