// Instruction text for each analysis stage
//
// Templates use `{{placeholder}}` slots, filled in a single pass so that
// substituted text is never scanned for further placeholders.

use regex::{Captures, Regex};
use std::sync::OnceLock;

/// System role sent with every completion request
pub const SYSTEM_PROMPT: &str = "You are a research assistant that only responds with valid JSON. Never include markdown code fences, explanations, or any text outside the JSON object. Always return a complete, parseable JSON object.";

/// Most insights the sentiment stage may attribute to one competitor
pub const MAX_INSIGHTS_PER_COMPETITOR: usize = 3;

const MARKET_TEMPLATE: &str = r#"
Search the web thoroughly for existing products, tools, apps, websites, or services that match or compete with this idea. Look at Product Hunt, app stores, SaaS directories, and general web results.

Product Idea: "{{idea}}"

Return ONLY a valid JSON object with this exact structure:
{
  "exists": "fully_exists" | "mostly_exists" | "partially_exists" | "significant_gap" | "blue_ocean",
  "saturation_score": <integer 1-10, where 10 = fully saturated>,
  "competitors": [
    {
      "name": "Product Name",
      "url": "https://example.com",
      "description": "One sentence about what they do",
      "pricing": "Free / Freemium / Paid $X/mo / Enterprise",
      "founded": "Year or estimated",
      "strengths": ["strength1", "strength2"],
      "weaknesses": ["weakness1", "weakness2"]
    }
  ],
  "market_summary": "2-3 sentence summary of the competitive landscape",
  "key_differentiators_needed": ["What you would need to stand out"]
}

Include between 4 and 6 competitors. Do not output anything outside the JSON object."#;

const TECHNICAL_TEMPLATE: &str = r#"
Analyze the technical requirements for building this product. The developer's skill level is: {{skill_level}}.

Product: "{{idea}}"

Return ONLY a valid JSON object:
{
  "difficulty": "no_code" | "beginner" | "intermediate" | "advanced" | "expert",
  "difficulty_score": <integer 1-10>,
  "time_estimates": {
    "vibe_coder": "X-Y weeks with no-code/AI tools",
    "beginner": "X-Y months",
    "intermediate": "X-Y weeks",
    "senior_dev": "X-Y days"
  },
  "tech_stack": {
    "frontend": "Recommended frontend technology",
    "backend": "Recommended backend technology",
    "database": "Recommended database",
    "hosting": "Recommended hosting (e.g. Vercel, Railway, Fly.io)"
  },
  "required_apis": [
    { "name": "API Name", "purpose": "Why it's needed", "cost": "Free" | "Paid" | "Freemium", "url": "https://..." }
  ],
  "recommended_tools": [
    { "name": "Tool Name", "purpose": "What it helps with", "cost": "Free" | "Paid", "skill_level": "all" | "beginner" | "advanced" }
  ],
  "no_code_alternatives": [
    { "tool": "Bubble / Webflow / etc.", "coverage": "What percent of the idea this covers", "limitations": "What it cannot do" }
  ],
  "biggest_challenges": ["Challenge 1", "Challenge 2", "Challenge 3"],
  "technical_summary": "2-3 sentence technical overview for a {{skill_level}}"
}

Do not output anything outside the JSON object."#;

const OPPORTUNITY_TEMPLATE: &str = r#"
Evaluate the market opportunity for this product idea. Search for market size data, trends, investor activity, and revenue potential.

Product: "{{idea}}"

Return ONLY a valid JSON object:
{
  "opportunity_score": <integer 1-10>,
  "opportunity_grade": "A+" | "A" | "A-" | "B+" | "B" | "B-" | "C+" | "C" | "D",
  "opportunity_type": "niche_product" | "growing_market" | "mass_market" | "enterprise_b2b" | "consumer_app" | "developer_tool" | "marketplace" | "platform",
  "market_size": "Estimated TAM with source or reasoning",
  "trend": "rapidly_growing" | "growing" | "stable" | "declining" | "emerging",
  "trend_evidence": "Brief evidence or data point supporting trend",
  "monetization_strategies": [
    {
      "model": "SaaS Subscription / One-time Purchase / Freemium / Usage-based / Marketplace / Ads",
      "description": "How this would work in practice",
      "revenue_potential": "Low (<$10k MRR)" | "Medium ($10-100k MRR)" | "High (>$100k MRR)",
      "difficulty": "easy" | "medium" | "hard"
    }
  ],
  "target_audiences": [
    { "segment": "Audience description", "size": "Large" | "Medium" | "Niche", "willingness_to_pay": "High" | "Medium" | "Low" }
  ],
  "improvement_suggestions": [
    {
      "suggestion": "Specific feature, angle, or pivot to improve the idea",
      "reasoning": "Why this would increase value or reduce competition",
      "priority": "high" | "medium" | "low",
      "effort": "low" | "medium" | "high"
    }
  ],
  "opportunity_summary": "2-3 sentence executive summary of the opportunity"
}

Do not output anything outside the JSON object."#;

const DEPLOYMENT_TEMPLATE: &str = r#"
Determine the optimal deployment platform(s) for this product idea. Consider user behavior, monetization, discoverability, and technical tradeoffs.

Product: "{{idea}}"

Return ONLY a valid JSON object:
{
  "primary_recommendation": "web_app" | "mobile_ios" | "mobile_android" | "mobile_cross_platform" | "chrome_extension" | "shopify_app" | "wordpress_plugin" | "desktop_mac" | "desktop_windows" | "desktop_cross_platform" | "api_service" | "slack_app" | "vs_code_extension" | "notion_integration",
  "confidence_score": <integer 1-10>,
  "deployment_options": [
    {
      "platform": "Platform Name",
      "recommendation_level": "highly_recommended" | "recommended" | "possible" | "not_recommended",
      "pros": ["pro1", "pro2"],
      "cons": ["con1", "con2"],
      "build_complexity": "low" | "medium" | "high",
      "monetization_potential": "low" | "medium" | "high",
      "time_to_market": "Fast (1-4 weeks)" | "Medium (1-3 months)" | "Slow (3+ months)"
    }
  ],
  "go_to_market_strategy": "2-3 sentence GTM recommendation",
  "quick_win_approach": "The single fastest path to a usable v1",
  "reasoning": "Why the primary recommendation is best for this specific product"
}

Do not output anything outside the JSON object."#;

const SENTIMENT_TEMPLATE: &str = r#"
Search Reddit, Hacker News, product review sites, app store reviews, and community forums for what real people say about {{focus}}.

Product Idea: "{{idea}}"
{{competitor_guidance}}
Return ONLY a valid JSON object:
{
  "overall_sentiment": "positive" | "mixed" | "negative",
  "insights": [
    {
      "type": "pain_point" | "loved_feature" | "wish",
      "theme": "Short theme label, e.g. Pricing, Reliability, Onboarding",
      "insight": "One or two sentences paraphrasing what users said",
      "source": "Where it was said, e.g. r/productivity, Hacker News, App Store review",
      "source_url": "https://link-to-the-discussion",
      "competitor": {{competitor_field}}
    }
  ],
  "summary": "2-3 sentence summary of community sentiment and the opening it leaves"
}

Include between 6 and 9 insights covering all three types. Do not output anything outside the JSON object."#;

static SLOT: OnceLock<Regex> = OnceLock::new();

fn slot_pattern() -> &'static Regex {
    SLOT.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").unwrap())
}

/// Substitute `{{idea}}` and the named slots. Unknown slots are left as written.
fn fill(template: &str, idea: &str, slots: &[(&str, &str)]) -> String {
    slot_pattern()
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            if name == "idea" {
                return idea.to_string();
            }
            slots
                .iter()
                .find(|(slot, _)| *slot == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Competitive landscape: who already does this and how crowded it is
pub fn market_prompt(idea: &str) -> String {
    fill(MARKET_TEMPLATE, idea, &[])
}

/// Build difficulty, stack and time estimates tailored to the requester's skill level
pub fn technical_prompt(idea: &str, skill_level: &str) -> String {
    fill(TECHNICAL_TEMPLATE, idea, &[("skill_level", skill_level)])
}

/// Market size, trend, monetization and improvement suggestions
pub fn opportunity_prompt(idea: &str) -> String {
    fill(OPPORTUNITY_TEMPLATE, idea, &[])
}

/// Which platform to ship on first
pub fn deployment_prompt(idea: &str) -> String {
    fill(DEPLOYMENT_TEMPLATE, idea, &[])
}

/// Community pain points, loved features and wishes.
///
/// With known competitor names the search is steered toward discussions of
/// those products; with none it falls back to the general problem space.
pub fn sentiment_prompt(idea: &str, competitor_names: &[String]) -> String {
    if competitor_names.is_empty() {
        return fill(
            SENTIMENT_TEMPLATE,
            idea,
            &[
                ("focus", "the problem this idea solves and the tools people use for it today"),
                ("competitor_guidance", ""),
                (
                    "competitor_field",
                    "\"Name of the product being discussed, or null if the discussion is about the problem in general\"",
                ),
            ],
        );
    }

    let list = competitor_names
        .iter()
        .map(|name| format!("- {}", name))
        .collect::<Vec<_>>()
        .join("\n");
    let guidance = format!(
        "\nFocus on discussions about these existing products:\n{}\n\nPrefer reviews, complaints and feature requests that name one of them. Attribute no more than {} insights to any single product, and spread the rest across the others.\n",
        list, MAX_INSIGHTS_PER_COMPETITOR
    );

    fill(
        SENTIMENT_TEMPLATE,
        idea,
        &[
            ("focus", "the existing products in this space"),
            ("competitor_guidance", &guidance),
            (
                "competitor_field",
                "\"Exact name of the product from the list above that is being discussed\"",
            ),
        ],
    )
}
