//! Language models offered by the chat backend and the review analysis prompt.

/// Language models the chat backend can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Model {
    /// OpenAI GPT-4o Mini
    #[default]
    Gpt4oMini,
    /// Google Gemini 2.5 Flash
    Gemini25Flash,
    /// DeepSeek R1
    DeepSeekR1,
}

impl Model {
    /// Returns a slice containing all model variants.
    pub fn all() -> &'static [Model] {
        &[Model::Gpt4oMini, Model::Gemini25Flash, Model::DeepSeekR1]
    }

    /// Identifier sent to the backend in the `model` field.
    pub fn id(&self) -> &'static str {
        match self {
            Model::Gpt4oMini => "gpt-4o-mini",
            Model::Gemini25Flash => "gemini-2.5-flash",
            Model::DeepSeekR1 => "deep-seek-r1",
        }
    }

    /// Returns a human-readable display name for the model.
    pub fn label(&self) -> &'static str {
        match self {
            Model::Gpt4oMini => "GPT-4o Mini",
            Model::Gemini25Flash => "Gemini 2.5 Flash",
            Model::DeepSeekR1 => "Deep Seek R1",
        }
    }

    pub fn provider(&self) -> &'static str {
        match self {
            Model::Gpt4oMini => "OpenAI",
            Model::Gemini25Flash => "Google",
            Model::DeepSeekR1 => "DeepSeek",
        }
    }

    /// Parses user input into a Model.
    ///
    /// Matching is case-insensitive and supports aliases:
    /// - "gpt-4o-mini" | "gpt" | "openai" -> Gpt4oMini
    /// - "gemini-2.5-flash" | "gemini" | "google" -> Gemini25Flash
    /// - "deep-seek-r1" | "deepseek-r1" | "deepseek" -> DeepSeekR1
    ///
    /// Returns `None` if the input doesn't match any model.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Model> {
        match s.to_lowercase().trim() {
            "gpt-4o-mini" | "gpt" | "openai" => Some(Model::Gpt4oMini),
            "gemini-2.5-flash" | "gemini" | "google" => Some(Model::Gemini25Flash),
            "deep-seek-r1" | "deepseek-r1" | "deepseek" => Some(Model::DeepSeekR1),
            _ => None,
        }
    }
}

/// Builds the review analysis prompt sent to the chat endpoint for `product`.
///
/// The requested section labels are the ones the response cleaner
/// recognizes as a structured answer.
pub fn analysis_prompt(product: &str, model: Model) -> String {
    format!(
        r#"You are an expert product review analyst for Tiki (Vietnamese e-commerce platform).

TASK: Provide a comprehensive, detailed analysis of customer reviews for "{product}".

INSTRUCTIONS:
1. Search the database for ALL reviews of "{product}" (product name can be in Vietnamese or English)
2. Carefully READ and ANALYZE every review - ratings, titles, content, sentiment
3. Extract deep insights and patterns from the data
4. Provide actionable information that helps customers make informed decisions

OUTPUT FORMAT (REQUIRED - Be detailed and specific):

**Product Overview:**
- Brief description of what customers are saying overall
- Average sentiment score and rating distribution

**Pros:**
- [Specific positive feature 1 with frequency/percentage if possible]
- [Specific positive feature 2 - mention how many customers praised this]
- [Specific positive feature 3 - include specific examples from reviews]
- [Add more if significant patterns found - aim for 5-7 points]

**Cons:**
- [Specific negative issue 1 with frequency/severity]
- [Specific negative issue 2 - mention impact on user experience]
- [Specific negative issue 3 - include specific complaints]
- [Add more if significant patterns found - aim for 4-6 points]

**Key Features Mentioned:**
- [Feature 1]: Customer feedback summary
- [Feature 2]: Customer feedback summary
- [Feature 3]: Customer feedback summary

**Customer Sentiment Analysis:**
- Overall satisfaction level (e.g., "85% highly satisfied")
- Main reasons for positive ratings
- Main reasons for negative ratings
- Who should buy this product?
- Who should avoid this product?

**Price & Value Assessment:**
- Is it worth the price according to customers?
- Price-to-performance ratio insights

**Common Use Cases:**
- How customers are using this product
- Performance in different scenarios

IMPORTANT RULES:
- Focus ONLY on product: "{product}"
- Be SPECIFIC with numbers, percentages, frequencies when possible
- Quote actual customer phrases where relevant (translated to English if needed)
- DO NOT show SQL queries, JSON data, or technical analysis
- DO NOT show raw review text - only summarized insights
- Provide actionable insights that help decision-making
- If limited reviews, be transparent about sample size
- If no reviews found, say: "No reviews available for this product"

Model: {model}"#,
        product = product,
        model = model.id(),
    )
}
