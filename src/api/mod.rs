//! Endpoint functions for the review backend
//!
//! Each function names a path and payload and hands the call to the shared
//! [`Dispatcher`]. Failures are logged here and returned unchanged.

pub mod endpoints;

use serde::Serialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::client::{ApiError, Dispatcher, RequestOptions};
use crate::models::{analysis_prompt, Model};
use crate::normalize;

/// A chat message in the shape the backend expects
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Body of a `/chat` request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
}

impl ChatRequest {
    /// A single user question for `model`
    pub fn question(question: &str, model: Model) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: question.to_string(),
            }],
            model: model.id().to_string(),
        }
    }
}

/// The parts of a chat response the client shows
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    /// Answer text; cleaned when produced by [`ReviewApi::ask_product`]
    pub text: String,
    /// Product details, when the backend identified one
    pub product: Option<Value>,
    /// Model that produced the answer
    pub model: Model,
}

impl ChatReply {
    /// Extracts the answer from a raw chat response.
    ///
    /// The text is the first non-empty string among `answer`, `content` and
    /// `text`, or empty when none is present.
    pub fn from_response(response: &Value, model: Model) -> Self {
        let text = ["answer", "content", "text"]
            .iter()
            .filter_map(|field| response.get(*field).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();

        let product = response.get("product").filter(|p| !p.is_null()).cloned();

        Self {
            text,
            product,
            model,
        }
    }
}

/// Client for every backend endpoint, sharing one dispatcher
#[derive(Clone)]
pub struct ReviewApi {
    dispatcher: Dispatcher,
    chat_cache: bool,
}

impl ReviewApi {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            chat_cache: true,
        }
    }

    /// Sets whether chat requests are cached when the caller doesn't say
    pub fn chat_cache(mut self, enabled: bool) -> Self {
        self.chat_cache = enabled;
        self
    }

    /// Asks the chatbot a question and returns its raw response.
    ///
    /// Caching defaults to on unless `use_cache` says otherwise.
    pub async fn ask_chatbot(
        &self,
        question: &str,
        model: Model,
        signal: Option<CancellationToken>,
        use_cache: Option<bool>,
    ) -> Result<Value, ApiError> {
        let request = ChatRequest::question(question, model);
        debug!(model = model.id(), "sending to /chat");

        let mut options = RequestOptions::post()
            .json(&request)?
            .use_cache(use_cache.unwrap_or(self.chat_cache));
        if let Some(signal) = signal {
            options = options.signal(signal);
        }

        self.dispatcher
            .dispatch(endpoints::CHAT, options)
            .await
            .inspect_err(|e| {
                error!(error = %e, model = model.id(), "Failed to get chatbot response");
            })
    }

    /// Asks for a review analysis of `product` and returns the cleaned reply
    pub async fn ask_product(
        &self,
        product: &str,
        model: Model,
        signal: Option<CancellationToken>,
    ) -> Result<ChatReply, ApiError> {
        let prompt = analysis_prompt(product, model);
        let response = self.ask_chatbot(&prompt, model, signal, None).await?;

        let mut reply = ChatReply::from_response(&response, model);
        debug!(raw = %reply.text, "answer before cleaning");
        reply.text = normalize::clean(Some(&reply.text));
        Ok(reply)
    }

    pub async fn query_backend(&self, query: &str) -> Result<Value, ApiError> {
        self.post(endpoints::QUERY, &json!({ "query": query }), "Failed to query backend")
            .await
    }

    pub async fn get_health_data(&self, user_id: &str) -> Result<Value, ApiError> {
        self.get(&endpoints::health_data(user_id), "Health data check failed")
            .await
    }

    pub async fn get_db_structure(&self) -> Result<Value, ApiError> {
        self.call(
            endpoints::DB_STRUCTURE,
            RequestOptions::post(),
            "Failed to get DB structure",
        )
        .await
    }

    /// Lists reviews filtered by the given query parameters
    pub async fn get_product_reviews(&self, params: &[(String, String)]) -> Result<Value, ApiError> {
        self.get(&endpoints::reviews(params), "Failed to fetch product reviews")
            .await
    }

    pub async fn create_review<T: Serialize>(&self, review: &T) -> Result<Value, ApiError> {
        self.post(endpoints::REVIEWS, review, "Failed to create review")
            .await
    }

    pub async fn scrape_tiki_product<T: Serialize>(&self, product: &T) -> Result<Value, ApiError> {
        self.post(endpoints::SCRAPE_TIKI, product, "Failed to scrape Tiki product")
            .await
    }

    pub async fn scrape_tiki_category<T: Serialize>(&self, category: &T) -> Result<Value, ApiError> {
        self.post(
            endpoints::SCRAPE_TIKI_CATEGORY,
            category,
            "Failed to scrape Tiki category",
        )
        .await
    }

    pub async fn scrape_tiki_electronics<T: Serialize>(
        &self,
        electronics: &T,
    ) -> Result<Value, ApiError> {
        self.post(
            endpoints::SCRAPE_TIKI_ELECTRONICS,
            electronics,
            "Failed to scrape Tiki electronics",
        )
        .await
    }

    pub async fn get_electronics_categories(&self) -> Result<Value, ApiError> {
        self.get(
            endpoints::ELECTRONICS_CATEGORIES,
            "Failed to get electronics categories",
        )
        .await
    }

    /// Scrapes a product by name
    #[deprecated(note = "use `scrape_tiki_product` instead")]
    pub async fn scrape_product(&self, product_name: &str) -> Result<Value, ApiError> {
        warn!("scrape_product is deprecated, use scrape_tiki_product instead");
        self.post(
            endpoints::SCRAPE_TIKI,
            &json!({ "product_name": product_name }),
            "Failed to scrape product",
        )
        .await
    }

    /// Translates a natural-language question to SQL and runs it
    pub async fn query_with_nl_to_sql(&self, query: &str) -> Result<Value, ApiError> {
        self.post(
            endpoints::TEXT_TO_SQL,
            &json!({ "query": query }),
            "Failed to process NL to SQL query",
        )
        .await
    }

    pub async fn check_health(&self) -> Result<Value, ApiError> {
        self.get(endpoints::HEALTH, "Health check failed").await
    }

    async fn get(&self, endpoint: &str, failure: &str) -> Result<Value, ApiError> {
        self.call(endpoint, RequestOptions::new(), failure).await
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
        failure: &str,
    ) -> Result<Value, ApiError> {
        let options = RequestOptions::post().json(body)?;
        self.call(endpoint, options, failure).await
    }

    async fn call(
        &self,
        endpoint: &str,
        options: RequestOptions,
        failure: &str,
    ) -> Result<Value, ApiError> {
        self.dispatcher
            .dispatch(endpoint, options)
            .await
            .inspect_err(|e| error!(endpoint, error = %e, "{}", failure))
    }
}
