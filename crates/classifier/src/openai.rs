//! OpenAI-compatible chat-completions client behind the `Classifier`
//! capability trait. Calls are bounded by the configured timeout and
//! retried a configured number of times; callers treat every failure as
//! degradable.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use cartwise_core::config::ClassifierConfig;
use cartwise_core::{Classifier, ClassifierError, ClassifierRecommendation, ListItemId, ProductDescriptor};

const CATEGORIES: &[&str] = &[
    "Meat and Poultry",
    "Seafood",
    "Produce",
    "Appetizers/Snacks",
    "Dairy and Cheese",
    "Bakery",
    "Grains and Staples",
    "Canned and Jarred Goods",
    "Condiments",
    "Beverages",
    "Frozen Foods",
    "Cooking Essentials (oil, lard, fats)",
    "Disposable Items",
    "Kitchen Tools and Utensils",
    "Coffee varieties",
];

pub struct OpenAiClassifier {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl OpenAiClassifier {
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let api_key = config
            .api_key
            .as_ref()
            .map(|key| key.expose_secret().to_string())
            .filter(|key| !key.trim().is_empty())
            .ok_or(ClassifierError::Disabled)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ClassifierError::Http(error.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, ClassifierError> {
        let mut attempt = 0;
        loop {
            match self.chat_once(system, user).await {
                Ok(content) => return Ok(content),
                Err(error) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %error, "classifier call failed; retrying");
                    tokio::time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn chat_once(&self, system: &str, user: &str) -> Result<String, ClassifierError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system.to_string() },
                ChatMessage { role: "user", content: user.to_string() },
            ],
            temperature: 0.2,
            max_tokens: 300,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    ClassifierError::Timeout
                } else {
                    ClassifierError::Http(error.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ClassifierError::Http(format!("status {}", response.status())));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|error| ClassifierError::Malformed(error.to_string()))?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ClassifierError::Malformed("no completion choices".to_string()))
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    async fn categorize(&self, brand: &str, description: &str) -> Result<String, ClassifierError> {
        let content =
            self.chat(&categorize_system_prompt(), &format!("{brand} {description}")).await?;
        Ok(parse_category(&content))
    }

    async fn group_similar(
        &self,
        product_numbers: &[String],
    ) -> Result<Vec<Vec<String>>, ClassifierError> {
        let content = self.chat(GROUPING_PROMPT, &product_numbers.join(",")).await?;
        parse_groups(&content)
    }

    async fn recommend(
        &self,
        descriptors: &[ProductDescriptor],
    ) -> Result<ClassifierRecommendation, ClassifierError> {
        let content = self.chat(RECOMMEND_PROMPT, &format_descriptors(descriptors)).await?;
        parse_recommendation(&content)
    }
}

fn categorize_system_prompt() -> String {
    format!(
        "Categorize the food item into one of the following categories:\n{}\n\
         Consider the primary ingredients and nature of the product. \
         Structure the response as the following: \"Category\"",
        CATEGORIES.join("\n")
    )
}

const GROUPING_PROMPT: &str =
    "Review and group these product items per one category for side by side comparison. \
     Treat the product numbers as numerical values. Structure the response as the \
     following: [\"productNumbers separated by commas\"]";

const RECOMMEND_PROMPT: &str =
    "Take this product category and analyze it to identify specific similar products to \
     compare side by side, and make a recommendation on which product to purchase based \
     on the info provided. Structure the response as the following: \
     [\"<recommendedItemId>\", \"<savingsAmount>\", \"<20 words or less reason why it's \
     recommended>\"]";

fn format_descriptors(descriptors: &[ProductDescriptor]) -> String {
    descriptors
        .iter()
        .map(|descriptor| {
            let unit_prices = descriptor
                .unit_prices
                .iter()
                .map(|(unit, amount)| format!("{amount}/{unit}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "id: {}, vendor: {}, brand: {}, description: {}, prices: [{}], pack size: {}, \
                 quantity: {}, total: {}",
                descriptor.list_item_id.0,
                descriptor.vendor,
                descriptor.brand,
                descriptor.description,
                unit_prices,
                descriptor.pack_size,
                descriptor.quantity,
                descriptor.total_price,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_category(content: &str) -> String {
    content.trim().trim_matches('"').trim().to_string()
}

fn parse_groups(content: &str) -> Result<Vec<Vec<String>>, ClassifierError> {
    let raw: Vec<String> = serde_json::from_str(content.trim())
        .map_err(|error| ClassifierError::Malformed(format!("group response: {error}")))?;
    Ok(raw
        .iter()
        .map(|group| {
            group
                .split(',')
                .map(|number| number.trim().to_string())
                .filter(|number| !number.is_empty())
                .collect()
        })
        .collect())
}

fn parse_recommendation(content: &str) -> Result<ClassifierRecommendation, ClassifierError> {
    let raw: Vec<String> = serde_json::from_str(content.trim())
        .map_err(|error| ClassifierError::Malformed(format!("recommendation response: {error}")))?;

    match raw.as_slice() {
        [item_id, saving, reason] => Ok(ClassifierRecommendation {
            list_item_id: ListItemId(item_id.trim().to_string()),
            price_saving: Decimal::from_str(saving.trim()).unwrap_or(Decimal::ZERO),
            reason: reason.trim().to_string(),
        }),
        [item_id, reason] => Ok(ClassifierRecommendation {
            list_item_id: ListItemId(item_id.trim().to_string()),
            price_saving: Decimal::ZERO,
            reason: reason.trim().to_string(),
        }),
        _ => Err(ClassifierError::Malformed(format!(
            "expected [id, savings, reason], got {} elements",
            raw.len()
        ))),
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{parse_category, parse_groups, parse_recommendation};

    #[test]
    fn category_responses_are_unquoted_and_trimmed() {
        assert_eq!(parse_category("\"Canned and Jarred Goods\"\n"), "Canned and Jarred Goods");
        assert_eq!(parse_category("Produce"), "Produce");
    }

    #[test]
    fn group_responses_split_comma_joined_numbers() {
        let groups = parse_groups(r#"["100001, 100002", "100003"]"#).expect("parse");
        assert_eq!(groups, vec![vec!["100001".to_string(), "100002".to_string()], vec!["100003".to_string()]]);
    }

    #[test]
    fn malformed_group_response_is_an_error() {
        assert!(parse_groups("not json").is_err());
    }

    #[test]
    fn recommendation_parses_id_savings_and_reason() {
        let recommendation =
            parse_recommendation(r#"["item-1", "2.00", "Cheaper for the same pack size"]"#)
                .expect("parse");
        assert_eq!(recommendation.list_item_id.0, "item-1");
        assert_eq!(recommendation.price_saving, Decimal::new(200, 2));
        assert_eq!(recommendation.reason, "Cheaper for the same pack size");
    }

    #[test]
    fn recommendation_tolerates_a_two_element_response() {
        let recommendation =
            parse_recommendation(r#"["item-2", "Best value"]"#).expect("parse");
        assert_eq!(recommendation.list_item_id.0, "item-2");
        assert_eq!(recommendation.price_saving, Decimal::ZERO);
    }

    #[test]
    fn unparseable_savings_degrade_to_zero() {
        let recommendation =
            parse_recommendation(r#"["item-3", "about two dollars", "reason"]"#).expect("parse");
        assert_eq!(recommendation.price_saving, Decimal::ZERO);
    }

    #[test]
    fn empty_recommendation_is_malformed() {
        assert!(parse_recommendation("[]").is_err());
    }
}
