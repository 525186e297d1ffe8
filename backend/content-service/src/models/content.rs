use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;
pub const MAX_COMMENT_LENGTH: usize = 2000;
pub const MAX_CATEGORIES: usize = 20;

/// Kind of publishable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Article,
    Video,
    Course,
    Image,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Article,
        ContentType::Video,
        ContentType::Course,
        ContentType::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Video => "video",
            ContentType::Course => "course",
            ContentType::Image => "image",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "article" => Ok(ContentType::Article),
            "video" => Ok(ContentType::Video),
            "course" => Ok(ContentType::Course),
            "image" => Ok(ContentType::Image),
            other => Err(AppError::InvalidInput(format!(
                "unknown content type '{}'",
                other
            ))),
        }
    }
}

/// Access class of a content item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Basic,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Basic => "basic",
            SubscriptionTier::Premium => "premium",
        }
    }

    pub fn is_paid(&self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }
}

impl FromStr for SubscriptionTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(SubscriptionTier::Free),
            "basic" => Ok(SubscriptionTier::Basic),
            "premium" => Ok(SubscriptionTier::Premium),
            other => Err(AppError::InvalidInput(format!(
                "unknown subscription tier '{}'",
                other
            ))),
        }
    }
}

/// Point-in-time copy of the creator's public profile.
///
/// Taken when the content is created and never refreshed from the live
/// profile afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreatorInfo {
    pub name: String,
    #[serde(default)]
    pub wallet_id: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
}

/// A single like entry (content or comment level)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Comment embedded in a content item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user_id: String,
    pub user_name: String,
    pub user_image: Option<String>,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes: Vec<Like>,
    pub likes_count: i64,
}

/// Full content record as exposed to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub content_type: ContentType,
    #[serde(rename = "contentURL")]
    pub content_url: String,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: Option<String>,
    pub creator: CreatorInfo,
    pub subscription_tier: SubscriptionTier,
    pub price: f64,
    pub categories: Vec<String>,
    pub is_published: bool,
    pub views: i64,
    pub likes: Vec<Like>,
    pub likes_count: i64,
    pub comments: Vec<Comment>,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|like| like.user_id == user_id)
    }

    pub fn summary(&self) -> ContentSummary {
        ContentSummary {
            id: self.id,
            owner_id: self.owner_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            content_type: self.content_type,
            thumbnail_url: self.thumbnail_url.clone(),
            creator_name: self.creator.name.clone(),
            creator_wallet_id: self.creator.wallet_id.clone(),
            subscription_tier: self.subscription_tier,
            price: self.price,
            categories: self.categories.clone(),
            is_published: self.is_published,
            views: self.views,
            likes_count: self.likes_count,
            comments_count: self.comments_count,
            created_at: self.created_at,
        }
    }
}

/// Single-item read result: the item plus the viewer's like state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentView {
    #[serde(flatten)]
    pub item: ContentItem,
    pub is_liked: bool,
}

/// List-view projection: counters only, never the interaction lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSummary {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub content_type: ContentType,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: Option<String>,
    pub creator_name: String,
    pub creator_wallet_id: Option<String>,
    pub subscription_tier: SubscriptionTier,
    pub price: f64,
    pub categories: Vec<String>,
    pub is_published: bool,
    pub views: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Search projection (no description)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: Uuid,
    pub title: String,
    pub content_type: ContentType,
    #[serde(rename = "thumbnailURL")]
    pub thumbnail_url: Option<String>,
    pub creator_name: String,
    pub categories: Vec<String>,
    pub subscription_tier: SubscriptionTier,
    pub price: f64,
    pub views: i64,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub score: i32,
}

/// Relevance weights per matched field
pub const TITLE_WEIGHT: i32 = 4;
pub const CREATOR_WEIGHT: i32 = 2;
pub const CATEGORY_WEIGHT: i32 = 2;
pub const DESCRIPTION_WEIGHT: i32 = 1;

/// Case-insensitive relevance of `item` for an already lowercased needle.
///
/// Zero means no match.
pub fn relevance_score(item: &ContentItem, needle: &str) -> i32 {
    let mut score = 0;
    if item.title.to_lowercase().contains(needle) {
        score += TITLE_WEIGHT;
    }
    if item.creator.name.to_lowercase().contains(needle) {
        score += CREATOR_WEIGHT;
    }
    if item
        .categories
        .iter()
        .any(|category| category.to_lowercase().contains(needle))
    {
        score += CATEGORY_WEIGHT;
    }
    if item.description.to_lowercase().contains(needle) {
        score += DESCRIPTION_WEIGHT;
    }
    score
}

/// Validated input for creating a content item
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDraft {
    pub title: String,
    pub description: String,
    pub content_type: ContentType,
    pub content_url: String,
    pub thumbnail_url: Option<String>,
    pub creator: CreatorInfo,
    pub subscription_tier: SubscriptionTier,
    pub price: f64,
    pub categories: Vec<String>,
    pub is_published: bool,
}

impl ContentDraft {
    /// Trim text fields, de-duplicate categories and check tier/price rules.
    pub fn normalized(mut self) -> Result<Self> {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.content_url = self.content_url.trim().to_string();
        self.thumbnail_url = non_blank(self.thumbnail_url);
        self.creator.name = self.creator.name.trim().to_string();
        self.categories = normalize_categories(self.categories)?;

        validate_title(&self.title)?;
        validate_description(&self.description)?;
        if self.content_url.is_empty() {
            return Err(AppError::InvalidInput("contentURL is required".into()));
        }
        if self.creator.name.is_empty() {
            return Err(AppError::InvalidInput("creator name is required".into()));
        }
        validate_pricing(self.subscription_tier, self.price)?;

        Ok(self)
    }
}

/// Owner edit of a content item; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<ContentType>,
    pub content_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub subscription_tier: Option<SubscriptionTier>,
    pub price: Option<f64>,
    pub categories: Option<Vec<String>>,
    pub is_published: Option<bool>,
}

impl ContentPatch {
    pub fn is_empty(&self) -> bool {
        self == &ContentPatch::default()
    }

    /// Field-level checks; cross-field tier/price rules are checked against the
    /// merged record by the store.
    pub fn normalized(mut self) -> Result<Self> {
        if let Some(title) = self.title.take() {
            let title = title.trim().to_string();
            validate_title(&title)?;
            self.title = Some(title);
        }
        if let Some(description) = self.description.take() {
            let description = description.trim().to_string();
            validate_description(&description)?;
            self.description = Some(description);
        }
        if let Some(url) = self.content_url.take() {
            let url = url.trim().to_string();
            if url.is_empty() {
                return Err(AppError::InvalidInput("contentURL cannot be empty".into()));
            }
            self.content_url = Some(url);
        }
        self.thumbnail_url = non_blank(self.thumbnail_url);
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(AppError::InvalidInput(
                    "price must be a non-negative number".into(),
                ));
            }
        }
        if let Some(categories) = self.categories.take() {
            self.categories = Some(normalize_categories(categories)?);
        }
        Ok(self)
    }

    /// Apply the patch to an in-memory record.
    pub fn apply_to(&self, item: &mut ContentItem) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(description) = &self.description {
            item.description = description.clone();
        }
        if let Some(content_type) = self.content_type {
            item.content_type = content_type;
        }
        if let Some(url) = &self.content_url {
            item.content_url = url.clone();
        }
        if let Some(thumbnail) = &self.thumbnail_url {
            item.thumbnail_url = Some(thumbnail.clone());
        }
        if let Some(tier) = self.subscription_tier {
            item.subscription_tier = tier;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(categories) = &self.categories {
            item.categories = categories.clone();
        }
        if let Some(is_published) = self.is_published {
            item.is_published = is_published;
        }
    }
}

/// Feed filter; every `None` field matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentFilter {
    pub content_type: Option<ContentType>,
    pub owner_id: Option<String>,
    pub is_published: Option<bool>,
    pub category: Option<String>,
}

impl ContentFilter {
    pub fn matches(&self, item: &ContentItem) -> bool {
        self.content_type.map_or(true, |t| item.content_type == t)
            && self
                .owner_id
                .as_deref()
                .map_or(true, |owner| item.owner_id == owner)
            && self.is_published.map_or(true, |p| item.is_published == p)
            && self
                .category
                .as_deref()
                .map_or(true, |c| item.categories.iter().any(|cat| cat == c))
    }
}

/// Post-state of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub is_liked: bool,
    pub likes_count: i64,
}

/// Comment to be appended; id and timestamps are assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub user_id: String,
    pub user_name: String,
    pub user_image: Option<String>,
    pub text: String,
}

/// Aggregates over one owner's content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerContentStats {
    pub total_content: i64,
    pub published_content: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub by_type: BTreeMap<String, i64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_title(title: &str) -> Result<()> {
    if title.is_empty() {
        return Err(AppError::InvalidInput("title is required".into()));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "title must be at most {} characters",
            MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<()> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    Ok(())
}

/// Paid tiers need a positive price; free content may carry any price >= 0.
pub fn validate_pricing(tier: SubscriptionTier, price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::InvalidInput(
            "price must be a non-negative number".into(),
        ));
    }
    if tier.is_paid() && price <= 0.0 {
        return Err(AppError::InvalidInput(format!(
            "{} content requires a price greater than zero",
            tier.as_str()
        )));
    }
    Ok(())
}

/// Trim, drop blanks and de-duplicate while keeping first-seen order.
pub fn normalize_categories(categories: Vec<String>) -> Result<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(categories.len());
    for category in categories {
        let category = category.trim();
        if category.is_empty() || normalized.iter().any(|c| c == category) {
            continue;
        }
        normalized.push(category.to_string());
    }
    if normalized.len() > MAX_CATEGORIES {
        return Err(AppError::InvalidInput(format!(
            "at most {} categories are allowed",
            MAX_CATEGORIES
        )));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ContentDraft {
        ContentDraft {
            title: "  Intro to Blockchains ".to_string(),
            description: "A gentle start".to_string(),
            content_type: ContentType::Video,
            content_url: "https://cdn.example.com/v.mp4".to_string(),
            thumbnail_url: Some("   ".to_string()),
            creator: CreatorInfo {
                name: "Alice".to_string(),
                ..CreatorInfo::default()
            },
            subscription_tier: SubscriptionTier::Free,
            price: 0.0,
            categories: vec![
                " crypto ".to_string(),
                "crypto".to_string(),
                "".to_string(),
                "defi".to_string(),
            ],
            is_published: true,
        }
    }

    #[test]
    fn test_draft_normalization_trims_and_dedupes() {
        let draft = draft().normalized().expect("valid draft");
        assert_eq!(draft.title, "Intro to Blockchains");
        assert_eq!(draft.thumbnail_url, None);
        assert_eq!(draft.categories, vec!["crypto", "defi"]);
    }

    #[test]
    fn test_paid_tier_requires_price() {
        let mut paid = draft();
        paid.subscription_tier = SubscriptionTier::Premium;
        paid.price = 0.0;
        assert!(matches!(paid.normalized(), Err(AppError::InvalidInput(_))));

        let mut priced = draft();
        priced.subscription_tier = SubscriptionTier::Basic;
        priced.price = 0.05;
        assert!(priced.normalized().is_ok());
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let mut blank = draft();
        blank.title = "   ".to_string();
        assert!(matches!(blank.normalized(), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_negative_or_nan_price_is_rejected() {
        assert!(validate_pricing(SubscriptionTier::Free, -1.0).is_err());
        assert!(validate_pricing(SubscriptionTier::Free, f64::NAN).is_err());
        assert!(validate_pricing(SubscriptionTier::Free, 0.0).is_ok());
    }

    #[test]
    fn test_content_type_parsing_is_case_insensitive() {
        assert_eq!("VIDEO".parse::<ContentType>().unwrap(), ContentType::Video);
        assert!("podcast".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_relevance_weights_fields() {
        let now = Utc::now();
        let item = ContentItem {
            id: Uuid::new_v4(),
            owner_id: "owner".to_string(),
            title: "Blockchain basics".to_string(),
            description: "nothing here".to_string(),
            content_type: ContentType::Article,
            content_url: "u".to_string(),
            thumbnail_url: None,
            creator: CreatorInfo {
                name: "BlockMaster".to_string(),
                ..CreatorInfo::default()
            },
            subscription_tier: SubscriptionTier::Free,
            price: 0.0,
            categories: vec!["web3".to_string()],
            is_published: true,
            views: 0,
            likes: vec![],
            likes_count: 0,
            comments: vec![],
            comments_count: 0,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(relevance_score(&item, "block"), TITLE_WEIGHT + CREATOR_WEIGHT);
        assert_eq!(relevance_score(&item, "web3"), CATEGORY_WEIGHT);
        assert_eq!(relevance_score(&item, "solana"), 0);
    }

    #[test]
    fn test_patch_normalization_rejects_empty_url() {
        let patch = ContentPatch {
            content_url: Some("  ".to_string()),
            ..ContentPatch::default()
        };
        assert!(patch.normalized().is_err());
        assert!(ContentPatch::default().is_empty());
    }
}
