//! Record shapes that flow through the pipeline and land on disk.

use chrono::NaiveDateTime;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ACCOUNT_PREFIX: &str = "001";
pub const AGENCY: &str = "0001";
pub const ACCOUNT_LIMIT: f64 = 5000.00;
pub const MIN_BALANCE: f64 = 1000.0;
pub const MAX_BALANCE: f64 = 50000.0;

pub const NEWS_ICON: &str = "https://cdn-icons-png.flaticon.com/512/3135/3135679.png";
pub const NEWS_CATEGORY: &str = "investment_advice";

/// Profile as returned by the users endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub address: Value,
    pub company: Value,
}

/// Simulated bank account attached to every fetched user.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Account {
    pub number: String,
    pub agency: String,
    pub balance: f64,
    pub limit: f64,
}

impl Account {
    /// Synthesize an account for `user_id` with a balance drawn from `rng`.
    pub fn synthesize<R: Rng + ?Sized>(user_id: i64, rng: &mut R) -> Self {
        let raw = rng.gen_range(MIN_BALANCE..=MAX_BALANCE);
        Self {
            number: account_number(user_id),
            agency: AGENCY.to_string(),
            balance: round_cents(raw),
            limit: ACCOUNT_LIMIT,
        }
    }
}

/// `001` followed by the id zero-padded to four digits.
pub fn account_number(user_id: i64) -> String {
    format!("{}{:04}", ACCOUNT_PREFIX, user_id)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NewsItem {
    pub id: usize,
    pub date: NaiveDateTime,
    pub icon: String,
    pub description: String,
    pub category: String,
    pub read: bool,
}

/// Unified user record: external profile plus synthesized account and news.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub address: Value,
    pub company: Value,
    pub account: Account,
    #[serde(default)]
    pub news: Vec<NewsItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_generated_message: Option<String>,
}

impl User {
    pub fn from_profile<R: Rng + ?Sized>(profile: UserProfile, rng: &mut R) -> Self {
        let account = Account::synthesize(profile.id, rng);
        Self {
            id: profile.id,
            name: profile.name,
            username: profile.username,
            email: profile.email,
            phone: profile.phone,
            website: profile.website,
            address: profile.address,
            company: profile.company,
            account,
            news: Vec::new(),
            ai_generated_message: None,
        }
    }

    /// Company name from the verbatim `company` mapping, empty when absent.
    pub fn company_name(&self) -> &str {
        self.company
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Append a news item carrying `message`, numbered after the existing ones.
    pub fn push_news(&mut self, message: &str, date: NaiveDateTime) -> &NewsItem {
        let item = NewsItem {
            id: self.news.len() + 1,
            date,
            icon: NEWS_ICON.to_string(),
            description: message.to_string(),
            category: NEWS_CATEGORY.to_string(),
            read: false,
        };
        self.news.push(item);
        &self.news[self.news.len() - 1]
    }

    pub fn last_news(&self) -> Option<&NewsItem> {
        self.news.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_profile as profile;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap()
    }

    #[test]
    fn test_account_number_padding() {
        assert_eq!(account_number(1), "0010001");
        assert_eq!(account_number(42), "0010042");
        assert_eq!(account_number(12345), "00112345");
    }

    #[test]
    fn test_synthesized_account_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for id in 1..50 {
            let account = Account::synthesize(id, &mut rng);
            assert!(account.balance >= MIN_BALANCE && account.balance <= MAX_BALANCE);
            let cents: f64 = format!("{:.2}", account.balance).parse().unwrap();
            assert_eq!(cents, account.balance);
            assert_eq!(account.agency, "0001");
            assert_eq!(account.limit, 5000.0);
        }
    }

    #[test]
    fn test_seeded_balance_is_deterministic() {
        let a = Account::synthesize(3, &mut StdRng::seed_from_u64(99));
        let b = Account::synthesize(3, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_profile_starts_without_news() {
        let user =
            User::from_profile(profile(1, "Leanne Graham"), &mut StdRng::seed_from_u64(1));
        assert!(user.news.is_empty());
        assert!(user.ai_generated_message.is_none());
        assert_eq!(user.company_name(), "Romaguera-Crona");
        assert_eq!(user.account.number, "0010001");
    }

    #[test]
    fn test_push_news_numbers_sequentially() {
        let mut user =
            User::from_profile(profile(2, "Ervin Howell"), &mut StdRng::seed_from_u64(1));
        assert_eq!(user.push_news("first", noon()).id, 1);
        assert_eq!(user.push_news("second", noon()).id, 2);
        let last = user.last_news().unwrap();
        assert_eq!(last.description, "second");
        assert_eq!(last.category, NEWS_CATEGORY);
        assert!(!last.read);
    }

    #[test]
    fn test_company_name_missing() {
        let mut user = User::from_profile(profile(3, "X"), &mut StdRng::seed_from_u64(1));
        user.company = json!({});
        assert_eq!(user.company_name(), "");
    }

    #[test]
    fn test_serialized_field_order() {
        let mut user = User::from_profile(profile(4, "Y"), &mut StdRng::seed_from_u64(1));
        user.ai_generated_message = Some("oi".to_string());
        let text = serde_json::to_string(&user).unwrap();
        let news = text.find("\"news\"").unwrap();
        let account = text.find("\"account\"").unwrap();
        let message = text.find("\"ai_generated_message\"").unwrap();
        assert!(account < news && news < message);
    }
}
