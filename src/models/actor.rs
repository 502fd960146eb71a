//! Actor records - the marketplace users whose trust state is gated and moderated

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lowest trust score an actor can hold
pub const MIN_TRUST_SCORE: i32 = 0;

/// Highest trust score an actor can hold (also the default)
pub const MAX_TRUST_SCORE: i32 = 100;

/// Marketplace role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seller,
    Buyer,
    #[serde(rename = "admin", alias = "administrator")]
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Seller => "seller",
            Role::Buyer => "buyer",
            Role::Administrator => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seller" => Ok(Role::Seller),
            "buyer" => Ok(Role::Buyer),
            "admin" | "administrator" => Ok(Role::Administrator),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A registered marketplace participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub role: Role,

    /// Email verification
    pub email_verified: bool,

    /// Trust score, always within [MIN_TRUST_SCORE, MAX_TRUST_SCORE]
    pub trust_score: i32,

    /// Block state
    pub is_blocked: bool,
    pub block_reason: Option<String>,
    pub blocked_at: Option<DateTime<Utc>>,

    /// Abuse tracking
    pub report_count: i32,
    pub last_report_at: Option<DateTime<Utc>>,

    /// Seller privacy setting; `false` means the seller opted out of disclosure
    pub allow_contact_sharing: bool,

    pub registered_at: DateTime<Utc>,

    /// Bumped on every persisted write, used for compare-and-swap updates
    pub version: i64,
}

impl Actor {
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: None,
            phone: None,
            location: None,
            role,
            email_verified: false,
            trust_score: MAX_TRUST_SCORE,
            is_blocked: false,
            block_reason: None,
            blocked_at: None,
            report_count: 0,
            last_report_at: None,
            allow_contact_sharing: true,
            registered_at: Utc::now(),
            version: 0,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>, verified: bool) -> Self {
        self.email = Some(email.into());
        self.email_verified = verified;
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_trust_score(mut self, score: i32) -> Self {
        self.trust_score = score.clamp(MIN_TRUST_SCORE, MAX_TRUST_SCORE);
        self
    }

    /// An email is on file but has not been verified yet
    pub fn has_unverified_email(&self) -> bool {
        !self.email_verified && self.email.as_deref().is_some_and(|e| !e.is_empty())
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Administrator
    }

    pub fn contact_card(&self) -> ContactCard {
        ContactCard {
            name: self.name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            location: self.location.clone(),
        }
    }

    pub fn summary(&self) -> ActorSummary {
        ActorSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            trust_score: self.trust_score,
            is_blocked: self.is_blocked,
        }
    }
}

/// The private contact fields revealed by a successful disclosure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactCard {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
}

/// Compact actor view used when populating audit and report listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub trust_score: i32,
    pub is_blocked: bool,
}

/// Admin listing filter
#[derive(Debug, Clone, Default)]
pub struct ActorFilter {
    pub role: Option<Role>,
    pub blocked: Option<bool>,
}

impl ActorFilter {
    pub fn matches(&self, actor: &Actor) -> bool {
        self.role.map_or(true, |r| actor.role == r)
            && self.blocked.map_or(true, |b| actor.is_blocked == b)
    }
}

/// Actor counts for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorStats {
    pub total: u64,
    pub sellers: u64,
    pub buyers: u64,
    pub blocked: u64,
    pub unverified: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_actor_defaults() {
        let actor = Actor::new("Asha", Role::Seller);
        assert_eq!(actor.trust_score, MAX_TRUST_SCORE);
        assert!(!actor.is_blocked);
        assert!(actor.allow_contact_sharing);
        assert_eq!(actor.version, 0);
    }

    #[test]
    fn test_unverified_email_only_when_present() {
        let no_email = Actor::new("Ben", Role::Buyer);
        assert!(!no_email.has_unverified_email());

        let unverified = Actor::new("Ben", Role::Buyer).with_email("ben@example.com", false);
        assert!(unverified.has_unverified_email());

        let verified = Actor::new("Ben", Role::Buyer).with_email("ben@example.com", true);
        assert!(!verified.has_unverified_email());

        let blank = Actor::new("Ben", Role::Buyer).with_email("", false);
        assert!(!blank.has_unverified_email());
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Administrator).unwrap(), "\"admin\"");
        let parsed: Role = serde_json::from_str("\"administrator\"").unwrap();
        assert_eq!(parsed, Role::Administrator);
        assert_eq!("seller".parse::<Role>().unwrap(), Role::Seller);
        assert!("farmer".parse::<Role>().is_err());
    }

    #[test]
    fn test_filter_matches() {
        let mut buyer = Actor::new("Cai", Role::Buyer);
        buyer.is_blocked = true;

        let filter = ActorFilter { role: Some(Role::Buyer), blocked: Some(true) };
        assert!(filter.matches(&buyer));

        let sellers = ActorFilter { role: Some(Role::Seller), blocked: None };
        assert!(!sellers.matches(&buyer));
        assert!(ActorFilter::default().matches(&buyer));
    }
}
