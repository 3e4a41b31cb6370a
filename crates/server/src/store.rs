//! In-memory tables for users, tokens and wires.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;
use wiredesk_shared::{AuthTokens, User, Wire, WireCreate, WireStatus, WireUpdate};

const REFERENCE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const REFERENCE_LEN: usize = 12;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Access,
    Refresh,
}

#[derive(Default)]
struct Tables {
    users: HashMap<i64, UserRecord>,
    emails: HashMap<String, i64>,
    tokens: HashMap<String, (i64, TokenKind)>,
    wires: BTreeMap<i64, Wire>,
    next_user_id: i64,
    next_wire_id: i64,
}

/// One page of a user's wires plus the unpaginated count.
pub struct WirePage {
    pub wires: Vec<Wire>,
    pub total: u64,
}

#[derive(Default)]
pub struct Store {
    tables: RwLock<Tables>,
}

/// `WIRE-` followed by 12 characters from `A-Z0-9`.
pub fn generate_reference() -> String {
    let mut out = String::with_capacity(5 + REFERENCE_LEN);
    out.push_str("WIRE-");
    let bytes = [*Uuid::new_v4().as_bytes(), *Uuid::new_v4().as_bytes()];
    for byte in bytes.iter().flatten().take(REFERENCE_LEN) {
        let idx = usize::from(*byte) % REFERENCE_ALPHABET.len();
        out.push(char::from(REFERENCE_ALPHABET[idx]));
    }
    out
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the email is taken.
    pub async fn create_user(&self, email: &str, password_hash: String) -> Option<User> {
        let mut tables = self.tables.write().await;
        if tables.emails.contains_key(email) {
            return None;
        }
        tables.next_user_id += 1;
        let user = User {
            id: tables.next_user_id,
            email: email.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        tables.emails.insert(email.to_string(), user.id);
        tables.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                password_hash,
            },
        );
        Some(user)
    }

    pub async fn user_by_email(&self, email: &str) -> Option<UserRecord> {
        let tables = self.tables.read().await;
        let id = tables.emails.get(email)?;
        tables.users.get(id).cloned()
    }

    pub async fn issue_tokens(&self, user_id: i64) -> AuthTokens {
        let access_token = Uuid::new_v4().simple().to_string();
        let refresh_token = Uuid::new_v4().simple().to_string();
        let mut tables = self.tables.write().await;
        tables
            .tokens
            .insert(access_token.clone(), (user_id, TokenKind::Access));
        tables
            .tokens
            .insert(refresh_token.clone(), (user_id, TokenKind::Refresh));
        AuthTokens {
            access_token,
            refresh_token,
            token_type: "bearer".to_string(),
        }
    }

    /// Resolve an access token to an active user. Refresh tokens are not
    /// accepted here.
    pub async fn user_for_access_token(&self, token: &str) -> Option<User> {
        let tables = self.tables.read().await;
        let (user_id, kind) = tables.tokens.get(token)?;
        if *kind != TokenKind::Access {
            return None;
        }
        tables
            .users
            .get(user_id)
            .map(|record| record.user.clone())
            .filter(|user| user.is_active)
    }

    pub async fn insert_wire(&self, owner: i64, create: WireCreate) -> Wire {
        let mut tables = self.tables.write().await;
        tables.next_wire_id += 1;
        let wire = Wire {
            id: tables.next_wire_id,
            sender_name: create.sender_name,
            recipient_name: create.recipient_name,
            amount: create.amount.round_dp(2),
            currency: create.currency,
            status: WireStatus::Pending,
            reference_number: Some(generate_reference()),
            created_by: owner,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.wires.insert(wire.id, wire.clone());
        wire
    }

    /// Newest first. `offset`/`limit` select the page.
    pub async fn list_wires(
        &self,
        owner: i64,
        status: Option<WireStatus>,
        offset: usize,
        limit: usize,
    ) -> WirePage {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Wire> = tables
            .wires
            .values()
            .filter(|w| w.created_by == owner)
            .filter(|w| status.map_or(true, |s| w.status == s))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        WirePage {
            total: matching.len() as u64,
            wires: matching
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
        }
    }

    pub async fn get_wire(&self, owner: i64, id: i64) -> Option<Wire> {
        let tables = self.tables.read().await;
        tables
            .wires
            .get(&id)
            .filter(|w| w.created_by == owner)
            .cloned()
    }

    /// Apply the present fields. Returns the updated wire and the previous status.
    pub async fn update_wire(
        &self,
        owner: i64,
        id: i64,
        update: WireUpdate,
    ) -> Option<(Wire, WireStatus)> {
        let mut tables = self.tables.write().await;
        let wire = tables
            .wires
            .get_mut(&id)
            .filter(|w| w.created_by == owner)?;
        let previous = wire.status;
        if let Some(sender_name) = update.sender_name {
            wire.sender_name = sender_name;
        }
        if let Some(recipient_name) = update.recipient_name {
            wire.recipient_name = recipient_name;
        }
        if let Some(amount) = update.amount {
            wire.amount = amount.round_dp(2);
        }
        if let Some(currency) = update.currency {
            wire.currency = currency;
        }
        if let Some(status) = update.status {
            wire.status = status;
        }
        wire.updated_at = Some(Utc::now());
        Some((wire.clone(), previous))
    }

    /// Status change made by the processing simulator; no ownership check.
    pub async fn set_status(&self, id: i64, status: WireStatus) -> Option<Wire> {
        let mut tables = self.tables.write().await;
        let wire = tables.wires.get_mut(&id)?;
        wire.status = status;
        wire.updated_at = Some(Utc::now());
        Some(wire.clone())
    }

    pub async fn delete_wire(&self, owner: i64, id: i64) -> bool {
        let mut tables = self.tables.write().await;
        match tables.wires.get(&id) {
            Some(wire) if wire.created_by == owner => {
                tables.wires.remove(&id);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn create(sender: &str) -> WireCreate {
        WireCreate {
            sender_name: sender.to_string(),
            recipient_name: "Jane Smith".to_string(),
            amount: Decimal::new(100000, 2),
            currency: "USD".to_string(),
        }
    }

    #[test]
    fn reference_format() {
        let reference = generate_reference();
        assert_eq!(reference.len(), 17);
        let (prefix, code) = reference.split_at(5);
        assert_eq!(prefix, "WIRE-");
        assert!(code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = Store::new();
        assert!(store.create_user("a@b.com", "h".into()).await.is_some());
        assert!(store.create_user("a@b.com", "h".into()).await.is_none());
    }

    #[tokio::test]
    async fn wires_are_scoped_and_newest_first() {
        let store = Store::new();
        let first = store.insert_wire(1, create("first")).await;
        let second = store.insert_wire(1, create("second")).await;
        store.insert_wire(2, create("other owner")).await;

        let page = store.list_wires(1, None, 0, 20).await;
        assert_eq!(page.total, 2);
        let ids: Vec<_> = page.wires.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        assert!(store.get_wire(2, first.id).await.is_none());
        assert!(!store.delete_wire(2, first.id).await);
    }

    #[tokio::test]
    async fn status_filter_and_paging() {
        let store = Store::new();
        for n in 0..5 {
            let wire = store.insert_wire(1, create(&format!("s{n}"))).await;
            if n % 2 == 0 {
                store.set_status(wire.id, WireStatus::Completed).await;
            }
        }
        let completed = store
            .list_wires(1, Some(WireStatus::Completed), 0, 20)
            .await;
        assert_eq!(completed.total, 3);

        let second_page = store.list_wires(1, None, 2, 2).await;
        assert_eq!(second_page.total, 5);
        assert_eq!(second_page.wires.len(), 2);
    }

    #[tokio::test]
    async fn refresh_tokens_do_not_authenticate() {
        let store = Store::new();
        let user = store.create_user("a@b.com", "h".into()).await.unwrap();
        let tokens = store.issue_tokens(user.id).await;
        assert_eq!(
            store.user_for_access_token(&tokens.access_token).await,
            Some(user)
        );
        assert_eq!(store.user_for_access_token(&tokens.refresh_token).await, None);
    }
}
