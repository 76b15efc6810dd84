use serde::{Deserialize, Serialize};

pub type UserId = String;

/// A user record as it is stored and served.
///
/// `friends` keeps insertion order so that listings are deterministic. Every
/// ID in it refers to a user whose own `friends` contains this user's ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub age: String,
    #[serde(default)]
    pub friends: Vec<UserId>,
}

impl User {
    pub fn new(id: UserId, name: String, age: String) -> Self {
        Self {
            id,
            name,
            age,
            friends: Vec::new(),
        }
    }

    pub fn is_friends_with(&self, other: &str) -> bool {
        self.friends.iter().any(|f| f == other)
    }

    pub fn degree(&self) -> usize {
        self.friends.len()
    }

    /// Returns false if the edge was already present.
    pub fn add_friend(&mut self, other: &str) -> bool {
        if self.is_friends_with(other) {
            return false;
        }
        self.friends.push(other.to_string());
        true
    }

    pub fn remove_friend(&mut self, other: &str) -> bool {
        let before = self.friends.len();
        self.friends.retain(|f| f != other);
        self.friends.len() < before
    }
}
